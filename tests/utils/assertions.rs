use statboard::PageResult;

/// Asserts the players on a page, in order
#[allow(dead_code)]
pub fn assert_page_players(page: &PageResult, expected: &[&str]) {
    let actual: Vec<&str> = page.entries.iter().map(|e| e.player_id.as_str()).collect();
    assert_eq!(actual, expected, "unexpected player order on page {}", page.page_index);
}

/// Asserts a page's first/last positions and that entries are numbered contiguously
#[allow(dead_code)]
pub fn assert_positions(page: &PageResult, start: usize, end: usize) {
    assert_eq!(
        (page.position_start, page.position_end),
        (start, end),
        "unexpected position range on page {}",
        page.page_index
    );
    for (offset, entry) in page.entries.iter().enumerate() {
        assert_eq!(entry.position, start + offset);
    }
}
