use std::cmp::Ordering;

use super::types::{LeaderboardEntry, PageResult, Placement, RankedEntry};
use crate::stats::{GameId, Metric, SortClass, StatRecord};

/// A full ordering of one game's players by one metric
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub game: GameId,
    pub metric: Metric,
    pub entries: Vec<RankedEntry>,
}

fn entry_for(record: &StatRecord, metric: Metric) -> RankedEntry {
    let value = metric.value_of(record);
    let no_data = match metric.paired_counter() {
        Some(paired) => value.is_zero() && record.counter(paired) == 0,
        None => false,
    };
    RankedEntry {
        player_id: record.player_id.clone(),
        value,
        no_data,
    }
}

fn compare(sort_class: SortClass, a: &RankedEntry, b: &RankedEntry) -> Ordering {
    match sort_class {
        SortClass::HigherIsBetter => b.value.total_cmp(&a.value),
        // no_data entries act as +inf and sink to the bottom
        SortClass::LowerIsBetter => a
            .no_data
            .cmp(&b.no_data)
            .then_with(|| a.value.total_cmp(&b.value)),
    }
}

/// Orders a snapshot of records by `metric`. The sort is stable, so players
/// with equal values keep their snapshot order.
pub fn rank(snapshot: &[StatRecord], game: GameId, metric: Metric) -> Ranking {
    let mut entries: Vec<RankedEntry> = snapshot
        .iter()
        .filter(|record| record.game == game)
        .map(|record| entry_for(record, metric))
        .collect();

    let sort_class = metric.sort_class();
    entries.sort_by(|a, b| compare(sort_class, a, b));

    Ranking {
        game,
        metric,
        entries,
    }
}

impl Ranking {
    /// Number of pages; an empty ranking still has one (empty) page
    pub fn max_page(&self, page_size: usize) -> usize {
        let page_size = page_size.max(1);
        self.entries.len().div_ceil(page_size).max(1)
    }

    /// Slices out page `page_index` (0-based). Indexes past the end give an
    /// empty page.
    pub fn page(&self, page_size: usize, page_index: usize) -> PageResult {
        let page_size = page_size.max(1);
        let offset = page_index.checked_mul(page_size).unwrap_or(usize::MAX);

        let entries: Vec<LeaderboardEntry> = self
            .entries
            .iter()
            .enumerate()
            .skip(offset)
            .take(page_size)
            .map(|(index, entry)| {
                let position = index + 1;
                LeaderboardEntry {
                    position,
                    placement: Placement::for_position(position),
                    player_id: entry.player_id.clone(),
                    value: entry.value,
                    no_data: entry.no_data,
                }
            })
            .collect();

        let (position_start, position_end) = match (entries.first(), entries.last()) {
            (Some(first), Some(last)) => (first.position, last.position),
            _ => (0, 0),
        };

        PageResult {
            game: self.game,
            game_name: self.game.display_name().to_string(),
            metric: self.metric,
            entries,
            position_start,
            position_end,
            total: self.entries.len(),
            page_index,
            max_page: self.max_page(page_size),
        }
    }
}
