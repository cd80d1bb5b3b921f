mod utils;
use utils::{assert_page_players, assert_positions, TestSetupBuilder};

use statboard::{
    leaderboard::{Medal, Placement},
    Counter, GameId, Metric, StatDelta, StatValue,
};
use std::sync::Arc;

#[tokio::test]
async fn kills_leaderboard_orders_highest_first() {
    let setup = TestSetupBuilder::new().build().await;
    setup.merge("a", GameId::R6s, &[(Counter::Kills, 10)]).await;
    setup.merge("b", GameId::R6s, &[(Counter::Kills, 0)]).await;
    setup.merge("c", GameId::R6s, &[(Counter::Kills, 25)]).await;

    let page = setup
        .state
        .leaderboards
        .get_leaderboard_page(&setup.community_id, GameId::R6s, Metric::Kills, 0)
        .await
        .unwrap();

    assert_page_players(&page, &["c", "a", "b"]);
    assert_positions(&page, 1, 3);
    assert_eq!(page.entries[0].placement, Placement::Medal(Medal::Gold));
}

#[tokio::test]
async fn deaths_leaderboard_puts_inactive_players_last() {
    let setup = TestSetupBuilder::new()
        .with_players(vec!["idle"])
        .build()
        .await;
    setup
        .merge("fragger", GameId::R6s, &[(Counter::Kills, 20), (Counter::Deaths, 3)])
        .await;

    let page = setup
        .state
        .leaderboards
        .get_leaderboard_page(&setup.community_id, GameId::R6s, Metric::Deaths, 0)
        .await
        .unwrap();

    assert_page_players(&page, &["fragger", "idle"]);
    assert!(page.entries[1].no_data);
}

#[tokio::test]
async fn pages_reproduce_full_ranking_once() {
    let setup = TestSetupBuilder::new().build().await;
    for i in 0..23u64 {
        setup
            .merge(&format!("player-{:02}", i), GameId::Bf6, &[(Counter::Earnings, i * 10)])
            .await;
    }

    let ranking = setup
        .state
        .leaderboards
        .rank(&setup.community_id, GameId::Bf6, Metric::Earnings)
        .await
        .unwrap();

    let mut seen = Vec::new();
    let mut page_index = 0;
    loop {
        let page = setup
            .state
            .leaderboards
            .get_leaderboard_page(&setup.community_id, GameId::Bf6, Metric::Earnings, page_index)
            .await
            .unwrap();
        if page.entries.is_empty() {
            assert_eq!(page_index, page.max_page);
            break;
        }
        assert_positions(&page, page_index * 10 + 1, page_index * 10 + page.entries.len());
        seen.extend(page.entries.into_iter().map(|e| e.player_id));
        page_index += 1;
    }

    let expected: Vec<String> = ranking.entries.into_iter().map(|e| e.player_id).collect();
    assert_eq!(seen, expected);
    assert_eq!(seen.len(), 23);
    assert_eq!(seen[0], "player-22");
}

#[tokio::test]
async fn ratio_leaderboard_reflects_latest_merges() {
    let setup = TestSetupBuilder::new().build().await;
    setup
        .merge("a", GameId::R6s, &[(Counter::Wins, 6), (Counter::Losses, 2)])
        .await;
    setup
        .merge("b", GameId::R6s, &[(Counter::Wins, 4), (Counter::Losses, 1)])
        .await;

    let before = setup
        .state
        .leaderboards
        .get_leaderboard_page(&setup.community_id, GameId::R6s, Metric::Wl, 0)
        .await
        .unwrap();
    assert_page_players(&before, &["b", "a"]);

    setup.merge("a", GameId::R6s, &[(Counter::Wins, 10)]).await;

    let after = setup
        .state
        .leaderboards
        .get_leaderboard_page(&setup.community_id, GameId::R6s, Metric::Wl, 0)
        .await
        .unwrap();
    assert_page_players(&after, &["a", "b"]);
    assert_eq!(after.entries[0].value, StatValue::Ratio(8.0));
}

#[tokio::test]
async fn reset_player_drops_to_bottom_of_higher_is_better_board() {
    let setup = TestSetupBuilder::new().build().await;
    setup.merge("a", GameId::R6s, &[(Counter::TournamentsWon, 3)]).await;
    setup.merge("b", GameId::R6s, &[(Counter::TournamentsWon, 1)]).await;

    setup
        .state
        .stats
        .reset_stats(&setup.community_id, "a", Some(GameId::R6s))
        .await
        .unwrap();

    let page = setup
        .state
        .leaderboards
        .get_leaderboard_page(&setup.community_id, GameId::R6s, Metric::TournamentsWon, 0)
        .await
        .unwrap();
    assert_page_players(&page, &["b", "a"]);
    assert_eq!(page.entries[1].value, StatValue::Count(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_merges_are_all_ranked() {
    let setup = TestSetupBuilder::new().build().await;
    let stats = Arc::clone(&setup.state.stats);
    let community = setup.community_id.clone();

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let stats = Arc::clone(&stats);
            let community = community.clone();
            let player = if i % 2 == 0 { "even" } else { "odd" };
            tokio::spawn(async move {
                stats
                    .apply_stat_delta(
                        &community,
                        player,
                        GameId::Bf6,
                        &StatDelta::new().with(Counter::Kills, i + 1).unwrap(),
                    )
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let page = setup
        .state
        .leaderboards
        .get_leaderboard_page(&setup.community_id, GameId::Bf6, Metric::Kills, 0)
        .await
        .unwrap();

    // odd tasks add 2+4+..+20, even tasks add 1+3+..+19
    assert_page_players(&page, &["odd", "even"]);
    assert_eq!(page.entries[0].value, StatValue::Count(110));
    assert_eq!(page.entries[1].value, StatValue::Count(100));
}
