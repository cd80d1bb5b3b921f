mod utils;
use utils::TestSetupBuilder;

use statboard::{Counter, GameId, JoinOutcome, Metric, RecordStore};

#[tokio::test]
async fn joined_members_start_with_zeroed_stats_in_every_game() {
    let setup = TestSetupBuilder::new().with_four_players().build().await;

    for player in &setup.players {
        let records = setup
            .state
            .stats
            .get_stats(&setup.community_id, player, None)
            .await
            .unwrap();
        assert_eq!(records.len(), GameId::all().len());
        assert!(records.iter().all(|r| r.is_zeroed()));
    }
    assert_eq!(
        setup.store.stat_count().await,
        setup.players.len() * GameId::all().len()
    );
}

#[tokio::test]
async fn member_who_left_keeps_their_place_on_the_board() {
    let setup = TestSetupBuilder::new()
        .with_players(vec!["alice", "bob"])
        .build()
        .await;
    setup.merge("alice", GameId::R6s, &[(Counter::Wins, 5)]).await;
    setup.merge("bob", GameId::R6s, &[(Counter::Wins, 2)]).await;

    setup
        .state
        .lifecycle
        .on_member_left(&setup.community_id, "alice", "Alice")
        .await
        .unwrap();

    let page = setup
        .state
        .leaderboards
        .get_leaderboard_page(&setup.community_id, GameId::R6s, Metric::Wins, 0)
        .await
        .unwrap();
    assert_eq!(page.entries[0].player_id, "alice");

    let outcome = setup
        .state
        .lifecycle
        .on_member_joined(&setup.community_id, "alice")
        .await
        .unwrap();
    assert_eq!(outcome, JoinOutcome::Rejoined);

    let record = setup
        .state
        .stats
        .get_stat(&setup.community_id, "alice", GameId::R6s)
        .await
        .unwrap();
    assert_eq!(record.counter(Counter::Wins), 5);
    assert!(setup
        .store
        .get_left_marker(&setup.community_id, "alice")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn purged_player_disappears_from_leaderboards() {
    let setup = TestSetupBuilder::new()
        .with_players(vec!["alice", "bob"])
        .build()
        .await;
    setup.merge("alice", GameId::Bf6, &[(Counter::Kills, 40)]).await;
    setup
        .state
        .lifecycle
        .on_member_left(&setup.community_id, "alice", "Alice")
        .await
        .unwrap();

    let candidates = setup
        .state
        .lifecycle
        .search_left_players(&setup.community_id, "ALI", 25)
        .await
        .unwrap();
    assert_eq!(candidates.len(), 1);

    setup
        .state
        .lifecycle
        .purge_player(&setup.community_id, &candidates[0].player_id)
        .await
        .unwrap();

    let page = setup
        .state
        .leaderboards
        .get_leaderboard_page(&setup.community_id, GameId::Bf6, Metric::Kills, 0)
        .await
        .unwrap();
    let players: Vec<&str> = page.entries.iter().map(|e| e.player_id.as_str()).collect();
    assert_eq!(players, vec!["bob"]);
    assert!(setup
        .store
        .get_profile(&setup.community_id, "alice")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn rejoin_after_purge_starts_fresh() {
    let setup = TestSetupBuilder::new()
        .with_players(vec!["alice"])
        .build()
        .await;
    setup.merge("alice", GameId::R6s, &[(Counter::Earnings, 500)]).await;
    setup
        .state
        .lifecycle
        .on_member_left(&setup.community_id, "alice", "Alice")
        .await
        .unwrap();
    setup
        .state
        .lifecycle
        .purge_player(&setup.community_id, "alice")
        .await
        .unwrap();

    let outcome = setup
        .state
        .lifecycle
        .on_member_joined(&setup.community_id, "alice")
        .await
        .unwrap();

    assert!(matches!(outcome, JoinOutcome::Initialized { profile_created: true, .. }));
    let record = setup
        .state
        .stats
        .get_stat(&setup.community_id, "alice", GameId::R6s)
        .await
        .unwrap();
    assert!(record.is_zeroed());
}

#[tokio::test]
async fn startup_sweep_only_fills_gaps() {
    let setup = TestSetupBuilder::new()
        .with_players(vec!["alice"])
        .build()
        .await;
    setup.merge("alice", GameId::R6s, &[(Counter::Kills, 3)]).await;

    let members = vec!["alice".to_string(), "bob".to_string(), "carol".to_string()];
    let summary = setup
        .state
        .lifecycle
        .initialize_members(&setup.community_id, &members)
        .await
        .unwrap();

    assert_eq!(summary.members, 3);
    assert_eq!(summary.profiles_created, 2);
    assert_eq!(summary.records_created, 2 * GameId::all().len());

    let alice = setup
        .state
        .stats
        .get_stat(&setup.community_id, "alice", GameId::R6s)
        .await
        .unwrap();
    assert_eq!(alice.counter(Counter::Kills), 3);
}
