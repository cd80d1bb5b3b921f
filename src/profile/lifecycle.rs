use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::models::LeftPlayerMarker;
use super::service::ProfileService;
use crate::stats::{GameId, StatKey, StatsError, StatsService};
use crate::store::RecordStore;

/// Hard cap on left-player search results
pub const MAX_SEARCH_RESULTS: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JoinOutcome {
    /// A departed member came back; their data was kept while they were away
    Rejoined,
    /// A new member; lists the games that got a fresh zeroed record
    Initialized {
        created_games: Vec<GameId>,
        profile_created: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitSummary {
    pub members: usize,
    pub records_created: usize,
    pub profiles_created: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    pub records_deleted: usize,
    pub profile_deleted: bool,
    pub marker_deleted: bool,
}

/// Reacts to membership changes. Holds no state of its own; everything it
/// decides comes from what is in the store.
pub struct LifecycleCoordinator {
    store: Arc<dyn RecordStore>,
    stats: Arc<StatsService>,
    profiles: Arc<ProfileService>,
}

impl LifecycleCoordinator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        stats: Arc<StatsService>,
        profiles: Arc<ProfileService>,
    ) -> Self {
        Self {
            store,
            stats,
            profiles,
        }
    }

    #[instrument(skip(self))]
    pub async fn on_member_joined(
        &self,
        community_id: &str,
        player_id: &str,
    ) -> Result<JoinOutcome, StatsError> {
        if self
            .store
            .get_left_marker(community_id, player_id)
            .await?
            .is_some()
        {
            self.store
                .delete_left_marker(community_id, player_id)
                .await?;
            info!(community_id, player_id, "Member rejoined, left marker cleared");
            return Ok(JoinOutcome::Rejoined);
        }

        let (created_games, profile_created) =
            self.initialize_member(community_id, player_id).await?;
        info!(
            community_id,
            player_id,
            records_created = created_games.len(),
            profile_created,
            "New member initialized"
        );
        Ok(JoinOutcome::Initialized {
            created_games,
            profile_created,
        })
    }

    /// Records that a member left. Their stats and profile are kept.
    #[instrument(skip(self))]
    pub async fn on_member_left(
        &self,
        community_id: &str,
        player_id: &str,
        display_name: &str,
    ) -> Result<LeftPlayerMarker, StatsError> {
        let marker = LeftPlayerMarker::new(community_id, player_id, display_name);
        self.store.put_left_marker(&marker).await?;
        info!(community_id, player_id, "Member left, data preserved");
        Ok(marker)
    }

    /// Removes everything stored for a player. Safe to repeat.
    #[instrument(skip(self))]
    pub async fn purge_player(
        &self,
        community_id: &str,
        player_id: &str,
    ) -> Result<PurgeSummary, StatsError> {
        let records = self
            .store
            .list_stats(community_id, None, Some(player_id))
            .await?;
        for record in &records {
            self.store.delete_stat(&record.key()).await?;
        }

        let profile_deleted = self
            .store
            .get_profile(community_id, player_id)
            .await?
            .is_some();
        self.store.delete_profile(community_id, player_id).await?;

        let marker_deleted = self
            .store
            .get_left_marker(community_id, player_id)
            .await?
            .is_some();
        self.store
            .delete_left_marker(community_id, player_id)
            .await?;

        info!(
            community_id,
            player_id,
            records_deleted = records.len(),
            profile_deleted,
            marker_deleted,
            "Player purged"
        );
        Ok(PurgeSummary {
            records_deleted: records.len(),
            profile_deleted,
            marker_deleted,
        })
    }

    /// Start-up sweep over current members: fills in whatever profile or
    /// per-game record is missing and leaves the rest alone
    #[instrument(skip(self, player_ids), fields(member_count = player_ids.len()))]
    pub async fn initialize_members(
        &self,
        community_id: &str,
        player_ids: &[String],
    ) -> Result<InitSummary, StatsError> {
        let mut summary = InitSummary {
            members: player_ids.len(),
            ..InitSummary::default()
        };

        for player_id in player_ids {
            let (created_games, profile_created) =
                self.initialize_member(community_id, player_id).await?;
            summary.records_created += created_games.len();
            summary.profiles_created += usize::from(profile_created);
        }

        info!(
            records_created = summary.records_created,
            profiles_created = summary.profiles_created,
            "Members initialized"
        );
        Ok(summary)
    }

    /// Case-insensitive match of `query` against departed players' ids and
    /// display names, in store order
    #[instrument(skip(self))]
    pub async fn search_left_players(
        &self,
        community_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<LeftPlayerMarker>, StatsError> {
        let needle = query.trim().to_lowercase();
        let limit = limit.min(MAX_SEARCH_RESULTS);

        let matches: Vec<LeftPlayerMarker> = self
            .store
            .list_left_markers(community_id)
            .await?
            .into_iter()
            .filter(|marker| {
                let haystack = format!("{} {}", marker.player_id, marker.display_name);
                haystack.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect();

        debug!(match_count = matches.len(), "Searched left players");
        Ok(matches)
    }

    async fn initialize_member(
        &self,
        community_id: &str,
        player_id: &str,
    ) -> Result<(Vec<GameId>, bool), StatsError> {
        let games = GameId::all();
        let created = try_join_all(games.iter().map(|game| async move {
            let key = StatKey::new(community_id, player_id, *game);
            self.stats.ensure_record(&key).await
        }))
        .await?;

        let created_games: Vec<GameId> = games
            .into_iter()
            .zip(created)
            .filter_map(|(game, created)| created.then_some(game))
            .collect();
        let profile_created = self
            .profiles
            .ensure_profile(community_id, player_id)
            .await?;
        Ok((created_games, profile_created))
    }
}
