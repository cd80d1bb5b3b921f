use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::ranking::{self, Ranking};
use super::types::PageResult;
use crate::stats::{GameId, Metric, StatsError};
use crate::store::RecordStore;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Builds leaderboards from a single snapshot read per request
pub struct LeaderboardService {
    store: Arc<dyn RecordStore>,
    page_size: usize,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn RecordStore>, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    #[instrument(skip(self))]
    pub async fn rank(
        &self,
        community_id: &str,
        game: GameId,
        metric: Metric,
    ) -> Result<Ranking, StatsError> {
        let snapshot = self.store.list_stats(community_id, Some(game), None).await?;
        debug!(record_count = snapshot.len(), "Loaded leaderboard snapshot");
        Ok(ranking::rank(&snapshot, game, metric))
    }

    #[instrument(skip(self))]
    pub async fn get_leaderboard_page(
        &self,
        community_id: &str,
        game: GameId,
        metric: Metric,
        page_index: usize,
    ) -> Result<PageResult, StatsError> {
        let ranking = self.rank(community_id, game, metric).await?;
        let page = ranking.page(self.page_size, page_index);

        info!(
            community_id,
            game = %game,
            metric = %metric,
            page_index,
            total = page.total,
            "Leaderboard page built"
        );
        Ok(page)
    }
}
