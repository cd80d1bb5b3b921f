use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{info, instrument};

use super::types::{PageQuery, PageResult};
use crate::shared::{AppError, AppState};
use crate::stats::{GameId, Metric};

/// HTTP handler for one page of a leaderboard
///
/// GET /communities/:community/leaderboards/:game/:metric?page=N
/// Pages are 0-based; a page past the end comes back empty
#[instrument(name = "get_leaderboard", skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path((community_id, game, metric)): Path<(String, String, String)>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResult>, AppError> {
    let game = GameId::parse(&game).map_err(AppError::invalid_input)?;
    let metric = Metric::parse(&metric).map_err(AppError::invalid_input)?;

    let page = state
        .leaderboards
        .get_leaderboard_page(&community_id, game, metric, query.page)
        .await?;

    info!(
        entries = page.entries.len(),
        max_page = page.max_page,
        "Leaderboard served"
    );
    Ok(Json(page))
}
