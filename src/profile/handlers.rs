use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::lifecycle::{InitSummary, JoinOutcome, PurgeSummary, MAX_SEARCH_RESULTS};
use super::models::{LeftPlayerMarker, Profile, ProfileUpdate};
use crate::shared::{AppError, AppState};

/// Request payload for a member leaving
#[derive(Debug, Deserialize)]
pub struct LeaveRequest {
    pub display_name: String,
}

/// Request payload for the start-up member sweep
#[derive(Debug, Deserialize)]
pub struct InitializeRequest {
    pub player_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeftPlayerQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// GET /communities/:community/players/:player/profile
#[instrument(name = "get_profile", skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path((community_id, player_id)): Path<(String, String)>,
) -> Result<Json<Profile>, AppError> {
    let profile = state
        .profiles
        .get_or_create_profile(&community_id, &player_id)
        .await?;
    Ok(Json(profile))
}

/// PATCH /communities/:community/players/:player/profile
/// Only fields present in the body are changed
#[instrument(name = "update_profile", skip(state, update))]
pub async fn update_profile(
    State(state): State<AppState>,
    Path((community_id, player_id)): Path<(String, String)>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>, AppError> {
    let profile = state
        .profiles
        .update_profile(&community_id, &player_id, &update)
        .await?;
    Ok(Json(profile))
}

/// POST /communities/:community/members/:player/join
#[instrument(name = "member_joined", skip(state))]
pub async fn member_joined(
    State(state): State<AppState>,
    Path((community_id, player_id)): Path<(String, String)>,
) -> Result<Json<JoinOutcome>, AppError> {
    let outcome = state
        .lifecycle
        .on_member_joined(&community_id, &player_id)
        .await?;
    Ok(Json(outcome))
}

/// POST /communities/:community/members/:player/leave
#[instrument(name = "member_left", skip(state, request))]
pub async fn member_left(
    State(state): State<AppState>,
    Path((community_id, player_id)): Path<(String, String)>,
    Json(request): Json<LeaveRequest>,
) -> Result<Json<LeftPlayerMarker>, AppError> {
    let marker = state
        .lifecycle
        .on_member_left(&community_id, &player_id, &request.display_name)
        .await?;
    Ok(Json(marker))
}

/// POST /communities/:community/members/initialize
///
/// Fills in missing profiles and per-game records for the listed members
#[instrument(name = "initialize_members", skip(state, request))]
pub async fn initialize_members(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
    Json(request): Json<InitializeRequest>,
) -> Result<Json<InitSummary>, AppError> {
    let summary = state
        .lifecycle
        .initialize_members(&community_id, &request.player_ids)
        .await?;
    Ok(Json(summary))
}

/// DELETE /communities/:community/players/:player
///
/// Irreversibly removes the player's profile, stats and left marker
#[instrument(name = "purge_player", skip(state))]
pub async fn purge_player(
    State(state): State<AppState>,
    Path((community_id, player_id)): Path<(String, String)>,
) -> Result<Json<PurgeSummary>, AppError> {
    let summary = state
        .lifecycle
        .purge_player(&community_id, &player_id)
        .await?;
    info!(records_deleted = summary.records_deleted, "Player data deleted");
    Ok(Json(summary))
}

/// GET /communities/:community/left-players?q=name&limit=10
#[instrument(name = "search_left_players", skip(state))]
pub async fn search_left_players(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
    Query(query): Query<LeftPlayerQuery>,
) -> Result<Json<Vec<LeftPlayerMarker>>, AppError> {
    let limit = query.limit.unwrap_or(MAX_SEARCH_RESULTS);
    let markers = state
        .lifecycle
        .search_left_players(&community_id, &query.q, limit)
        .await?;
    Ok(Json(markers))
}
