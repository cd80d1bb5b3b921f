use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::leaderboard;
use crate::profile;
use crate::shared::AppState;
use crate::stats::handlers as stats;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Every HTTP route the service exposes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/communities/:community/players/:player/stats",
            get(stats::get_stats),
        )
        .route(
            "/communities/:community/players/:player/stats/reset",
            post(stats::reset_stats),
        )
        .route(
            "/communities/:community/players/:player/stats/:game",
            post(stats::apply_stat_delta),
        )
        .route(
            "/communities/:community/players/:player/profile",
            get(profile::get_profile).patch(profile::update_profile),
        )
        .route(
            "/communities/:community/players/:player",
            delete(profile::purge_player),
        )
        .route(
            "/communities/:community/members/:player/join",
            post(profile::member_joined),
        )
        .route(
            "/communities/:community/members/:player/leave",
            post(profile::member_left),
        )
        .route(
            "/communities/:community/members/initialize",
            post(profile::initialize_members),
        )
        .route(
            "/communities/:community/left-players",
            get(profile::search_left_players),
        )
        .route(
            "/communities/:community/leaderboards/:game/:metric",
            get(leaderboard::get_leaderboard),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
