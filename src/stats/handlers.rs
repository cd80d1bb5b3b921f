use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, instrument};

use super::{GameId, StatDelta, StatRecord, StatsError};
use crate::shared::{AppError, AppState};

/// Optional `?game=` filter shared by the stat view and reset endpoints
#[derive(Debug, Default, Deserialize)]
pub struct GameQuery {
    pub game: Option<String>,
}

impl GameQuery {
    fn game(&self) -> Result<Option<GameId>, AppError> {
        self.game
            .as_deref()
            .map(GameId::parse)
            .transpose()
            .map_err(AppError::invalid_input)
    }
}

/// Turns a JSON object of counter names to integers into a validated delta
fn delta_from_body(body: HashMap<String, serde_json::Value>) -> Result<StatDelta, StatsError> {
    let entries = body
        .into_iter()
        .map(|(name, value)| match value.as_i64() {
            Some(amount) => Ok((name, amount)),
            None => Err(StatsError::InvalidDelta(format!(
                "'{}' must be a whole number, got {}",
                name, value
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    StatDelta::from_raw(entries)
}

/// HTTP handler for merging a stat delta
///
/// POST /communities/:community/players/:player/stats/:game
/// Body: {"kills": 12, "deaths": 4}
#[instrument(name = "apply_stat_delta", skip(state, body))]
pub async fn apply_stat_delta(
    State(state): State<AppState>,
    Path((community_id, player_id, game)): Path<(String, String, String)>,
    Json(body): Json<HashMap<String, serde_json::Value>>,
) -> Result<Json<StatRecord>, AppError> {
    let game = GameId::parse(&game).map_err(AppError::invalid_input)?;
    let delta = delta_from_body(body)?;

    let record = state
        .stats
        .apply_stat_delta(&community_id, &player_id, game, &delta)
        .await?;

    info!(revision = record.revision, "Stat delta merged");
    Ok(Json(record))
}

/// HTTP handler for viewing a player's stats
///
/// GET /communities/:community/players/:player/stats?game=r6s
#[instrument(name = "get_stats", skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    Path((community_id, player_id)): Path<(String, String)>,
    Query(query): Query<GameQuery>,
) -> Result<Json<Vec<StatRecord>>, AppError> {
    let game = query.game()?;

    let records = match game {
        Some(game) => vec![state.stats.get_stat(&community_id, &player_id, game).await?],
        None => state.stats.get_stats(&community_id, &player_id, None).await?,
    };

    if records.is_empty() {
        return Err(AppError::NotFound(format!(
            "No stats recorded for player {}",
            player_id
        )));
    }
    Ok(Json(records))
}

/// HTTP handler for zeroing a player's stats
///
/// POST /communities/:community/players/:player/stats/reset?game=bf6
/// Without `game` every tracked game is reset
#[instrument(name = "reset_stats", skip(state))]
pub async fn reset_stats(
    State(state): State<AppState>,
    Path((community_id, player_id)): Path<(String, String)>,
    Query(query): Query<GameQuery>,
) -> Result<Json<Vec<StatRecord>>, AppError> {
    let game = query.game()?;

    let records = state
        .stats
        .reset_stats(&community_id, &player_id, game)
        .await?;

    info!(games = records.len(), "Stats reset");
    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt; // for `oneshot`

    fn app() -> Router {
        let state = AppStateBuilder::new().build();
        Router::new()
            .route(
                "/communities/:community/players/:player/stats",
                axum::routing::get(get_stats),
            )
            .route(
                "/communities/:community/players/:player/stats/reset",
                axum::routing::post(reset_stats),
            )
            .route(
                "/communities/:community/players/:player/stats/:game",
                axum::routing::post(apply_stat_delta),
            )
            .with_state(state)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[test]
    fn delta_body_rejects_non_integers() {
        let body = HashMap::from([("kills".to_string(), json!(1.5))]);
        assert!(matches!(delta_from_body(body), Err(StatsError::InvalidDelta(_))));

        let body = HashMap::from([("kills".to_string(), json!("5"))]);
        assert!(matches!(delta_from_body(body), Err(StatsError::InvalidDelta(_))));
    }

    #[tokio::test]
    async fn test_apply_stat_delta_handler() {
        let app = app();

        let (status, record) = send(
            &app,
            "POST",
            "/communities/guild/players/alice/stats/r6s",
            Some(json!({"kills": 12, "deaths": 4, "wins": 1})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["kills"], 12);
        assert_eq!(record["deaths"], 4);
        assert_eq!(record["kd"], 3.0);
        assert_eq!(record["wl"], 0.0);
        assert_eq!(record["game"], "r6s");
    }

    #[tokio::test]
    async fn test_apply_stat_delta_rejects_negative() {
        let app = app();

        let (status, body) = send(
            &app,
            "POST",
            "/communities/guild/players/alice/stats/r6s",
            Some(json!({"kills": -3})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("negative"));
    }

    #[tokio::test]
    async fn test_apply_stat_delta_rejects_derived_and_unknown_names() {
        let app = app();

        for body in [json!({"kd": 2}), json!({"headshots": 2})] {
            let (status, _) = send(
                &app,
                "POST",
                "/communities/guild/players/alice/stats/bf6",
                Some(body),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_apply_stat_delta_unknown_game() {
        let app = app();

        let (status, _) = send(
            &app,
            "POST",
            "/communities/guild/players/alice/stats/cs2",
            Some(json!({"kills": 1})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_stats_after_merge_and_reset() {
        let app = app();
        send(
            &app,
            "POST",
            "/communities/guild/players/alice/stats/bf6",
            Some(json!({"wins": 3, "losses": 1})),
        )
        .await;

        let (status, records) = send(
            &app,
            "GET",
            "/communities/guild/players/alice/stats?game=bf6",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(records[0]["wl"], 3.0);

        let (status, records) = send(
            &app,
            "POST",
            "/communities/guild/players/alice/stats/reset",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(records.as_array().unwrap().len(), GameId::all().len());

        let (_, records) = send(&app, "GET", "/communities/guild/players/alice/stats", None).await;
        for record in records.as_array().unwrap() {
            assert_eq!(record["wins"], 0);
            assert_eq!(record["wl"], 0.0);
        }
    }

    #[tokio::test]
    async fn test_get_stats_for_unknown_player() {
        let app = app();

        let (status, _) = send(&app, "GET", "/communities/guild/players/ghost/stats", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "GET",
            "/communities/guild/players/ghost/stats?game=r6s",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
