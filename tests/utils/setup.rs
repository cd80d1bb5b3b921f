#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use statboard::{
    leaderboard::DEFAULT_PAGE_SIZE, routes, AppState, Counter, GameId, InMemoryRecordStore,
    StatDelta, StatRecord,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub store: Arc<InMemoryRecordStore>,
    pub state: AppState,
    pub app: Router,
    pub community_id: String,
    pub players: Vec<String>,
}

pub struct TestSetupBuilder {
    players: Vec<String>,
    community_id: String,
    page_size: usize,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            players: vec![],
            community_id: "guild-123".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Players that have already joined when the test starts
    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.players = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_four_players(self) -> Self {
        self.with_players(vec!["alice", "bob", "charlie", "david"])
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub async fn build(self) -> TestSetup {
        let store = Arc::new(InMemoryRecordStore::new());
        let state = AppState::new(store.clone(), self.page_size);

        for player in &self.players {
            state
                .lifecycle
                .on_member_joined(&self.community_id, player)
                .await
                .unwrap();
        }

        let app = routes::router(state.clone());

        TestSetup {
            store,
            state,
            app,
            community_id: self.community_id,
            players: self.players,
        }
    }
}

impl TestSetup {
    /// Merges typed counters for a player through the aggregator
    pub async fn merge(&self, player: &str, game: GameId, counters: &[(Counter, u64)]) -> StatRecord {
        let delta = counters
            .iter()
            .try_fold(StatDelta::new(), |delta, (counter, amount)| {
                delta.with(*counter, *amount)
            })
            .unwrap();
        self.state
            .stats
            .apply_stat_delta(&self.community_id, player, game, &delta)
            .await
            .unwrap()
    }

    /// Sends a request through the full router and returns status and JSON body
    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Path prefix for this setup's community
    pub fn community_path(&self) -> String {
        format!("/communities/{}", self.community_id)
    }
}
