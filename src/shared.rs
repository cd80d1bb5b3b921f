use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

use crate::config::Settings;
use crate::leaderboard::LeaderboardService;
use crate::profile::{LifecycleCoordinator, ProfileService};
use crate::stats::{service::DEFAULT_MAX_WRITE_ATTEMPTS, StatsError, StatsService};
use crate::store::RecordStore;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub stats: Arc<StatsService>,
    pub leaderboards: Arc<LeaderboardService>,
    pub profiles: Arc<ProfileService>,
    pub lifecycle: Arc<LifecycleCoordinator>,
}

impl AppState {
    /// Wires every service over one store
    pub fn new(store: Arc<dyn RecordStore>, page_size: usize) -> Self {
        Self::wire(store, page_size, DEFAULT_MAX_WRITE_ATTEMPTS)
    }

    pub fn from_settings(store: Arc<dyn RecordStore>, settings: &Settings) -> Self {
        Self::wire(
            store,
            settings.leaderboard_page_size,
            settings.max_write_attempts,
        )
    }

    fn wire(store: Arc<dyn RecordStore>, page_size: usize, max_write_attempts: usize) -> Self {
        let stats = Arc::new(
            StatsService::new(Arc::clone(&store)).with_max_write_attempts(max_write_attempts),
        );
        let profiles = Arc::new(ProfileService::new(Arc::clone(&store)));
        let leaderboards = Arc::new(LeaderboardService::new(Arc::clone(&store), page_size));
        let lifecycle = Arc::new(LifecycleCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&stats),
            Arc::clone(&profiles),
        ));

        Self {
            stats,
            leaderboards,
            profiles,
            lifecycle,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// For caller input that failed to parse, whatever the core called it
    pub fn invalid_input(err: StatsError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::InvalidDelta(_) | StatsError::Validation(_) => {
                AppError::BadRequest(err.to_string())
            }
            StatsError::NotFound(msg) => AppError::NotFound(msg),
            StatsError::InconsistentState(_) => AppError::Conflict(err.to_string()),
            StatsError::StoreUnavailable(_) => AppError::ServiceUnavailable(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => {
                warn!(error = %msg, "Request hit inconsistent state");
                (StatusCode::CONFLICT, msg)
            }
            AppError::ServiceUnavailable(msg) => {
                error!(error = %msg, "Store unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::leaderboard::DEFAULT_PAGE_SIZE;
    use crate::store::InMemoryRecordStore;

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        store: Option<Arc<dyn RecordStore>>,
        page_size: usize,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                store: None,
                page_size: DEFAULT_PAGE_SIZE,
            }
        }

        pub fn with_store(mut self, store: Arc<dyn RecordStore>) -> Self {
            self.store = Some(store);
            self
        }

        pub fn with_page_size(mut self, page_size: usize) -> Self {
            self.page_size = page_size;
            self
        }

        pub fn build(self) -> AppState {
            let store = self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryRecordStore::new()));
            AppState::new(store, self.page_size)
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StatsError::InvalidDelta("x".into()), StatusCode::BAD_REQUEST)]
    #[case(StatsError::Validation("x".into()), StatusCode::BAD_REQUEST)]
    #[case(StatsError::NotFound("x".into()), StatusCode::NOT_FOUND)]
    #[case(StatsError::InconsistentState("x".into()), StatusCode::CONFLICT)]
    #[case(StatsError::StoreUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE)]
    fn stats_errors_map_to_status(#[case] err: StatsError, #[case] status: StatusCode) {
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), status);
    }
}
