// Library crate for the community stats and leaderboard service
// This file exposes the public API for integration tests

pub mod config;
pub mod leaderboard;
pub mod profile;
pub mod routes;
pub mod shared;
pub mod stats;
pub mod store;

// Re-export commonly used types for easier access in tests
pub use config::Settings;
pub use leaderboard::{LeaderboardService, PageResult};
pub use profile::{JoinOutcome, LifecycleCoordinator, ProfileService};
pub use shared::{AppError, AppState};
pub use stats::{
    Counter, GameId, Metric, StatDelta, StatRecord, StatValue, StatsError, StatsService,
};
pub use store::{InMemoryRecordStore, PostgresRecordStore, RecordStore, StoreError};
