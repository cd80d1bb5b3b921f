// Public API - what other modules can use
pub use handlers::get_leaderboard;
pub use ranking::{rank, Ranking};
pub use service::{LeaderboardService, DEFAULT_PAGE_SIZE};
pub use types::{LeaderboardEntry, Medal, PageResult, Placement, RankedEntry};

// Internal modules
mod handlers;
mod ranking;
mod service;
mod types;
