// Public API - what other modules can use
pub use handlers::{
    get_profile, initialize_members, member_joined, member_left, purge_player,
    search_left_players, update_profile,
};
pub use lifecycle::{InitSummary, JoinOutcome, LifecycleCoordinator, PurgeSummary};
pub use service::ProfileService;

// Internal modules
mod handlers;
pub mod lifecycle;
pub mod models;
mod service;
