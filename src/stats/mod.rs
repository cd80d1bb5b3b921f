pub mod handlers;
pub mod service;

mod errors;
pub mod models;

pub use errors::StatsError;
pub use models::*;
pub use service::StatsService;
