use statboard::{routes, AppState, InMemoryRecordStore, PostgresRecordStore, RecordStore, Settings};
use std::error::Error;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // A missing .env file is fine; real deployments set the environment directly
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    info!(
        bind_addr = %settings.bind_addr,
        page_size = settings.leaderboard_page_size,
        max_write_attempts = settings.max_write_attempts,
        "Starting stats service"
    );

    let store: Arc<dyn RecordStore> = match &settings.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            let store = PostgresRecordStore::new(pool);
            store.ensure_schema().await?;
            info!("Using PostgreSQL record store");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, stats will be kept in memory only");
            Arc::new(InMemoryRecordStore::new())
        }
    };

    let app_state = AppState::from_settings(store, &settings);
    let app = routes::router(app_state);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    info!("Server running on http://{}", settings.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
