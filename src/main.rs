use std::sync::Arc;

use shortly::{
    codegen::Shortener,
    config::AppConfig,
    store::{MappingStore, MemoryStore, SqliteStore},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (ignore error if file is absent — env vars may already be set)
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shortly=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env()?;
    tracing::info!("Starting shortly on {}:{}", config.host, config.port);
    tracing::info!("Base URL: {}", config.base_url);

    // Pick the mapping store backend
    let store: Arc<dyn MappingStore> = if config.database_url == "memory" {
        tracing::info!("Using in-memory mapping store");
        Arc::new(MemoryStore::new())
    } else {
        tracing::info!("Using SQLite mapping store at {}", config.database_url);
        Arc::new(SqliteStore::connect(&config.database_url).await?)
    };

    let bind_addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState {
        store,
        shortener: Shortener::default(),
        config,
    });

    let app = shortly::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
