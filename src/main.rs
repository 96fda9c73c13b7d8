use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cypher_hub::config::{Cli, Config};
use cypher_hub::db;
use cypher_hub::routes;
use cypher_hub::state::AppState;
use cypher_hub::storage::LocalThumbnailStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli)?;
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Ensure uploads directory exists
    let uploads = config.uploads_path();
    std::fs::create_dir_all(&uploads)?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    let thumbnails = LocalThumbnailStore::new(uploads, config.storage.public_prefix.clone());
    let state = AppState {
        db: pool,
        config: config.clone(),
        thumbnails: Arc::new(thumbnails),
    };

    let app = routes::build_app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("cypher-hub listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
