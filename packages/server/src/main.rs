use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemImageStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = server::database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    server::seed::run(&db).await.context("Failed to seed database")?;

    let image_store = FilesystemImageStore::new(
        config.upload.base_path(),
        config.upload.public_prefix(),
        config.upload.max_size,
    )
    .await
    .context("Failed to initialize upload directory")?;
    info!(dir = %config.upload.dir, max_size = config.upload.max_size, "Image store ready");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        config,
        image_store: Arc::new(image_store),
    };
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
