use bikeshare_server::config::AppConfig;
use bikeshare_server::feed::{FeedSource, HttpFeedClient, MockFeedClient};
use bikeshare_server::snapshot::SnapshotCache;
use bikeshare_server::web::{AppState, create_router};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bikeshare_server=info,tower_http=info".into()),
        )
        .with_target(true)
        .init();

    if let Err(e) = run().await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    // Live feed unless a fixture directory is configured
    let source = match &config.mock_dir {
        Some(dir) => {
            warn!(dir = %dir.display(), "serving mock GBFS fixtures");
            FeedSource::from(MockFeedClient::from_dir(dir)?)
        }
        None => FeedSource::from(HttpFeedClient::new(config.feed.clone())?),
    };
    info!(source = %source.describe(), ttl_secs = config.cache.ttl.as_secs(), "using GBFS feed");

    let snapshots = SnapshotCache::new(source, config.cache.clone());

    // Warm the cache; the first request retries if this fails
    match snapshots.get_snapshot().await {
        Ok(snapshot) => info!(stations = snapshot.len(), "loaded initial snapshot"),
        Err(e) => warn!(error = %e, "initial fetch failed, will retry on first request"),
    }

    let app = create_router(AppState::new(snapshots));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "bike-share server listening");
    info!("  GET /health                  - Health check");
    info!("  GET /api/stations?min_bikes= - Stations with at least N bikes");
    info!("  GET /api/stations/:id        - One station");
    info!("  GET /api/status              - Cache status");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
