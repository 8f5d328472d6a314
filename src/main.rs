use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use podviz::handlers;
use podviz::state::{AppState, Config, DataSource, Snapshot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("podviz=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    let source = DataSource::from_config(&config).context("failed to set up data source")?;
    match &config.api_base_url {
        Some(url) => info!("Serving leaves from {}", url),
        None => info!("API_BASE_URL not set, serving mock leaves (seed {})", config.mock_seed),
    }

    let state = Arc::new(AppState::new(source, Snapshot::empty()?));
    if let Err(e) = state.refresh().await {
        warn!("Initial refresh failed, starting with an empty snapshot: {}", e);
    }

    let scheduler = JobScheduler::new().await?;
    let job_state = state.clone();
    let job = Job::new_async(config.refresh_cron.as_str(), move |_uuid, _lock| {
        let state = job_state.clone();
        Box::pin(async move {
            if let Err(e) = state.refresh().await {
                error!("Scheduled refresh failed: {}", e);
            }
        })
    })
    .with_context(|| format!("invalid REFRESH_CRON {:?}", config.refresh_cron))?;
    scheduler.add(job).await?;
    scheduler.start().await?;

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/root", get(handlers::root))
        .route("/api/summary", get(handlers::summary))
        .route("/api/leaderboard", get(handlers::leaderboard))
        .route("/api/validators", get(handlers::validators))
        .route("/api/validators/{version}", get(handlers::validator))
        .route("/api/leaves", get(handlers::leaves))
        .route("/api/leaves/{pubkey}", get(handlers::leaf))
        .route("/api/leaves/{pubkey}/query/{arg}", get(handlers::query_leaf))
        .route("/api/smart-query", post(handlers::smart_query))
        .route("/api/analytics/versions", get(handlers::api_versions))
        .route("/api/analytics/continents", get(handlers::api_continents))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
