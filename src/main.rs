use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{build_router, notification_channel, spawn_notification_worker, AppState};
use ccr_core::{CaseStore, CoreConfig, NotificationDispatcher, OutboxTransport, ReviewService};

/// Main entry point for the CCR application
///
/// Starts the REST server for the clinical case review workflow, plus the
/// background worker that delivers rejection notices to the outbox.
///
/// # Environment Variables
/// - `CCR_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CASE_DATA_DIR`: Root of the case store (default: "case_data")
/// - `CCR_OUTBOX_DIR`: Rejection-notice outbox (default: "<CASE_DATA_DIR>/outbox")
/// - `CCR_NOTIFY_MAX_ATTEMPTS`: Delivery retry cap (default: 5)
/// - `CCR_NOTIFY_BASE_DELAY_MS`: Delivery backoff base delay (default: 200)
/// - `CCR_INGEST_API_KEY`: Shared key for the ingest boundary (unset disables the check)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("ccr=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CCR_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::from_env()?);
    let store = CaseStore::new(Arc::clone(&cfg));

    let (sink, rx) = notification_channel();
    let dispatcher = Arc::new(NotificationDispatcher::new(
        Box::new(OutboxTransport::new(cfg.outbox_dir())),
        cfg.retry_policy(),
    ));
    spawn_notification_worker(rx, dispatcher);

    let service = Arc::new(ReviewService::new(store, sink));

    tracing::info!("++ Starting CCR REST on {}", rest_addr);

    let app = build_router(AppState { cfg, service });
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
