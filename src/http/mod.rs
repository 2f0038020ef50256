mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::admission::AdmissionService;
use crate::queue::Queue;
use crate::storage::Storage;
use crate::worker::WorkerStats;

pub struct AppState<S: Storage, Q: Queue> {
    pub admission: AdmissionService<S, Q>,
    pub stats: Arc<WorkerStats>
}

pub fn router<S: Storage, Q: Queue>(state: Arc<AppState<S, Q>>) -> Router {
    Router::new()
        .route("/api/v1/account", post(handlers::change_account_balance::<S, Q>))
        .route("/api/v1/health", get(handlers::health_check::<S, Q>))
        .with_state(state)
}

/// Serves until `shutdown` is cancelled, letting in-flight admissions finish.
pub async fn serve(listener: TcpListener, router: Router, shutdown: CancellationToken) -> std::io::Result<()> {
    info!("Starting app at {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
