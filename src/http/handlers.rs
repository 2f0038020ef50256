use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::debug;

use crate::http::AppState;
use crate::models::{ErrorKind, TransactionError, TransactionRequest};
use crate::queue::Queue;
use crate::storage::Storage;
use crate::worker::StatsSnapshot;

/// Admission only queues the transaction. The queue is held in memory, so the caller is told the
/// balance has not changed yet and that a crash before application drops the transaction.
pub const ACCEPTED_MESSAGE: &str = "transaction queued in memory, the balance changes once it is applied and a crash before that loses it";

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Absent when the request never reached admission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    pub message: String
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: &'static str,
    pub worker: StatsSnapshot
}

fn error_response(status: StatusCode, kind: Option<ErrorKind>, message: String) -> Response {
    (status, Json(ErrorBody { error: ErrorDetail { kind, message } })).into_response()
}

fn status_for(error: &TransactionError) -> StatusCode {
    match error.kind() {
        ErrorKind::AccountNotFound | ErrorKind::InsufficientFunds => StatusCode::BAD_REQUEST,
        ErrorKind::PublicationFailed => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::MalformedMessage | ErrorKind::ApplyFailed => StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// `POST /api/v1/account`
pub async fn change_account_balance<S: Storage, Q: Queue>(State(state): State<Arc<AppState<S, Q>>>, body: Bytes) -> Response {
    let request: TransactionRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(error) => {
            debug!("Rejected unreadable request body: {error}");
            return error_response(StatusCode::BAD_REQUEST, None, format!("error while binding json: {error}"));
        }
    };

    match state.admission.admit(request).await {
        Ok(transaction) => Json(ApiResponse {
            success: true,
            message: ACCEPTED_MESSAGE.to_string(),
            data: transaction
        }).into_response(),
        Err(error) => error_response(status_for(&error), Some(error.kind()), error.to_string())
    }
}

/// `GET /api/v1/health`
pub async fn health_check<S: Storage, Q: Queue>(State(state): State<Arc<AppState<S, Q>>>) -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse {
        success: true,
        message: "ok".to_string(),
        data: HealthData {
            status: "ok",
            worker: state.stats.snapshot()
        }
    })
}
