use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Request-level error taxonomy. Every variant renders as
/// `{"error": "<message>"}`; internal causes are logged server-side and
/// never leak into the body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed, expired, or wrongly signed session credential.
    /// All causes collapse into the same response on purpose.
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// Domain-state conflicts (pairing rules, missing partner). The client
    /// relies on the specific message.
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<daybreak_db::PairError> for ApiError {
    fn from(e: daybreak_db::PairError) -> Self {
        use daybreak_db::PairError::*;
        match e {
            e @ PartnerNotFound => ApiError::NotFound(e.to_string()),
            e @ (SelfPair | AlreadyPaired | PartnerTaken) => ApiError::Conflict(e.to_string()),
            Storage(err) => ApiError::Internal(err),
        }
    }
}

pub(crate) fn join_error(e: tokio::task::JoinError) -> ApiError {
    ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e))
}
