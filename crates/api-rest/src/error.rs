//! Mapping of engine and session errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use api_shared::auth::AuthError;
use api_shared::dto::ErrorBody;
use ccr_core::CaseError;

/// Boundary error: an HTTP status plus the `{kind, message}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody::new(kind, message),
        }
    }
}

impl From<CaseError> for ApiError {
    /// Caller errors keep their message so the client can surface it inline
    /// ("reason required", "this case was already decided — refresh").
    /// Infrastructure errors are logged in full and answered generically.
    fn from(err: CaseError) -> Self {
        let (status, kind) = match &err {
            CaseError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            CaseError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            CaseError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            CaseError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
            CaseError::StaleState { .. } => (StatusCode::CONFLICT, "STALE_STATE"),
            CaseError::AmbiguousDecision(_) => (StatusCode::BAD_REQUEST, "AMBIGUOUS_DECISION"),
            CaseError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
            }
            CaseError::Delivery(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DELIVERY_ERROR"),
            CaseError::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION"),
            CaseError::Deserialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DESERIALIZATION")
            }
        };

        let message = if status.is_server_error() {
            tracing::error!("request failed with {}: {}", kind, err);
            if status == StatusCode::SERVICE_UNAVAILABLE {
                "case store temporarily unavailable; retry shortly".to_string()
            } else {
                "internal error".to_string()
            }
        } else {
            err.to_string()
        };

        Self::new(status, kind, message)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
