use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Wire shape of every failure response: a stable machine-readable kind
/// plus a human-readable message.
///
/// `kind` values are the SCREAMING_SNAKE_CASE taxonomy names, e.g.
/// `NOT_FOUND`, `FORBIDDEN`, `VALIDATION_ERROR`, `INVALID_STATE`,
/// `STALE_STATE`, `AMBIGUOUS_DECISION`, `STORE_UNAVAILABLE`,
/// `UNAUTHENTICATED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}
