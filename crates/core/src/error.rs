use crate::case::CaseStatus;

/// Error taxonomy for the case review workflow.
///
/// The first six variants are caller errors: the caller recovers by
/// re-forming the request (or, for [`CaseError::StaleState`], by re-fetching
/// the case and deciding again). The remaining variants are infrastructure
/// failures surfaced from the persistence and delivery boundaries.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    #[error("case not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("stale state: case status is {actual}, expected {expected}")]
    StaleState {
        expected: CaseStatus,
        actual: CaseStatus,
    },
    #[error("ambiguous decision: {0}")]
    AmbiguousDecision(String),
    #[error("case store unavailable: {0}")]
    StoreUnavailable(std::io::Error),
    #[error("notification delivery failed: {0}")]
    Delivery(String),
    #[error("failed to serialize case record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize case record: {0}")]
    Deserialization(serde_json::Error),
}

pub type CaseResult<T> = std::result::Result<T, CaseError>;
