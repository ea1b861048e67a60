//! Append-only audit trail for case mutations.
//!
//! Every committed mutation appends one [`AuditRecord`] line to the case's
//! `audit.jsonl`. The trail is an observability side effect, not part of the
//! transition itself: an append failure is logged by the caller and never
//! reverses the already-committed mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::case::CaseStatus;

/// Kind of mutation an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Ingested,
    DraftSaved,
    MarkedInProgress,
    Validated,
    Rejected,
}

/// One line of a case's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuditRecord {
    #[schema(value_type = String)]
    pub at: DateTime<Utc>,
    pub actor_id: String,
    pub action: AuditAction,
    #[serde(default)]
    pub from_status: Option<CaseStatus>,
    #[serde(default)]
    pub to_status: Option<CaseStatus>,
    /// Free-text context, e.g. the rejection reason.
    #[serde(default)]
    pub detail: Option<String>,
}

impl AuditRecord {
    /// Builds a record for a status transition.
    pub fn transition(
        actor_id: impl Into<String>,
        action: AuditAction,
        from_status: CaseStatus,
        to_status: CaseStatus,
    ) -> Self {
        Self {
            at: Utc::now(),
            actor_id: actor_id.into(),
            action,
            from_status: Some(from_status),
            to_status: Some(to_status),
            detail: None,
        }
    }

    /// Builds a record for a non-transition mutation (ingest, draft save).
    pub fn action(actor_id: impl Into<String>, action: AuditAction) -> Self {
        Self {
            at: Utc::now(),
            actor_id: actor_id.into(),
            action,
            from_status: None,
            to_status: None,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
