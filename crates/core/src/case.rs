//! Clinical case records and the review status model.
//!
//! A [`ClinicalCase`] is the canonical record the review workflow operates
//! on. The structured clinical payload inside it is deliberately opaque to
//! the workflow: the engine reads only `domain` (for the capability gate)
//! and `status`. The editable subset (`title`, `difficulty`,
//! `introduction`) is the only content the review UI may change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use utoipa::ToSchema;

use crate::error::{CaseError, CaseResult};
use crate::ident::CaseId;
use ccr_types::NonEmptyText;

/// Review lifecycle status of a clinical case.
///
/// `DRAFT_AI → IN_REVIEW → {IN_PROGRESS, VALIDATED, REJECTED}` and
/// `IN_PROGRESS → {IN_PROGRESS, VALIDATED, REJECTED}`; `VALIDATED` and
/// `REJECTED` are terminal. `DRAFT_AI` and `IN_REVIEW` are only ever written
/// by the ingest/triage boundary, never produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    DraftAi,
    InReview,
    InProgress,
    Validated,
    Rejected,
}

impl CaseStatus {
    /// Returns true for the terminal states, in which the record accepts no
    /// further workflow mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaseStatus::Validated | CaseStatus::Rejected)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaseStatus::DraftAi => "DRAFT_AI",
            CaseStatus::InReview => "IN_REVIEW",
            CaseStatus::InProgress => "IN_PROGRESS",
            CaseStatus::Validated => "VALIDATED",
            CaseStatus::Rejected => "REJECTED",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for CaseStatus {
    type Err = CaseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim() {
            "DRAFT_AI" => Ok(CaseStatus::DraftAi),
            "IN_REVIEW" => Ok(CaseStatus::InReview),
            "IN_PROGRESS" => Ok(CaseStatus::InProgress),
            "VALIDATED" => Ok(CaseStatus::Validated),
            "REJECTED" => Ok(CaseStatus::Rejected),
            other => Err(CaseError::Validation(format!(
                "unknown case status: '{}'",
                other
            ))),
        }
    }
}

/// Pedagogical difficulty of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A free-text note left by a reviewer during a decision-affecting action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DecisionNote {
    pub reviewer_id: String,
    #[schema(value_type = String)]
    pub at: DateTime<Utc>,
    pub text: String,
}

/// The canonical clinical case record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClinicalCase {
    /// Stable, globally unique, immutable identifier.
    #[schema(value_type = String)]
    pub id: CaseId,
    /// Clinical domain the case belongs to (e.g. `cardiology`). Immutable
    /// once set; re-checked by the capability gate on every transition.
    pub domain: String,
    pub status: CaseStatus,
    pub title: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub introduction: String,
    /// Opaque structured clinical payload (patient identity, history,
    /// findings, labs, treatments, diagnosis, objectives, hints, pitfalls).
    /// The workflow never inspects it.
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    /// Reviewer who last performed a decision-affecting action.
    #[serde(default)]
    pub reviewer_id: Option<String>,
    #[serde(default)]
    pub decision_notes: Vec<DecisionNote>,
    /// Non-empty whenever `status` is `REJECTED`.
    #[serde(default)]
    pub rejection_reason: Option<String>,
    /// Named sections the rejection applies to; may be empty.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub rejection_affected_sections: BTreeSet<String>,
    /// Address the rejection notice was (or will be) sent to.
    #[serde(default)]
    pub notification_email: Option<String>,
    #[schema(value_type = String)]
    pub created_date: DateTime<Utc>,
    #[schema(value_type = String)]
    pub last_modified_date: DateTime<Utc>,
}

/// Parameters accepted at the ingest boundary when the generation
/// collaborator hands over a new case.
///
/// Decision metadata cannot be supplied here: a draft enters the workflow
/// clean, in `DRAFT_AI` (or `IN_REVIEW` when triage has already assigned
/// it).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DraftCase {
    /// Canonical case id; omitted to have one allocated.
    #[serde(default)]
    pub id: Option<String>,
    pub domain: String,
    pub title: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub introduction: String,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    /// Initial status; restricted to `DRAFT_AI` (default) or `IN_REVIEW`.
    #[serde(default)]
    pub status: Option<CaseStatus>,
}

impl ClinicalCase {
    /// Builds a fresh case record from an ingest draft.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::Validation`] if the supplied id is not canonical,
    /// `domain` or `title` is empty, or the requested status is not an
    /// ingestable one.
    pub fn from_draft(draft: DraftCase) -> CaseResult<Self> {
        let id = match draft.id {
            Some(raw) => CaseId::parse(&raw)?,
            None => CaseId::new(),
        };

        let domain = NonEmptyText::new(&draft.domain)
            .map_err(|_| CaseError::Validation("domain cannot be empty".into()))?;
        let title = NonEmptyText::new(&draft.title)
            .map_err(|_| CaseError::Validation("title cannot be empty".into()))?;

        let status = match draft.status {
            None => CaseStatus::DraftAi,
            Some(status @ (CaseStatus::DraftAi | CaseStatus::InReview)) => status,
            Some(other) => {
                return Err(CaseError::Validation(format!(
                    "cases cannot be ingested in status {}",
                    other
                )));
            }
        };

        let now = Utc::now();
        Ok(Self {
            id,
            domain: domain.into_inner(),
            status,
            title: title.into_inner(),
            difficulty: draft.difficulty,
            introduction: draft.introduction,
            payload: draft.payload,
            reviewer_id: None,
            decision_notes: Vec::new(),
            rejection_reason: None,
            rejection_affected_sections: BTreeSet::new(),
            notification_email: None,
            created_date: now,
            last_modified_date: now,
        })
    }
}

/// The subset of fields the editor may change while a case is non-terminal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EditableFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub introduction: Option<String>,
}

impl EditableFields {
    /// Returns true when no field is set, i.e. the patch is a no-op.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.difficulty.is_none() && self.introduction.is_none()
    }
}

/// Listing projection of a case record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CaseSummary {
    #[schema(value_type = String)]
    pub id: CaseId,
    pub domain: String,
    pub status: CaseStatus,
    pub title: String,
    pub difficulty: Difficulty,
    #[schema(value_type = String)]
    pub created_date: DateTime<Utc>,
    #[schema(value_type = String)]
    pub last_modified_date: DateTime<Utc>,
}

impl From<&ClinicalCase> for CaseSummary {
    fn from(case: &ClinicalCase) -> Self {
        Self {
            id: case.id,
            domain: case.domain.clone(),
            status: case.status,
            title: case.title.clone(),
            difficulty: case.difficulty,
            created_date: case.created_date,
            last_modified_date: case.last_modified_date,
        }
    }
}
