//! Request and response bodies of the review API.
//!
//! The decision body is the one shape with real protocol rules: exactly one
//! of its three verb payloads must be set, checked by
//! [`SubmitDecisionReq::into_decision`] before any engine call.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use ccr_core::{
    AuditRecord, CaseError, CaseResult, CaseStatus, CaseSummary, ClinicalCase, Difficulty,
    EditableFields,
};

/// Body of `PUT /cases/{id}/draft`: a partial update of the editable
/// fields. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SaveDraftReq {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub introduction: Option<String>,
}

impl From<SaveDraftReq> for EditableFields {
    fn from(req: SaveDraftReq) -> Self {
        Self {
            title: req.title,
            difficulty: req.difficulty,
            introduction: req.introduction,
        }
    }
}

/// Body of `POST /cases/{id}/decision`.
///
/// Exactly one of the three payloads must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SubmitDecisionReq {
    #[serde(default)]
    pub mark_in_progress: Option<InProgressPayload>,
    #[serde(default)]
    pub validate: Option<ValidatePayload>,
    #[serde(default)]
    pub reject: Option<RejectPayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct InProgressPayload {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ValidatePayload {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RejectPayload {
    pub reason: String,
    #[serde(default)]
    pub affected_sections: Vec<String>,
    #[serde(default)]
    pub notification_email: Option<String>,
}

/// A well-formed decision: exactly one verb.
#[derive(Debug, Clone)]
pub enum Decision {
    MarkInProgress(InProgressPayload),
    Validate(ValidatePayload),
    Reject(RejectPayload),
}

impl SubmitDecisionReq {
    /// Resolves the request into its single decision verb.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::AmbiguousDecision`] when zero or more than one
    /// verb payload is set.
    pub fn into_decision(self) -> CaseResult<Decision> {
        match (self.mark_in_progress, self.validate, self.reject) {
            (Some(payload), None, None) => Ok(Decision::MarkInProgress(payload)),
            (None, Some(payload), None) => Ok(Decision::Validate(payload)),
            (None, None, Some(payload)) => Ok(Decision::Reject(payload)),
            (None, None, None) => Err(CaseError::AmbiguousDecision(
                "exactly one of mark_in_progress, validate or reject must be set; none was"
                    .into(),
            )),
            _ => Err(CaseError::AmbiguousDecision(
                "exactly one of mark_in_progress, validate or reject must be set; more than one was"
                    .into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngestCaseRes {
    pub case: ClinicalCase,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListCasesRes {
    pub cases: Vec<CaseSummary>,
}

/// Full case with review metadata, as returned by the read endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CaseRes {
    pub case: ClinicalCase,
}

/// Outcome of a committed decision.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DecisionRes {
    pub status: CaseStatus,
    pub case: ClinicalCase,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditTrailRes {
    pub records: Vec<AuditRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_resolves_a_single_verb() {
        let req = SubmitDecisionReq {
            validate: Some(ValidatePayload { note: None }),
            ..Default::default()
        };
        assert!(matches!(
            req.into_decision(),
            Ok(Decision::Validate(_))
        ));
    }

    #[test]
    fn decision_with_no_verb_is_ambiguous() {
        let result = SubmitDecisionReq::default().into_decision();
        assert!(matches!(result, Err(CaseError::AmbiguousDecision(_))));
    }

    #[test]
    fn decision_with_two_verbs_is_ambiguous() {
        let req = SubmitDecisionReq {
            validate: Some(ValidatePayload { note: None }),
            reject: Some(RejectPayload {
                reason: "contradictory".into(),
                affected_sections: Vec::new(),
                notification_email: None,
            }),
            ..Default::default()
        };
        assert!(matches!(
            req.into_decision(),
            Err(CaseError::AmbiguousDecision(_))
        ));
    }

    #[test]
    fn reject_payload_defaults_optional_fields() {
        let payload: RejectPayload =
            serde_json::from_str(r#"{ "reason": "missing labs" }"#)
                .expect("Should parse minimal reject payload");

        assert_eq!(payload.reason, "missing labs");
        assert!(payload.affected_sections.is_empty());
        assert!(payload.notification_email.is_none());
    }
}
