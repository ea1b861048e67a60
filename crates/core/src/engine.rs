//! The review workflow engine.
//!
//! [`ReviewService`] owns transition legality. Every decision call fetches
//! the record, consults the capability gate, checks the source status, and
//! commits through the store's compare-and-swap using the status it saw at
//! fetch time. A concurrent decision that commits in between surfaces as
//! [`CaseError::StaleState`]; the caller must re-fetch and decide again —
//! a terminal decision is never silently overwritten.
//!
//! Side effects never gate a commit. The audit append and the rejection
//! notice both happen after the transition has durably committed; their
//! failures are logged, not returned.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::audit::{AuditAction, AuditRecord};
use crate::case::{CaseStatus, CaseSummary, ClinicalCase, DraftCase, EditableFields};
use crate::error::{CaseError, CaseResult};
use crate::gate::{can_act, Actor, Role};
use crate::ident::CaseId;
use crate::notify::{NotificationSink, RejectionNotice};
use crate::store::{CaseStore, ListScope, RejectionDetails, TransitionMetadata};
use ccr_types::{EmailAddress, NonEmptyText};

/// Executes review workflow operations against the case store.
///
/// Cloning is cheap; clones share the store handle and the notification
/// sink.
#[derive(Clone)]
pub struct ReviewService {
    store: CaseStore,
    sink: Arc<dyn NotificationSink>,
}

impl ReviewService {
    pub fn new(store: CaseStore, sink: Arc<dyn NotificationSink>) -> Self {
        Self { store, sink }
    }

    /// Direct access to the underlying store, for read-only surfaces and
    /// administrative tooling.
    pub fn store(&self) -> &CaseStore {
        &self.store
    }

    /// Accepts a draft from the generation collaborator and persists it.
    ///
    /// `submitted_by` identifies the ingest caller in the audit trail, not
    /// a reviewing actor; drafts enter the workflow with no reviewer.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::Validation`] for a malformed draft or a
    /// duplicate id.
    pub fn ingest(&self, submitted_by: &str, draft: DraftCase) -> CaseResult<ClinicalCase> {
        let case = ClinicalCase::from_draft(draft)?;
        self.store.insert_case(&case)?;
        self.record_audit(
            &case.id,
            AuditRecord::action(submitted_by, AuditAction::Ingested),
        );

        tracing::info!(
            "ingested case {} in domain {} with status {}",
            case.id,
            case.domain,
            case.status
        );
        Ok(case)
    }

    /// Read-only fetch of the full record, review metadata included.
    pub fn get_case(&self, id: &CaseId) -> CaseResult<ClinicalCase> {
        self.store.get(id)
    }

    /// Lists case summaries visible to `actor`.
    ///
    /// Learners see only `VALIDATED` cases; experts and admins see
    /// everything. This read-path filter is what publication means — the
    /// engine itself only ever flips status.
    pub fn list_cases(&self, actor: &Actor) -> CaseResult<Vec<CaseSummary>> {
        let scope = match actor.role {
            Role::Learner => ListScope::PublishedOnly,
            Role::Expert | Role::Admin => ListScope::All,
        };
        self.store.list_cases(scope)
    }

    /// Full JSON snapshot of the record as stored.
    pub fn export_case(&self, id: &CaseId) -> CaseResult<serde_json::Value> {
        self.store.export_json(id)
    }

    /// The case's audit trail, oldest first.
    pub fn audit_trail(&self, id: &CaseId) -> CaseResult<Vec<AuditRecord>> {
        self.store.read_audit(id)
    }

    /// Applies a partial edit of `title` / `difficulty` / `introduction`.
    ///
    /// Legal from any non-terminal status and regardless of which reviewer
    /// last held review: draft edits are not decision-bearing. Does not
    /// change status.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::Forbidden`] if the gate fails and
    /// [`CaseError::InvalidState`] once the case is terminal.
    pub fn save_draft(
        &self,
        actor: &Actor,
        id: &CaseId,
        fields: &EditableFields,
    ) -> CaseResult<ClinicalCase> {
        let case = self.store.get(id)?;
        self.authorize(actor, &case)?;

        let updated = self.store.patch_editable_fields(id, fields)?;
        if !fields.is_empty() {
            self.record_audit(id, AuditRecord::action(&actor.id, AuditAction::DraftSaved));
            tracing::info!("case {} draft saved by {}", id, actor.id);
        }
        Ok(updated)
    }

    /// Claims the case for active review.
    ///
    /// Legal from `DRAFT_AI` and `IN_REVIEW`, and idempotently from
    /// `IN_PROGRESS` itself: re-claiming an already claimed case succeeds
    /// without writing anything. Persists `reviewer_id` and the optional
    /// note. No external side effect.
    pub fn mark_in_progress(
        &self,
        actor: &Actor,
        id: &CaseId,
        note: Option<String>,
    ) -> CaseResult<ClinicalCase> {
        let case = self.store.get(id)?;
        self.authorize(actor, &case)?;
        Self::ensure_not_terminal(&case)?;

        if case.status == CaseStatus::InProgress {
            tracing::info!("case {} is already IN_PROGRESS; nothing to do", id);
            return Ok(case);
        }

        let metadata = TransitionMetadata::for_reviewer(&actor.id).with_note(note);
        let updated =
            self.store
                .apply_transition(id, case.status, CaseStatus::InProgress, &metadata)?;
        self.record_audit(
            id,
            AuditRecord::transition(
                &actor.id,
                AuditAction::MarkedInProgress,
                case.status,
                updated.status,
            ),
        );

        tracing::info!("case {} marked IN_PROGRESS by {}", id, actor.id);
        Ok(updated)
    }

    /// Approves the case for publication.
    ///
    /// Legal from any non-terminal status. Sets `VALIDATED` and
    /// `reviewer_id`; learner visibility follows from the read-path filter
    /// in [`ReviewService::list_cases`].
    pub fn validate(
        &self,
        actor: &Actor,
        id: &CaseId,
        note: Option<String>,
    ) -> CaseResult<ClinicalCase> {
        let case = self.store.get(id)?;
        self.authorize(actor, &case)?;
        Self::ensure_not_terminal(&case)?;

        let metadata = TransitionMetadata::for_reviewer(&actor.id).with_note(note);
        let updated =
            self.store
                .apply_transition(id, case.status, CaseStatus::Validated, &metadata)?;
        self.record_audit(
            id,
            AuditRecord::transition(
                &actor.id,
                AuditAction::Validated,
                case.status,
                updated.status,
            ),
        );

        tracing::info!("case {} validated by {}", id, actor.id);
        Ok(updated)
    }

    /// Rejects the case with a mandatory reason.
    ///
    /// Legal from any non-terminal status. The non-empty-reason rule is
    /// enforced here, before anything is fetched or written, so an empty
    /// reason can never change status. When the committed record carries a
    /// notification address, a [`RejectionNotice`] is handed to the sink
    /// after the commit; delivery failure never reverses the rejection.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::Validation`] for an empty reason,
    /// [`CaseError::Forbidden`] if the gate fails,
    /// [`CaseError::InvalidState`] for a terminal case and
    /// [`CaseError::StaleState`] if a concurrent decision won the race.
    pub fn reject(
        &self,
        actor: &Actor,
        id: &CaseId,
        reason: &str,
        affected_sections: BTreeSet<String>,
        notification_email: Option<EmailAddress>,
    ) -> CaseResult<ClinicalCase> {
        let reason = NonEmptyText::new(reason)
            .map_err(|_| CaseError::Validation("rejection reason cannot be empty".into()))?;

        let case = self.store.get(id)?;
        self.authorize(actor, &case)?;
        Self::ensure_not_terminal(&case)?;

        let metadata = TransitionMetadata::for_reviewer(&actor.id).with_rejection(RejectionDetails {
            reason: reason.clone(),
            affected_sections,
            notification_email,
        });
        let updated =
            self.store
                .apply_transition(id, case.status, CaseStatus::Rejected, &metadata)?;
        self.record_audit(
            id,
            AuditRecord::transition(
                &actor.id,
                AuditAction::Rejected,
                case.status,
                updated.status,
            )
            .with_detail(reason.as_str()),
        );

        if let Some(notice) = RejectionNotice::for_case(&updated) {
            self.sink.dispatch(notice);
        }

        tracing::info!("case {} rejected by {}", id, actor.id);
        Ok(updated)
    }

    /// Administrative removal of a case and its audit trail.
    ///
    /// Not a workflow transition; requires the admin role regardless of
    /// domain.
    pub fn purge(&self, actor: &Actor, id: &CaseId) -> CaseResult<()> {
        if actor.role != Role::Admin {
            return Err(CaseError::Forbidden(format!(
                "case purge requires the admin role; {} is {}",
                actor.id, actor.role
            )));
        }
        self.store.purge(id)
    }

    fn authorize(&self, actor: &Actor, case: &ClinicalCase) -> CaseResult<()> {
        if can_act(actor, case) {
            return Ok(());
        }
        Err(CaseError::Forbidden(format!(
            "{} {} in domain '{}' may not act on case {} in domain '{}'",
            actor.role, actor.id, actor.domain, case.id, case.domain
        )))
    }

    fn ensure_not_terminal(case: &ClinicalCase) -> CaseResult<()> {
        if case.status.is_terminal() {
            return Err(CaseError::InvalidState(format!(
                "case {} is already {} and accepts no further changes",
                case.id, case.status
            )));
        }
        Ok(())
    }

    /// Best-effort audit append: the mutation has already committed, so a
    /// failure here is logged, never returned.
    fn record_audit(&self, id: &CaseId, record: AuditRecord) {
        if let Err(err) = self.store.append_audit(id, &record) {
            tracing::warn!("failed to append audit record for case {}: {}", id, err);
        }
    }
}
