//! Filesystem-backed case store.
//!
//! Each case lives in its own sharded directory,
//! `<case_data_dir>/<s1>/<s2>/<32hex-id>/case.json`, with the append-only
//! `audit.jsonl` beside it.
//!
//! Mutations are serialized per case by an in-process lock map and committed
//! by writing to a temporary file and renaming it over the record, so a
//! reader sees the previous or the next version, never a partial write.
//! [`CaseStore::apply_transition`] is the linearization point for review
//! decisions: a compare-and-swap that only commits if the stored status
//! still matches what the caller saw. Of two racing decisions exactly one
//! wins; the loser gets [`CaseError::StaleState`]. Different cases are
//! fully independent — there is no global lock.

use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::audit::AuditRecord;
use crate::case::{CaseStatus, CaseSummary, ClinicalCase, DecisionNote, EditableFields};
use crate::config::CoreConfig;
use crate::constants::{
    AUDIT_LOG_FILENAME, CASE_JSON_FILENAME, CASE_JSON_TMP_FILENAME,
};
use crate::error::{CaseError, CaseResult};
use crate::ident::CaseId;
use ccr_types::{EmailAddress, NonEmptyText};

/// Decision fields applied alongside a `REJECTED` transition.
#[derive(Debug, Clone)]
pub struct RejectionDetails {
    pub reason: NonEmptyText,
    pub affected_sections: BTreeSet<String>,
    pub notification_email: Option<EmailAddress>,
}

/// Review metadata applied atomically with a status transition.
#[derive(Debug, Clone)]
pub struct TransitionMetadata {
    pub reviewer_id: String,
    pub note: Option<String>,
    pub rejection: Option<RejectionDetails>,
}

impl TransitionMetadata {
    pub fn for_reviewer(reviewer_id: impl Into<String>) -> Self {
        Self {
            reviewer_id: reviewer_id.into(),
            note: None,
            rejection: None,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn with_rejection(mut self, rejection: RejectionDetails) -> Self {
        self.rejection = Some(rejection);
        self
    }
}

/// Read-path visibility scope for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Every case, regardless of status (reviewer/admin surfaces).
    All,
    /// Only `VALIDATED` cases — what learners are allowed to see.
    PublishedOnly,
}

/// Durable storage of [`ClinicalCase`] records.
#[derive(Clone)]
pub struct CaseStore {
    cfg: Arc<CoreConfig>,
    locks: Arc<Mutex<HashMap<CaseId, Arc<Mutex<()>>>>>,
}

impl CaseStore {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn case_dir(&self, id: &CaseId) -> PathBuf {
        id.sharded_dir(self.cfg.case_data_dir())
    }

    fn case_file(&self, id: &CaseId) -> PathBuf {
        self.case_dir(id).join(CASE_JSON_FILENAME)
    }

    /// Per-case mutation lock. A poisoned map only means another thread
    /// panicked mid-access; the map itself stays usable.
    fn lock_for(&self, id: &CaseId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(*id).or_default().clone()
    }

    /// Reads the case record.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::NotFound`] for an unknown id,
    /// [`CaseError::StoreUnavailable`] on I/O failure and
    /// [`CaseError::Deserialization`] if the stored record is corrupt.
    pub fn get(&self, id: &CaseId) -> CaseResult<ClinicalCase> {
        let path = self.case_file(id);
        if !path.is_file() {
            return Err(CaseError::NotFound(id.to_string()));
        }

        let contents = fs::read_to_string(&path).map_err(CaseError::StoreUnavailable)?;
        serde_json::from_str(&contents).map_err(CaseError::Deserialization)
    }

    /// Stores a freshly ingested case.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::Validation`] if a record with this id already
    /// exists.
    pub fn insert_case(&self, case: &ClinicalCase) -> CaseResult<()> {
        let lock = self.lock_for(&case.id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let dir = self.case_dir(&case.id);
        if dir.join(CASE_JSON_FILENAME).is_file() {
            return Err(CaseError::Validation(format!(
                "case {} already exists",
                case.id
            )));
        }

        fs::create_dir_all(&dir).map_err(CaseError::StoreUnavailable)?;
        self.write_case_record(case)
    }

    /// Applies a partial update of the editable fields.
    ///
    /// Does not change status. Fails with [`CaseError::InvalidState`] once
    /// the case is terminal. An empty patch returns the record unchanged.
    pub fn patch_editable_fields(
        &self,
        id: &CaseId,
        fields: &EditableFields,
    ) -> CaseResult<ClinicalCase> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut case = self.get(id)?;
        if case.status.is_terminal() {
            return Err(CaseError::InvalidState(format!(
                "case {} is {}; editable fields are frozen",
                id, case.status
            )));
        }

        if fields.is_empty() {
            return Ok(case);
        }

        if let Some(title) = &fields.title {
            let title = NonEmptyText::new(title)
                .map_err(|_| CaseError::Validation("title cannot be empty".into()))?;
            case.title = title.into_inner();
        }
        if let Some(difficulty) = fields.difficulty {
            case.difficulty = difficulty;
        }
        if let Some(introduction) = &fields.introduction {
            case.introduction = introduction.clone();
        }
        case.last_modified_date = Utc::now();

        self.write_case_record(&case)?;
        Ok(case)
    }

    /// Compare-and-swap status transition.
    ///
    /// Commits the new status together with the review metadata iff the
    /// stored status still equals `expected_status`; otherwise nothing is
    /// written and [`CaseError::StaleState`] reports the actual status.
    pub fn apply_transition(
        &self,
        id: &CaseId,
        expected_status: CaseStatus,
        new_status: CaseStatus,
        metadata: &TransitionMetadata,
    ) -> CaseResult<ClinicalCase> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut case = self.get(id)?;
        if case.status != expected_status {
            return Err(CaseError::StaleState {
                expected: expected_status,
                actual: case.status,
            });
        }

        let now = Utc::now();
        case.status = new_status;
        case.reviewer_id = Some(metadata.reviewer_id.clone());
        if let Some(text) = &metadata.note {
            case.decision_notes.push(DecisionNote {
                reviewer_id: metadata.reviewer_id.clone(),
                at: now,
                text: text.clone(),
            });
        }
        if let Some(rejection) = &metadata.rejection {
            case.rejection_reason = Some(rejection.reason.as_str().to_owned());
            case.rejection_affected_sections = rejection.affected_sections.clone();
            if let Some(email) = &rejection.notification_email {
                case.notification_email = Some(email.as_str().to_owned());
            }
        }
        case.last_modified_date = now;

        self.write_case_record(&case)?;
        Ok(case)
    }

    /// Lists case summaries under the given visibility scope.
    ///
    /// Traverses the sharded directory structure; records that cannot be
    /// read or parsed are logged and skipped rather than failing the whole
    /// listing. A missing data directory yields an empty list.
    pub fn list_cases(&self, scope: ListScope) -> CaseResult<Vec<CaseSummary>> {
        let mut summaries = Vec::new();

        let s1_iter = match fs::read_dir(self.cfg.case_data_dir()) {
            Ok(it) => it,
            Err(_) => return Ok(summaries),
        };
        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };
            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };
                for id_ent in id_iter.flatten() {
                    let id_path = id_ent.path();
                    if !id_path.is_dir() {
                        continue;
                    }

                    let case_path = id_path.join(CASE_JSON_FILENAME);
                    if !case_path.is_file() {
                        continue;
                    }

                    let contents = match fs::read_to_string(&case_path) {
                        Ok(contents) => contents,
                        Err(err) => {
                            tracing::warn!(
                                "failed to read case record {}: {}",
                                case_path.display(),
                                err
                            );
                            continue;
                        }
                    };
                    match serde_json::from_str::<ClinicalCase>(&contents) {
                        Ok(case) => {
                            if scope == ListScope::PublishedOnly
                                && case.status != CaseStatus::Validated
                            {
                                continue;
                            }
                            summaries.push(CaseSummary::from(&case));
                        }
                        Err(err) => {
                            tracing::warn!(
                                "failed to parse case record {}: {}",
                                case_path.display(),
                                err
                            );
                        }
                    }
                }
            }
        }

        summaries.sort_by(|a, b| {
            a.created_date
                .cmp(&b.created_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(summaries)
    }

    /// Full JSON snapshot of the stored record, exactly as persisted.
    pub fn export_json(&self, id: &CaseId) -> CaseResult<serde_json::Value> {
        let path = self.case_file(id);
        if !path.is_file() {
            return Err(CaseError::NotFound(id.to_string()));
        }

        let contents = fs::read_to_string(&path).map_err(CaseError::StoreUnavailable)?;
        serde_json::from_str(&contents).map_err(CaseError::Deserialization)
    }

    /// Permanently removes a case and its audit trail.
    ///
    /// Administrative operation, not a workflow transition.
    pub fn purge(&self, id: &CaseId) -> CaseResult<()> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let dir = self.case_dir(id);
        if !dir.join(CASE_JSON_FILENAME).is_file() {
            return Err(CaseError::NotFound(id.to_string()));
        }

        fs::remove_dir_all(&dir).map_err(CaseError::StoreUnavailable)?;
        drop(_guard);
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);

        tracing::info!("purged case {}", id);
        Ok(())
    }

    /// Appends one record to the case's audit trail.
    pub fn append_audit(&self, id: &CaseId, record: &AuditRecord) -> CaseResult<()> {
        let dir = self.case_dir(id);
        if !dir.join(CASE_JSON_FILENAME).is_file() {
            return Err(CaseError::NotFound(id.to_string()));
        }

        let mut line = serde_json::to_string(record).map_err(CaseError::Serialization)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(AUDIT_LOG_FILENAME))
            .map_err(CaseError::StoreUnavailable)?;
        file.write_all(line.as_bytes())
            .map_err(CaseError::StoreUnavailable)
    }

    /// Reads the case's audit trail, oldest first.
    ///
    /// Unparseable lines are logged and skipped; a case without an audit
    /// file yields an empty trail.
    pub fn read_audit(&self, id: &CaseId) -> CaseResult<Vec<AuditRecord>> {
        let dir = self.case_dir(id);
        if !dir.join(CASE_JSON_FILENAME).is_file() {
            return Err(CaseError::NotFound(id.to_string()));
        }

        let path = dir.join(AUDIT_LOG_FILENAME);
        if !path.is_file() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path).map_err(CaseError::StoreUnavailable)?;
        let mut records = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditRecord>(line) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!("skipping unparseable audit line for case {}: {}", id, err);
                }
            }
        }
        Ok(records)
    }

    /// Serializes the record and commits it with a temp-write-then-rename.
    fn write_case_record(&self, case: &ClinicalCase) -> CaseResult<()> {
        let dir = self.case_dir(&case.id);
        let tmp_path = dir.join(CASE_JSON_TMP_FILENAME);
        let final_path = dir.join(CASE_JSON_FILENAME);

        let json = serde_json::to_string_pretty(case).map_err(CaseError::Serialization)?;
        fs::write(&tmp_path, json).map_err(CaseError::StoreUnavailable)?;
        fs::rename(&tmp_path, &final_path).map_err(CaseError::StoreUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditAction;
    use crate::case::{Difficulty, DraftCase};
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_store() -> (CaseStore, TempDir) {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let cfg = CoreConfig::new(
            tmp.path().to_path_buf(),
            None,
            3,
            Duration::from_millis(1),
            None,
        )
        .expect("Failed to build config");
        (CaseStore::new(Arc::new(cfg)), tmp)
    }

    fn draft_case(domain: &str) -> ClinicalCase {
        ClinicalCase::from_draft(DraftCase {
            id: None,
            domain: domain.into(),
            title: "Acute chest pain".into(),
            difficulty: Difficulty::Medium,
            introduction: "A 54-year-old presents with acute chest pain.".into(),
            payload: serde_json::json!({
                "patient": { "age": 54, "sex": "M" },
                "labs": { "troponin": "pending" },
            }),
            status: None,
        })
        .expect("Should build draft case")
    }

    fn reviewer(id: &str) -> TransitionMetadata {
        TransitionMetadata::for_reviewer(id)
    }

    #[test]
    fn insert_and_get_round_trip() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");

        store.insert_case(&case).expect("Should insert case");
        let got = store.get(&case.id).expect("Should read case back");

        assert_eq!(got, case);
    }

    #[test]
    fn get_unknown_returns_not_found() {
        let (store, _tmp) = test_store();
        let result = store.get(&CaseId::new());

        assert!(matches!(result, Err(CaseError::NotFound(_))));
    }

    #[test]
    fn insert_duplicate_is_rejected() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");

        store.insert_case(&case).expect("Should insert case");
        let result = store.insert_case(&case);

        match result {
            Err(CaseError::Validation(msg)) => assert!(msg.contains("already exists")),
            _ => panic!("Expected Validation error for duplicate id"),
        }
    }

    #[test]
    fn patch_updates_editable_fields() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");
        store.insert_case(&case).expect("Should insert case");

        let patched = store
            .patch_editable_fields(
                &case.id,
                &EditableFields {
                    title: Some("Atypical chest pain".into()),
                    difficulty: Some(Difficulty::Hard),
                    introduction: None,
                },
            )
            .expect("Should patch fields");

        assert_eq!(patched.title, "Atypical chest pain");
        assert_eq!(patched.difficulty, Difficulty::Hard);
        assert_eq!(patched.introduction, case.introduction);
        assert_eq!(patched.status, CaseStatus::DraftAi);
        assert!(patched.last_modified_date >= case.last_modified_date);

        let reread = store.get(&case.id).expect("Should read case back");
        assert_eq!(reread, patched);
    }

    #[test]
    fn patch_rejects_empty_title() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");
        store.insert_case(&case).expect("Should insert case");

        let result = store.patch_editable_fields(
            &case.id,
            &EditableFields {
                title: Some("   ".into()),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(CaseError::Validation(_))));
    }

    #[test]
    fn patch_on_terminal_case_is_rejected() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");
        store.insert_case(&case).expect("Should insert case");
        store
            .apply_transition(
                &case.id,
                CaseStatus::DraftAi,
                CaseStatus::Validated,
                &reviewer("e1"),
            )
            .expect("Should validate case");

        let result = store.patch_editable_fields(
            &case.id,
            &EditableFields {
                title: Some("x".into()),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(CaseError::InvalidState(_))));
        let unchanged = store.get(&case.id).expect("Should read case back");
        assert_eq!(unchanged.title, "Acute chest pain");
    }

    #[test]
    fn empty_patch_is_a_noop() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");
        store.insert_case(&case).expect("Should insert case");

        let result = store
            .patch_editable_fields(&case.id, &EditableFields::default())
            .expect("Should accept empty patch");

        assert_eq!(result, case);
    }

    #[test]
    fn transition_applies_metadata() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");
        store.insert_case(&case).expect("Should insert case");

        let updated = store
            .apply_transition(
                &case.id,
                CaseStatus::DraftAi,
                CaseStatus::InProgress,
                &reviewer("e1").with_note(Some("starting review".into())),
            )
            .expect("Should transition case");

        assert_eq!(updated.status, CaseStatus::InProgress);
        assert_eq!(updated.reviewer_id.as_deref(), Some("e1"));
        assert_eq!(updated.decision_notes.len(), 1);
        assert_eq!(updated.decision_notes[0].text, "starting review");
        assert_eq!(updated.decision_notes[0].reviewer_id, "e1");
    }

    #[test]
    fn transition_stores_rejection_details() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");
        store.insert_case(&case).expect("Should insert case");

        let details = RejectionDetails {
            reason: NonEmptyText::new("missing labs").expect("Should accept reason"),
            affected_sections: ["Examens".to_string()].into_iter().collect(),
            notification_email: Some(
                EmailAddress::parse("team@x.com").expect("Should accept address"),
            ),
        };
        let updated = store
            .apply_transition(
                &case.id,
                CaseStatus::DraftAi,
                CaseStatus::Rejected,
                &reviewer("e1").with_rejection(details),
            )
            .expect("Should reject case");

        assert_eq!(updated.status, CaseStatus::Rejected);
        assert_eq!(updated.rejection_reason.as_deref(), Some("missing labs"));
        assert!(updated.rejection_affected_sections.contains("Examens"));
        assert_eq!(updated.notification_email.as_deref(), Some("team@x.com"));
    }

    #[test]
    fn transition_with_stale_expectation_is_rejected() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");
        store.insert_case(&case).expect("Should insert case");

        let result = store.apply_transition(
            &case.id,
            CaseStatus::InReview,
            CaseStatus::Validated,
            &reviewer("e1"),
        );

        match result {
            Err(CaseError::StaleState { expected, actual }) => {
                assert_eq!(expected, CaseStatus::InReview);
                assert_eq!(actual, CaseStatus::DraftAi);
            }
            _ => panic!("Expected StaleState error"),
        }

        let unchanged = store.get(&case.id).expect("Should read case back");
        assert_eq!(unchanged.status, CaseStatus::DraftAi);
    }

    #[test]
    fn concurrent_transitions_have_exactly_one_winner() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");
        store.insert_case(&case).expect("Should insert case");

        let store = Arc::new(store);
        let barrier = Arc::new(std::sync::Barrier::new(2));
        let mut handles = Vec::new();
        for (reviewer_id, target) in [("e1", CaseStatus::Validated), ("e2", CaseStatus::Rejected)] {
            let store = store.clone();
            let barrier = barrier.clone();
            let id = case.id;
            let metadata = if target == CaseStatus::Rejected {
                reviewer(reviewer_id).with_rejection(RejectionDetails {
                    reason: NonEmptyText::new("too ambiguous").expect("Should accept reason"),
                    affected_sections: BTreeSet::new(),
                    notification_email: None,
                })
            } else {
                reviewer(reviewer_id)
            };
            handles.push(std::thread::spawn(move || {
                barrier.wait();
                store.apply_transition(&id, CaseStatus::DraftAi, target, &metadata)
            }));
        }

        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("Thread should not panic"))
            .collect();

        let wins = results.iter().filter(|r| r.is_ok()).count();
        let stale = results
            .iter()
            .filter(|r| matches!(r, Err(CaseError::StaleState { .. })))
            .count();
        assert_eq!(wins, 1, "exactly one decision must commit");
        assert_eq!(stale, 1, "the losing decision must observe StaleState");

        let stored = store.get(&case.id).expect("Should read case back");
        assert!(stored.status.is_terminal());
    }

    #[test]
    fn list_respects_visibility_scope() {
        let (store, _tmp) = test_store();
        let published = draft_case("cardiology");
        let pending = draft_case("pneumology");
        store.insert_case(&published).expect("Should insert case");
        store.insert_case(&pending).expect("Should insert case");
        store
            .apply_transition(
                &published.id,
                CaseStatus::DraftAi,
                CaseStatus::Validated,
                &reviewer("e1"),
            )
            .expect("Should validate case");

        let all = store.list_cases(ListScope::All).expect("Should list cases");
        assert_eq!(all.len(), 2);

        let learner_view = store
            .list_cases(ListScope::PublishedOnly)
            .expect("Should list published cases");
        assert_eq!(learner_view.len(), 1);
        assert_eq!(learner_view[0].id, published.id);
        assert_eq!(learner_view[0].status, CaseStatus::Validated);
    }

    #[test]
    fn list_skips_unparseable_records() {
        let (store, tmp) = test_store();
        let case = draft_case("cardiology");
        store.insert_case(&case).expect("Should insert case");

        let bad_dir = tmp
            .path()
            .join("ab")
            .join("cd")
            .join("abcd0000000000000000000000000000");
        fs::create_dir_all(&bad_dir).expect("Failed to create shard dir");
        fs::write(bad_dir.join(CASE_JSON_FILENAME), "{ not json")
            .expect("Failed to write bad record");

        let listed = store.list_cases(ListScope::All).expect("Should list cases");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, case.id);
    }

    #[test]
    fn export_matches_stored_record() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");
        store.insert_case(&case).expect("Should insert case");

        let exported = store.export_json(&case.id).expect("Should export case");
        let expected = serde_json::to_value(&case).expect("Should serialize case");
        assert_eq!(exported, expected);
    }

    #[test]
    fn export_then_reingest_reproduces_equivalent_draft() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");
        store.insert_case(&case).expect("Should insert case");

        let exported = store.export_json(&case.id).expect("Should export case");
        let draft: DraftCase =
            serde_json::from_value(exported).expect("Export should parse as a draft");
        let reingested = ClinicalCase::from_draft(draft).expect("Should rebuild case from export");

        assert_eq!(reingested.id, case.id);
        assert_eq!(reingested.domain, case.domain);
        assert_eq!(reingested.status, case.status);
        assert_eq!(reingested.title, case.title);
        assert_eq!(reingested.difficulty, case.difficulty);
        assert_eq!(reingested.introduction, case.introduction);
        assert_eq!(reingested.payload, case.payload);
    }

    #[test]
    fn purge_removes_case() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");
        store.insert_case(&case).expect("Should insert case");

        store.purge(&case.id).expect("Should purge case");

        assert!(matches!(
            store.get(&case.id),
            Err(CaseError::NotFound(_))
        ));
        assert!(matches!(
            store.purge(&case.id),
            Err(CaseError::NotFound(_))
        ));
    }

    #[test]
    fn audit_append_and_read_back() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");
        store.insert_case(&case).expect("Should insert case");

        let ingested = AuditRecord::action("ingest", AuditAction::Ingested);
        let rejected = AuditRecord::transition(
            "e1",
            AuditAction::Rejected,
            CaseStatus::DraftAi,
            CaseStatus::Rejected,
        )
        .with_detail("missing labs");
        store
            .append_audit(&case.id, &ingested)
            .expect("Should append audit record");
        store
            .append_audit(&case.id, &rejected)
            .expect("Should append audit record");

        let trail = store.read_audit(&case.id).expect("Should read audit trail");
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].action, AuditAction::Ingested);
        assert_eq!(trail[1].action, AuditAction::Rejected);
        assert_eq!(trail[1].detail.as_deref(), Some("missing labs"));
    }

    #[test]
    fn audit_trail_is_empty_without_file() {
        let (store, _tmp) = test_store();
        let case = draft_case("cardiology");
        store.insert_case(&case).expect("Should insert case");

        let trail = store.read_audit(&case.id).expect("Should read audit trail");
        assert!(trail.is_empty());
    }

    #[test]
    fn audit_of_unknown_case_is_not_found() {
        let (store, _tmp) = test_store();
        let id = CaseId::new();

        assert!(matches!(
            store.read_audit(&id),
            Err(CaseError::NotFound(_))
        ));
        assert!(matches!(
            store.append_audit(&id, &AuditRecord::action("x", AuditAction::DraftSaved)),
            Err(CaseError::NotFound(_))
        ));
    }
}
