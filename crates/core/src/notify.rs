//! Rejection notices and their delivery.
//!
//! Delivery is decoupled from the workflow: by the time a notice reaches
//! the dispatcher the rejection has already committed, so a delivery
//! failure is logged and retried but never reverses or blocks the
//! transition. Notices are at-least-once; a consumer of the outbox must
//! tolerate duplicates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::case::{CaseStatus, ClinicalCase};
use crate::constants::{DEFAULT_NOTIFY_BASE_DELAY_MS, DEFAULT_NOTIFY_MAX_ATTEMPTS};
use crate::error::{CaseError, CaseResult};
use crate::ident::CaseId;
use ccr_types::EmailAddress;

/// An email-shaped record of a committed rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionNotice {
    pub case_id: CaseId,
    pub to: EmailAddress,
    pub subject: String,
    pub body: String,
    #[serde(default = "Utc::now")]
    pub queued_at: DateTime<Utc>,
}

impl RejectionNotice {
    /// Builds the notice owed for an already-committed rejection.
    ///
    /// Returns `None` when no notice is owed: the record is not `REJECTED`,
    /// or it carries no deliverable notification address.
    pub fn for_case(case: &ClinicalCase) -> Option<Self> {
        if case.status != CaseStatus::Rejected {
            return None;
        }
        let to = match case.notification_email.as_deref() {
            Some(raw) => match EmailAddress::parse(raw) {
                Ok(to) => to,
                Err(err) => {
                    tracing::warn!(
                        "case {} has an undeliverable notification address: {}",
                        case.id,
                        err
                    );
                    return None;
                }
            },
            None => return None,
        };

        let reason = case.rejection_reason.as_deref().unwrap_or("(not recorded)");
        let mut body = format!(
            "The clinical case \"{}\" ({}) was rejected during expert review.\n\nReason: {}\n",
            case.title, case.id, reason
        );
        if !case.rejection_affected_sections.is_empty() {
            let sections: Vec<&str> = case
                .rejection_affected_sections
                .iter()
                .map(String::as_str)
                .collect();
            body.push_str("Affected sections: ");
            body.push_str(&sections.join(", "));
            body.push('\n');
        }

        Some(Self {
            case_id: case.id,
            to,
            subject: format!("Case review outcome: {}", case.title),
            body,
            queued_at: Utc::now(),
        })
    }
}

/// The opaque delivery capability supplied by the platform.
///
/// Implementations send the notice's `to` / `subject` / `body` envelope;
/// the full notice is passed so a transport can keep context such as the
/// case id alongside.
pub trait NotificationTransport: Send + Sync {
    /// Attempts one delivery.
    fn send(&self, notice: &RejectionNotice) -> CaseResult<()>;
}

/// Default transport: queues each notice as a JSON document in the outbox
/// directory, where the platform's mail relay picks it up out of band.
pub struct OutboxTransport {
    outbox_dir: PathBuf,
}

impl OutboxTransport {
    pub fn new(outbox_dir: impl Into<PathBuf>) -> Self {
        Self {
            outbox_dir: outbox_dir.into(),
        }
    }
}

impl NotificationTransport for OutboxTransport {
    fn send(&self, notice: &RejectionNotice) -> CaseResult<()> {
        std::fs::create_dir_all(&self.outbox_dir).map_err(|err| {
            CaseError::Delivery(format!(
                "cannot create outbox directory {}: {}",
                self.outbox_dir.display(),
                err
            ))
        })?;

        let file_name = format!("{}.json", Uuid::new_v4().simple());
        let json = serde_json::to_string_pretty(notice).map_err(CaseError::Serialization)?;
        std::fs::write(self.outbox_dir.join(&file_name), json).map_err(|err| {
            CaseError::Delivery(format!("cannot write outbox file {}: {}", file_name, err))
        })?;

        tracing::info!(
            "queued rejection notice for case {} as {}",
            notice.case_id,
            file_name
        );
        Ok(())
    }
}

/// Bounded exponential backoff for delivery attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Backoff before the attempt after `attempt` (1-based):
    /// `base_delay * 2^(attempt - 1)`, capped at 30 seconds.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        const CAP: Duration = Duration::from_secs(30);
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(CAP)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_NOTIFY_MAX_ATTEMPTS,
            Duration::from_millis(DEFAULT_NOTIFY_BASE_DELAY_MS),
        )
    }
}

/// Drives transport attempts under a [`RetryPolicy`].
pub struct NotificationDispatcher {
    transport: Box<dyn NotificationTransport>,
    policy: RetryPolicy,
}

impl NotificationDispatcher {
    pub fn new(transport: Box<dyn NotificationTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Delivers one notice, retrying per policy.
    ///
    /// Blocks the calling thread between attempts; callers on an async
    /// runtime run this on a blocking task. Exhausting the policy returns
    /// [`CaseError::Delivery`] — the caller logs it, the rejection itself
    /// has long since committed.
    pub fn deliver(&self, notice: &RejectionNotice) -> CaseResult<()> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.transport.send(notice) {
                Ok(()) => {
                    tracing::info!(
                        "delivered rejection notice for case {} (attempt {})",
                        notice.case_id,
                        attempt
                    );
                    return Ok(());
                }
                Err(err) if attempt < self.policy.max_attempts => {
                    tracing::warn!(
                        "delivery attempt {} for case {} failed: {}",
                        attempt,
                        notice.case_id,
                        err
                    );
                    std::thread::sleep(self.policy.delay_for(attempt));
                }
                Err(err) => {
                    tracing::error!(
                        "giving up on rejection notice for case {} after {} attempts: {}",
                        notice.case_id,
                        attempt,
                        err
                    );
                    return Err(CaseError::Delivery(format!(
                        "delivery failed after {} attempts: {}",
                        attempt, err
                    )));
                }
            }
        }
    }
}

/// Engine-facing hand-off seam for committed notices.
///
/// `dispatch` must not block: the engine calls it on the request path,
/// after the transition has committed.
pub trait NotificationSink: Send + Sync {
    fn dispatch(&self, notice: RejectionNotice);
}

/// Sink that drops notices with a log line, for the CLI and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn dispatch(&self, notice: RejectionNotice) {
        tracing::debug!(
            "dropping rejection notice for case {} (no delivery sink configured)",
            notice.case_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{ClinicalCase, Difficulty, DraftCase};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn rejected_case(email: Option<&str>) -> ClinicalCase {
        let mut case = ClinicalCase::from_draft(DraftCase {
            id: None,
            domain: "cardiology".into(),
            title: "Acute chest pain".into(),
            difficulty: Difficulty::Medium,
            introduction: String::new(),
            payload: serde_json::json!({}),
            status: None,
        })
        .expect("Should build draft case");
        case.status = CaseStatus::Rejected;
        case.rejection_reason = Some("missing labs".into());
        case.rejection_affected_sections = ["Examens".to_string()].into_iter().collect();
        case.notification_email = email.map(str::to_owned);
        case
    }

    fn sample_notice() -> RejectionNotice {
        RejectionNotice::for_case(&rejected_case(Some("team@x.com")))
            .expect("Rejected case with address should yield a notice")
    }

    #[test]
    fn notice_is_owed_only_for_rejected_cases_with_address() {
        let mut not_rejected = rejected_case(Some("team@x.com"));
        not_rejected.status = CaseStatus::Validated;
        assert!(RejectionNotice::for_case(&not_rejected).is_none());

        assert!(RejectionNotice::for_case(&rejected_case(None)).is_none());
        assert!(RejectionNotice::for_case(&rejected_case(Some("not an address"))).is_none());
        assert!(RejectionNotice::for_case(&rejected_case(Some("team@x.com"))).is_some());
    }

    #[test]
    fn notice_carries_reason_and_sections() {
        let notice = sample_notice();

        assert_eq!(notice.to.as_str(), "team@x.com");
        assert_eq!(notice.subject, "Case review outcome: Acute chest pain");
        assert!(notice.body.contains("missing labs"));
        assert!(notice.body.contains("Examens"));
    }

    #[test]
    fn outbox_transport_queues_notice_as_json() {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let transport = OutboxTransport::new(tmp.path().join("outbox"));
        let notice = sample_notice();

        transport.send(&notice).expect("Should queue notice");

        let entries: Vec<_> = std::fs::read_dir(tmp.path().join("outbox"))
            .expect("Outbox directory should exist")
            .flatten()
            .collect();
        assert_eq!(entries.len(), 1);

        let contents =
            std::fs::read_to_string(entries[0].path()).expect("Should read outbox file");
        let queued: RejectionNotice =
            serde_json::from_str(&contents).expect("Outbox file should parse as a notice");
        assert_eq!(queued, notice);
    }

    struct FlakyTransport {
        attempts: Arc<Mutex<u32>>,
        fail_first: u32,
    }

    impl NotificationTransport for FlakyTransport {
        fn send(&self, _notice: &RejectionNotice) -> CaseResult<()> {
            let mut attempts = self.attempts.lock().expect("Lock should not be poisoned");
            *attempts += 1;
            if *attempts <= self.fail_first {
                Err(CaseError::Delivery("mailbox offline".into()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn dispatcher_retries_until_success() {
        let attempts = Arc::new(Mutex::new(0));
        let dispatcher = NotificationDispatcher::new(
            Box::new(FlakyTransport {
                attempts: attempts.clone(),
                fail_first: 2,
            }),
            RetryPolicy::new(5, Duration::from_millis(1)),
        );

        dispatcher
            .deliver(&sample_notice())
            .expect("Delivery should succeed on the third attempt");
        assert_eq!(*attempts.lock().expect("Lock should not be poisoned"), 3);
    }

    #[test]
    fn dispatcher_gives_up_after_max_attempts() {
        let attempts = Arc::new(Mutex::new(0));
        let dispatcher = NotificationDispatcher::new(
            Box::new(FlakyTransport {
                attempts: attempts.clone(),
                fail_first: u32::MAX,
            }),
            RetryPolicy::new(3, Duration::from_millis(1)),
        );

        let result = dispatcher.deliver(&sample_notice());

        assert!(matches!(result, Err(CaseError::Delivery(_))));
        assert_eq!(*attempts.lock().expect("Lock should not be poisoned"), 3);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_millis(200));

        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(20), Duration::from_secs(30));
    }
}
