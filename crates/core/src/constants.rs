//! Constants used throughout the CCR core crate.
//!
//! This module contains all path and filename constants, plus notification
//! defaults, to ensure consistency across the codebase and make maintenance
//! easier.

/// Default directory for case data storage when no explicit directory is configured.
pub const DEFAULT_CASE_DATA_DIR: &str = "case_data";

/// Filename for the canonical case record inside a case directory.
pub const CASE_JSON_FILENAME: &str = "case.json";

/// Temporary filename used for atomic case record writes.
pub const CASE_JSON_TMP_FILENAME: &str = "case.json.tmp";

/// Filename for the append-only audit trail inside a case directory.
pub const AUDIT_LOG_FILENAME: &str = "audit.jsonl";

/// Directory name for the rejection-notice outbox, relative to the data directory.
pub const OUTBOX_DIR_NAME: &str = "outbox";

/// Default cap on rejection-notice delivery attempts.
pub const DEFAULT_NOTIFY_MAX_ATTEMPTS: u32 = 5;

/// Default base delay between rejection-notice delivery attempts, in milliseconds.
pub const DEFAULT_NOTIFY_BASE_DELAY_MS: u64 = 200;
