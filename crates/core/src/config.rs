//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process
//! startup and then passed into core services. The intent is to avoid
//! reading process-wide environment variables during request handling, which
//! can lead to inconsistent behaviour in multi-threaded runtimes and test
//! harnesses.
//!
//! Environment variables (read by [`CoreConfig::from_env`] only):
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `CASE_DATA_DIR` | `case_data` | Root of the sharded case store. |
//! | `CCR_OUTBOX_DIR` | `<CASE_DATA_DIR>/outbox` | Rejection-notice outbox. |
//! | `CCR_NOTIFY_MAX_ATTEMPTS` | `5` | Delivery retry cap. |
//! | `CCR_NOTIFY_BASE_DELAY_MS` | `200` | Delivery backoff base delay. |
//! | `CCR_INGEST_API_KEY` | unset | Shared key for the ingest boundary; unset disables the check. |

use crate::constants::{
    DEFAULT_CASE_DATA_DIR, DEFAULT_NOTIFY_BASE_DELAY_MS, DEFAULT_NOTIFY_MAX_ATTEMPTS,
    OUTBOX_DIR_NAME,
};
use crate::error::{CaseError, CaseResult};
use crate::notify::RetryPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    case_data_dir: PathBuf,
    outbox_dir: PathBuf,
    notify_max_attempts: u32,
    notify_base_delay: Duration,
    ingest_api_key: Option<String>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `outbox_dir` defaults to `<case_data_dir>/outbox` when not supplied.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::Validation`] if `case_data_dir` is empty,
    /// `notify_max_attempts` is zero, or a supplied ingest key is empty.
    pub fn new(
        case_data_dir: PathBuf,
        outbox_dir: Option<PathBuf>,
        notify_max_attempts: u32,
        notify_base_delay: Duration,
        ingest_api_key: Option<String>,
    ) -> CaseResult<Self> {
        if case_data_dir.as_os_str().is_empty() {
            return Err(CaseError::Validation("case_data_dir cannot be empty".into()));
        }

        if notify_max_attempts == 0 {
            return Err(CaseError::Validation(
                "notify_max_attempts must be at least 1".into(),
            ));
        }

        if let Some(key) = &ingest_api_key {
            if key.trim().is_empty() {
                return Err(CaseError::Validation(
                    "ingest API key cannot be empty".into(),
                ));
            }
        }

        let outbox_dir = outbox_dir.unwrap_or_else(|| case_data_dir.join(OUTBOX_DIR_NAME));

        Ok(Self {
            case_data_dir,
            outbox_dir,
            notify_max_attempts,
            notify_base_delay,
            ingest_api_key,
        })
    }

    /// Resolve the configuration from the process environment.
    ///
    /// Intended to be called once, at binary startup.
    pub fn from_env() -> CaseResult<Self> {
        let case_data_dir = std::env::var("CASE_DATA_DIR")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CASE_DATA_DIR.into());

        let outbox_dir = std::env::var("CCR_OUTBOX_DIR")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let notify_max_attempts =
            notify_max_attempts_from_env_value(std::env::var("CCR_NOTIFY_MAX_ATTEMPTS").ok())?;
        let notify_base_delay =
            notify_base_delay_from_env_value(std::env::var("CCR_NOTIFY_BASE_DELAY_MS").ok())?;
        let ingest_api_key =
            ingest_api_key_from_env_value(std::env::var("CCR_INGEST_API_KEY").ok());

        Self::new(
            PathBuf::from(case_data_dir),
            outbox_dir,
            notify_max_attempts,
            notify_base_delay,
            ingest_api_key,
        )
    }

    pub fn case_data_dir(&self) -> &Path {
        &self.case_data_dir
    }

    pub fn outbox_dir(&self) -> &Path {
        &self.outbox_dir
    }

    pub fn notify_max_attempts(&self) -> u32 {
        self.notify_max_attempts
    }

    pub fn notify_base_delay(&self) -> Duration {
        self.notify_base_delay
    }

    /// The retry policy the notification dispatcher should run with.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.notify_max_attempts, self.notify_base_delay)
    }

    /// Expected ingest key, if the ingest boundary is locked down.
    pub fn ingest_api_key(&self) -> Option<&str> {
        self.ingest_api_key.as_deref()
    }
}

/// Parse the delivery attempt cap from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, returns the default.
pub fn notify_max_attempts_from_env_value(value: Option<String>) -> CaseResult<u32> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_NOTIFY_MAX_ATTEMPTS),
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            CaseError::Validation(format!(
                "CCR_NOTIFY_MAX_ATTEMPTS must be a positive integer, got: '{}'",
                raw
            ))
        }),
    }
}

/// Parse the delivery backoff base delay from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, returns the default.
pub fn notify_base_delay_from_env_value(value: Option<String>) -> CaseResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(Duration::from_millis(DEFAULT_NOTIFY_BASE_DELAY_MS)),
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| {
                CaseError::Validation(format!(
                    "CCR_NOTIFY_BASE_DELAY_MS must be a number of milliseconds, got: '{}'",
                    raw
                ))
            }),
    }
}

/// Normalise the ingest key from an optional environment value.
///
/// Empty/whitespace values count as unset, which disables the ingest check.
pub fn ingest_api_key_from_env_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
