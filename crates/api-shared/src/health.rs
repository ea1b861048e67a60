use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of the liveness endpoint, for load-balancer checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    /// Always `"ok"` when the process answers at all.
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Simple health service usable by any API binding.
///
/// This service provides a standardised way to report the health status of
/// the CCR system.
#[derive(Clone)]
pub struct HealthService;

impl HealthService {
    /// Creates a new instance of HealthService.
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            status: "ok".into(),
            service: "ccr".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}
