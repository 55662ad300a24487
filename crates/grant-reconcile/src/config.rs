//! Controller configuration.

use serde::{Deserialize, Serialize};

/// Configuration for an [`IntegrationGrantController`](crate::IntegrationGrantController).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Re-query the remote system after create instead of echoing the input.
    ///
    /// Disable when the remote system does not guarantee read-after-write.
    pub read_after_create: bool,

    /// Treat a revoke against a missing integration as already done.
    pub tolerate_missing_on_delete: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            read_after_create: true,
            tolerate_missing_on_delete: true,
        }
    }
}
