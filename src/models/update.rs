// Outcome of comparing a local image digest with the registry's.

use serde::{Deserialize, Serialize};

/// Error reported when the registry could not be consulted.
pub const REGISTRY_UNAVAILABLE: &str = "Could not check for updates";

/// Error reported when the local image was never pulled from a registry.
pub const NO_LOCAL_DIGEST: &str = "no local digest";

/// Reported for `name@digest` references, whose content cannot change.
pub const PINNED_BY_DIGEST: &str = "image pinned by digest";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheckResult {
    pub update_available: bool,
    pub current_digest: Option<String>,
    pub latest_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateCheckResult {
    /// Digests are opaque: an update exists only when both are known and differ.
    pub fn compare(current: Option<String>, latest: Option<String>) -> Self {
        let update_available = matches!((&current, &latest), (Some(c), Some(l)) if c != l);
        Self {
            update_available,
            current_digest: current,
            latest_digest: latest,
            error: None,
        }
    }

    pub fn failed(current: Option<String>, error: impl Into<String>) -> Self {
        Self {
            update_available: false,
            current_digest: current,
            latest_digest: None,
            error: Some(error.into()),
        }
    }
}
