// Image update detection: compare the local image's repo digest with the digest the
// registry currently serves for the same tag. No state is kept between checks.

use crate::docker_repo::ContainerRuntime;
use crate::error::{RegistryError, RuntimeError};
use crate::models::{
    NO_LOCAL_DIGEST, PINNED_BY_DIGEST, REGISTRY_UNAVAILABLE, UpdateCheckResult,
};
use crate::registry::{ImageRef, Registry};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct UpdateOracle {
    runtime: Arc<dyn ContainerRuntime>,
    registry: Arc<dyn Registry>,
}

impl UpdateOracle {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, registry: Arc<dyn Registry>) -> Self {
        Self { runtime, registry }
    }

    /// Check whether `image` (as reported for a container) has a newer upstream
    /// revision. Never fails: problems are reported in the result's `error`.
    pub async fn check(&self, image: &str) -> UpdateCheckResult {
        let reference = match ImageRef::parse(image) {
            Ok(r) => r,
            Err(e) => {
                debug!(image = %image, error = %e, "image reference not checkable");
                return UpdateCheckResult::failed(None, e.to_string());
            }
        };

        if let Some(pinned) = reference.pinned_digest() {
            debug!(image = %image, "image pinned by digest");
            return UpdateCheckResult::failed(Some(pinned.to_string()), PINNED_BY_DIGEST);
        }

        let current = match self.local_digest(image).await {
            Ok(Some(digest)) => digest,
            Ok(None) => return UpdateCheckResult::failed(None, NO_LOCAL_DIGEST),
            Err(e) => {
                warn!(image = %image, error = %e, "Failed to inspect local image");
                return UpdateCheckResult::failed(None, e.to_string());
            }
        };

        if let Some(host) = reference.registry_host() {
            return UpdateCheckResult::failed(
                Some(current),
                format!("unsupported registry {}", host),
            );
        }

        match self.latest_digest(&reference).await {
            Ok(latest) => {
                debug!(image = %image, current = %current, latest = %latest, "digests compared");
                UpdateCheckResult::compare(Some(current), Some(latest))
            }
            Err(e) => {
                warn!(image = %reference, error = %e, "Could not check for updates");
                UpdateCheckResult::failed(Some(current), REGISTRY_UNAVAILABLE)
            }
        }
    }

    async fn latest_digest(&self, reference: &ImageRef) -> Result<String, RegistryError> {
        let repository = reference.repository_path();
        let token = self.registry.pull_token(&repository).await?;
        self.registry
            .manifest_digest(&repository, reference.tag(), &token)
            .await
    }

    /// Digest part of the first RepoDigests entry (`name@sha256:...`).
    async fn local_digest(&self, image: &str) -> Result<Option<String>, RuntimeError> {
        let inspect = self.runtime.inspect_image(image).await?;
        Ok(inspect
            .repo_digests
            .as_ref()
            .and_then(|digests| digests.first())
            .and_then(|entry| entry.split_once('@'))
            .map(|(_, digest)| digest.to_string())
            .filter(|digest| !digest.is_empty()))
    }
}
