// Container listing enriched with inspect details and an update check per container.

use crate::config::InventoryConfig;
use crate::docker_repo::ContainerRuntime;
use crate::error::RuntimeError;
use crate::models::{
    ContainerConfigView, ContainerState, ContainerSummary, NetworkSettingsView, UpdateCheckResult,
};
use crate::update_check::UpdateOracle;
use bollard::models::{ContainerInspectResponse, ContainerSummary as RuntimeContainer};
use futures_util::{StreamExt, stream};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{info, instrument, warn};

pub struct Inventory {
    runtime: Arc<dyn ContainerRuntime>,
    oracle: UpdateOracle,
    max_concurrent: usize,
    task_timeout: Duration,
}

impl Inventory {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        oracle: UpdateOracle,
        config: &InventoryConfig,
    ) -> Self {
        Self {
            runtime,
            oracle,
            max_concurrent: config.max_concurrent_checks.max(1),
            task_timeout: Duration::from_millis(config.task_timeout_ms),
        }
    }

    /// All containers in listing order. Only a failed listing fails the call; a
    /// container whose inspect or update check fails is still returned, with the
    /// reason in `update_info.error`.
    #[instrument(skip(self), fields(operation = "list_containers"))]
    pub async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let containers = self.runtime.list_containers().await?;
        let total = containers.len();

        // `buffered` runs up to max_concurrent futures and yields in input order.
        let entries: Vec<ContainerSummary> = stream::iter(containers)
            .map(|c| self.enrich(c))
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let failed = entries
            .iter()
            .filter(|e| e.update_info.error.is_some())
            .count();
        let updates = entries.iter().filter(|e| e.update_available).count();
        info!(
            containers = total,
            updates_available = updates,
            checks_failed = failed,
            "Container inventory collected"
        );
        Ok(entries)
    }

    async fn enrich(&self, container: RuntimeContainer) -> ContainerSummary {
        let mut entry = base_entry(&container);
        // One budget for the whole container; inspect detail survives a slow update check.
        let deadline = Instant::now() + self.task_timeout;

        let inspect = match timeout_at(deadline, self.runtime.inspect_container(&entry.id)).await {
            Ok(inspect) => inspect,
            Err(_) => {
                entry.update_info = self.timed_out(&entry.id, "inspect_container");
                return entry;
            }
        };
        let detail = match inspect {
            Ok(detail) => detail,
            Err(e) => {
                warn!(
                    container_id = %entry.id,
                    error = %e,
                    operation = "inspect_container",
                    "Failed to inspect container"
                );
                entry.update_info = UpdateCheckResult::failed(None, e.to_string());
                return entry;
            }
        };
        apply_inspect(&mut entry, detail);

        let update = match timeout_at(deadline, self.oracle.check(&entry.image)).await {
            Ok(update) => update,
            Err(_) => self.timed_out(&entry.id, "update_check"),
        };
        entry.update_available = update.update_available;
        entry.update_info = update;
        entry
    }

    fn timed_out(&self, id: &str, operation: &'static str) -> UpdateCheckResult {
        warn!(
            container_id = %id,
            operation,
            timeout_ms = self.task_timeout.as_millis() as u64,
            "Container enrichment timed out"
        );
        let reason = format!("timed out after {}ms", self.task_timeout.as_millis());
        UpdateCheckResult::failed(None, reason)
    }
}

/// Fields available from the listing alone.
fn base_entry(c: &RuntimeContainer) -> ContainerSummary {
    let id = c.id.clone().unwrap_or_default();
    let name = c
        .names
        .as_ref()
        .and_then(|n| n.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| id.clone());
    let state = c
        .state
        .as_ref()
        .and_then(as_json_str)
        .map_or(ContainerState::Unknown, |s| ContainerState::from_docker(&s));

    ContainerSummary {
        id,
        name,
        image: c.image.clone().unwrap_or_default(),
        image_id: c.image_id.clone().unwrap_or_default(),
        state,
        status: c.status.clone().unwrap_or_default(),
        created: c.created.unwrap_or(0),
        ports: to_json(&c.ports).unwrap_or_else(|| serde_json::Value::Array(Vec::new())),
        labels: c.labels.clone().unwrap_or_default(),
        update_available: false,
        update_info: UpdateCheckResult::default(),
        config: None,
        network_settings: None,
        mounts: None,
        restart_count: None,
        platform: None,
    }
}

fn apply_inspect(entry: &mut ContainerSummary, detail: ContainerInspectResponse) {
    entry.config = Some(match &detail.config {
        Some(config) => ContainerConfigView {
            env: config.env.clone(),
            cmd: config.cmd.clone(),
            volumes: config.volumes.as_ref().and_then(to_json),
        },
        None => ContainerConfigView::default(),
    });
    // Read through JSON so the view does not depend on which network fields the
    // daemon API version still reports.
    let settings = detail.network_settings.as_ref().and_then(to_json);
    entry.network_settings = Some(NetworkSettingsView {
        networks: settings
            .as_ref()
            .and_then(|s| s.get("Networks"))
            .filter(|v| !v.is_null())
            .cloned(),
        ip_address: settings
            .as_ref()
            .and_then(|s| s.get("IPAddress"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
    });
    entry.mounts = detail.mounts.as_ref().and_then(to_json);
    entry.restart_count = detail.restart_count;
    entry.platform = detail.platform;
}

fn to_json<T: Serialize>(value: &T) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok().filter(|v| !v.is_null())
}

fn as_json_str<T: Serialize>(value: &T) -> Option<String> {
    to_json(value).and_then(|v| v.as_str().map(str::to_string))
}
