// Start/stop/restart pass-through. Runtime rejections reach the caller unchanged.

use crate::docker_repo::ContainerRuntime;
use crate::error::RuntimeError;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Start,
    Stop,
    Restart,
}

impl LifecycleAction {
    /// Past tense, for confirmation messages ("Container started").
    pub fn past_tense(self) -> &'static str {
        match self {
            LifecycleAction::Start => "started",
            LifecycleAction::Stop => "stopped",
            LifecycleAction::Restart => "restarted",
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleAction::Start => "start",
            LifecycleAction::Stop => "stop",
            LifecycleAction::Restart => "restart",
        })
    }
}

#[derive(Clone)]
pub struct Lifecycle {
    runtime: Arc<dyn ContainerRuntime>,
}

impl Lifecycle {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    pub async fn start(&self, id: &str) -> Result<(), RuntimeError> {
        self.apply(LifecycleAction::Start, id).await
    }

    pub async fn stop(&self, id: &str) -> Result<(), RuntimeError> {
        self.apply(LifecycleAction::Stop, id).await
    }

    pub async fn restart(&self, id: &str) -> Result<(), RuntimeError> {
        self.apply(LifecycleAction::Restart, id).await
    }

    pub async fn apply(&self, action: LifecycleAction, id: &str) -> Result<(), RuntimeError> {
        let result = match action {
            LifecycleAction::Start => self.runtime.start(id).await,
            LifecycleAction::Stop => self.runtime.stop(id).await,
            LifecycleAction::Restart => self.runtime.restart(id).await,
        };
        match &result {
            Ok(()) => info!(container_id = %id, action = %action, "Container {}", action.past_tense()),
            Err(e) => warn!(
                container_id = %id,
                action = %action,
                kind = e.kind(),
                error = %e,
                "Container lifecycle command rejected"
            ),
        }
        result
    }
}
