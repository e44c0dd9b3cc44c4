// /api/docker handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use bollard::models::SystemInfo;
use serde::Deserialize;

use super::{ApiError, AppState};
use crate::docker_repo::{logs, stats};
use crate::lifecycle::LifecycleAction;
use crate::models::{ContainerSummary, DerivedStats};

#[derive(Debug, Deserialize)]
pub(super) struct LogsQuery {
    /// Kept as text so values like `all` fall back to the default instead of a 400.
    tail: Option<String>,
}

/// GET /api/docker/containers
pub(super) async fn list_containers(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContainerSummary>>, ApiError> {
    state
        .inventory
        .list_containers()
        .await
        .map(Json)
        .map_err(|e| ApiError::new("Failed to fetch containers", e))
}

/// GET /api/docker/containers/{id}/logs?tail=N
pub(super) async fn container_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tail = query
        .tail
        .and_then(|t| t.trim().parse::<usize>().ok())
        .filter(|t| *t > 0)
        .unwrap_or(state.config.logs.default_tail);
    let text = logs::container_logs(state.runtime.as_ref(), &id, tail)
        .await
        .map_err(|e| ApiError::new("Failed to fetch logs", e))?;
    Ok(Json(serde_json::json!({ "logs": text })))
}

/// GET /api/docker/containers/{id}/stats
pub(super) async fn container_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DerivedStats>, ApiError> {
    stats::container_stats(state.runtime.as_ref(), &id)
        .await
        .map(Json)
        .map_err(|e| ApiError::new("Failed to fetch stats", e))
}

pub(super) async fn start_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    lifecycle(state, LifecycleAction::Start, id).await
}

pub(super) async fn stop_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    lifecycle(state, LifecycleAction::Stop, id).await
}

pub(super) async fn restart_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    lifecycle(state, LifecycleAction::Restart, id).await
}

async fn lifecycle(
    state: AppState,
    action: LifecycleAction,
    id: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .lifecycle
        .apply(action, &id)
        .await
        .map_err(|e| ApiError::new(format!("Failed to {} container", action), e))?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("Container {}", action.past_tense()),
    })))
}

/// GET /api/docker/info: daemon info, passed through.
pub(super) async fn daemon_info(
    State(state): State<AppState>,
) -> Result<Json<SystemInfo>, ApiError> {
    state
        .runtime
        .info()
        .await
        .map(Json)
        .map_err(|e| ApiError::new("Failed to fetch Docker info", e))
}
