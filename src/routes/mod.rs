// HTTP routes

mod docker;
mod error;
mod http;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::docker_repo::ContainerRuntime;
use crate::inventory::Inventory;
use crate::lifecycle::Lifecycle;
use crate::registry::Registry;
use crate::update_check::UpdateOracle;

pub use error::ApiError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) runtime: Arc<dyn ContainerRuntime>,
    pub(crate) inventory: Arc<Inventory>,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) config: AppConfig,
}

pub fn app(
    runtime: Arc<dyn ContainerRuntime>,
    registry: Arc<dyn Registry>,
    config: AppConfig,
) -> Router {
    let oracle = UpdateOracle::new(runtime.clone(), registry);
    let state = AppState {
        inventory: Arc::new(Inventory::new(runtime.clone(), oracle, &config.inventory)),
        lifecycle: Lifecycle::new(runtime.clone()),
        runtime,
        config,
    };
    Router::new()
        .route("/", get(|| async { "dockwatch: container monitor" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/health", get(http::health_handler)) // GET /api/health
        .nest("/api/docker", docker_routes())
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

fn docker_routes() -> Router<AppState> {
    Router::new()
        .route("/containers", get(docker::list_containers))
        .route("/containers/{id}/logs", get(docker::container_logs))
        .route("/containers/{id}/stats", get(docker::container_stats))
        .route("/containers/{id}/start", post(docker::start_container))
        .route("/containers/{id}/stop", post(docker::stop_container))
        .route("/containers/{id}/restart", post(docker::restart_container))
        .route("/info", get(docker::daemon_info))
}
