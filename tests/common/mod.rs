// Shared test helpers: an in-memory container runtime and a local fake registry.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use bollard::models::{
    ContainerInspectResponse, ContainerStatsResponse, ContainerSummary, ImageInspect, SystemInfo,
};
use bytes::Bytes;
use dockwatch::config::RegistryConfig;
use dockwatch::docker_repo::ContainerRuntime;
use dockwatch::error::RuntimeError;
use dockwatch::registry::MANIFEST_V2_MEDIA_TYPE;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct FakeRuntime {
    pub containers: Vec<ContainerSummary>,
    pub list_error: Option<RuntimeError>,
    pub inspect_failures: HashSet<String>,
    pub inspect_delays: HashMap<String, Duration>,
    /// image reference -> RepoDigests
    pub repo_digests: HashMap<String, Vec<String>>,
    pub running: Mutex<HashSet<String>>,
    pub stats: Option<ContainerStatsResponse>,
    pub raw_logs: Bytes,
    pub last_tail: Mutex<Option<usize>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeRuntime {
    pub fn with_containers(containers: &[(&str, &str)]) -> Self {
        Self {
            containers: containers
                .iter()
                .map(|(id, image)| container(id, image))
                .collect(),
            ..Default::default()
        }
    }

    pub fn digest(mut self, image: &str, digest: &str) -> Self {
        let repo = image.split(':').next().unwrap_or(image);
        self.repo_digests
            .insert(image.to_string(), vec![format!("{}@{}", repo, digest)]);
        self
    }

    pub fn failing_inspect(mut self, id: &str) -> Self {
        self.inspect_failures.insert(id.to_string());
        self
    }

    pub fn with_running(self, id: &str) -> Self {
        self.running.lock().unwrap().insert(id.to_string());
        self
    }

    fn known(&self, id: &str) -> bool {
        self.containers.iter().any(|c| c.id.as_deref() == Some(id))
    }

    fn not_found(id: &str) -> RuntimeError {
        RuntimeError::from_status(404, format!("No such container: {}", id))
    }
}

pub fn container(id: &str, image: &str) -> ContainerSummary {
    ContainerSummary {
        id: Some(id.to_string()),
        names: Some(vec![format!("/{}-name", id)]),
        image: Some(image.to_string()),
        image_id: Some(format!("sha256:img-{}", id)),
        status: Some("Up 2 hours".to_string()),
        created: Some(1_700_000_000),
        ..Default::default()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        match &self.list_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.containers.clone()),
        }
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspectResponse, RuntimeError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.inspect_delays.get(id) {
            tokio::time::sleep(*delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.inspect_failures.contains(id) || !self.known(id) {
            return Err(Self::not_found(id));
        }
        Ok(ContainerInspectResponse {
            id: Some(id.to_string()),
            restart_count: Some(0),
            platform: Some("linux".to_string()),
            ..Default::default()
        })
    }

    async fn inspect_image(&self, image: &str) -> Result<ImageInspect, RuntimeError> {
        Ok(ImageInspect {
            repo_digests: self.repo_digests.get(image).cloned(),
            ..Default::default()
        })
    }

    async fn stats_once(&self, id: &str) -> Result<ContainerStatsResponse, RuntimeError> {
        if !self.known(id) {
            return Err(Self::not_found(id));
        }
        Ok(self.stats.clone().unwrap_or_default())
    }

    async fn logs(&self, id: &str, tail: usize) -> Result<Bytes, RuntimeError> {
        if !self.known(id) {
            return Err(Self::not_found(id));
        }
        *self.last_tail.lock().unwrap() = Some(tail);
        Ok(self.raw_logs.clone())
    }

    async fn start(&self, id: &str) -> Result<(), RuntimeError> {
        if !self.known(id) {
            return Err(Self::not_found(id));
        }
        if !self.running.lock().unwrap().insert(id.to_string()) {
            // The daemon answers 304 Not Modified with an empty body.
            return Err(RuntimeError::from_status(304, String::new()));
        }
        Ok(())
    }

    async fn stop(&self, id: &str) -> Result<(), RuntimeError> {
        if !self.known(id) {
            return Err(Self::not_found(id));
        }
        if !self.running.lock().unwrap().remove(id) {
            return Err(RuntimeError::from_status(
                409,
                format!("Container {} is not running", id),
            ));
        }
        Ok(())
    }

    async fn restart(&self, id: &str) -> Result<(), RuntimeError> {
        if !self.known(id) {
            return Err(Self::not_found(id));
        }
        self.running.lock().unwrap().insert(id.to_string());
        Ok(())
    }

    async fn info(&self) -> Result<SystemInfo, RuntimeError> {
        Ok(SystemInfo {
            name: Some("fake-host".to_string()),
            containers: Some(self.containers.len() as i64),
            ..Default::default()
        })
    }

    async fn ping(&self) -> Result<(), RuntimeError> {
        Ok(())
    }
}

/// Requests seen by the fake registry.
#[derive(Default)]
pub struct RegistryHits {
    pub token_requests: AtomicUsize,
    pub manifest_requests: AtomicUsize,
    pub scopes: Mutex<Vec<String>>,
}

#[derive(Clone)]
struct FakeRegistryState {
    /// "namespace/repo:tag" -> digest
    manifests: Arc<HashMap<String, String>>,
    /// repositories whose token request hangs
    slow_repos: Arc<Vec<String>>,
    hits: Arc<RegistryHits>,
}

pub struct FakeRegistry {
    pub config: RegistryConfig,
    pub hits: Arc<RegistryHits>,
}

/// Serve a minimal token + manifest API on 127.0.0.1. Token requests for any of
/// `slow_repos` never answer within the configured request timeout.
pub async fn spawn_registry(manifests: &[(&str, &str)], slow_repos: &[&str]) -> FakeRegistry {
    let hits = Arc::new(RegistryHits::default());
    let state = FakeRegistryState {
        manifests: Arc::new(
            manifests
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ),
        slow_repos: Arc::new(slow_repos.iter().map(|s| s.to_string()).collect()),
        hits: hits.clone(),
    };
    let app = Router::new()
        .route("/token", get(token_handler))
        .route(
            "/v2/{namespace}/{repository}/manifests/{tag}",
            get(manifest_handler),
        )
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let base = format!("http://{}", addr);
    FakeRegistry {
        config: RegistryConfig {
            auth_url: format!("{}/token", base),
            url: base,
            service: "registry.test".to_string(),
            request_timeout_ms: 300,
        },
        hits,
    }
}

async fn token_handler(
    State(state): State<FakeRegistryState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.hits.token_requests.fetch_add(1, Ordering::SeqCst);
    let scope = params.get("scope").cloned().unwrap_or_default();
    state.hits.scopes.lock().unwrap().push(scope.clone());
    if params.get("service").map(String::as_str) != Some("registry.test") {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({}))).into_response();
    }
    let repo = scope
        .strip_prefix("repository:")
        .and_then(|s| s.strip_suffix(":pull"))
        .unwrap_or_default()
        .to_string();
    if state.slow_repos.contains(&repo) {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    Json(serde_json::json!({ "token": format!("tok-{}", repo) })).into_response()
}

async fn manifest_handler(
    State(state): State<FakeRegistryState>,
    Path((namespace, repository, tag)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.hits.manifest_requests.fetch_add(1, Ordering::SeqCst);
    let repo = format!("{}/{}", namespace, repository);
    let expected_auth = format!("Bearer tok-{}", repo);
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if auth != Some(expected_auth.as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());
    if accept != Some(MANIFEST_V2_MEDIA_TYPE) {
        return StatusCode::NOT_ACCEPTABLE.into_response();
    }
    match state.manifests.get(&format!("{}:{}", repo, tag)) {
        Some(digest) => (
            StatusCode::OK,
            [("docker-content-digest", digest.clone())],
            "{}",
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
