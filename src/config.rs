use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DockerConfig {
    /// Unix socket of the daemon; bollard's defaults (DOCKER_HOST or /var/run/docker.sock) when unset.
    pub socket_path: Option<String>,
    #[serde(default = "default_docker_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            timeout_secs: default_docker_timeout_secs(),
        }
    }
}

fn default_docker_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Token endpoint for anonymous pull tokens.
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// Base URL of the registry's v2 API.
    #[serde(default = "default_registry_url")]
    pub url: String,
    /// `service` parameter sent with token requests.
    #[serde(default = "default_registry_service")]
    pub service: String,
    /// Applied to the token and the manifest request separately.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            auth_url: default_auth_url(),
            url: default_registry_url(),
            service: default_registry_service(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_auth_url() -> String {
    "https://auth.docker.io/token".into()
}

fn default_registry_url() -> String {
    "https://registry-1.docker.io".into()
}

fn default_registry_service() -> String {
    "registry.docker.io".into()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    /// Ceiling on containers enriched (inspect + update check) at the same time.
    #[serde(default = "default_max_concurrent_checks")]
    pub max_concurrent_checks: usize,
    /// Upper bound for enriching a single container.
    #[serde(default = "default_task_timeout_ms")]
    pub task_timeout_ms: u64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            max_concurrent_checks: default_max_concurrent_checks(),
            task_timeout_ms: default_task_timeout_ms(),
        }
    }
}

fn default_max_concurrent_checks() -> usize {
    5
}

fn default_task_timeout_ms() -> u64 {
    15_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_tail")]
    pub default_tail: usize,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            default_tail: default_tail(),
        }
    }
}

fn default_tail() -> usize {
    100
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        anyhow::ensure!(
            self.docker.timeout_secs > 0,
            "docker.timeout_secs must be > 0, got {}",
            self.docker.timeout_secs
        );
        anyhow::ensure!(
            self.docker
                .socket_path
                .as_ref()
                .is_none_or(|p| !p.is_empty()),
            "docker.socket_path must be non-empty when set"
        );
        anyhow::ensure!(
            self.registry.auth_url.starts_with("http://")
                || self.registry.auth_url.starts_with("https://"),
            "registry.auth_url must be an http(s) URL, got {:?}",
            self.registry.auth_url
        );
        anyhow::ensure!(
            self.registry.url.starts_with("http://") || self.registry.url.starts_with("https://"),
            "registry.url must be an http(s) URL, got {:?}",
            self.registry.url
        );
        anyhow::ensure!(
            !self.registry.service.is_empty(),
            "registry.service must be non-empty"
        );
        anyhow::ensure!(
            self.registry.request_timeout_ms > 0,
            "registry.request_timeout_ms must be > 0, got {}",
            self.registry.request_timeout_ms
        );
        anyhow::ensure!(
            self.inventory.max_concurrent_checks > 0,
            "inventory.max_concurrent_checks must be > 0, got {}",
            self.inventory.max_concurrent_checks
        );
        anyhow::ensure!(
            self.inventory.task_timeout_ms > 0,
            "inventory.task_timeout_ms must be > 0, got {}",
            self.inventory.task_timeout_ms
        );
        anyhow::ensure!(
            self.logs.default_tail > 0,
            "logs.default_tail must be > 0, got {}",
            self.logs.default_tail
        );
        Ok(())
    }
}
