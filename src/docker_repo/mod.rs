// Container runtime access via bollard

pub mod logs;
pub mod stats;

use crate::config::DockerConfig;
use crate::error::RuntimeError;
use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::{
    InspectContainerOptions, ListContainersOptions, LogsOptions, RestartContainerOptions,
    StartContainerOptions, StatsOptions, StopContainerOptions,
};
use bollard::container::LogOutput;
use bollard::models::{
    ContainerInspectResponse, ContainerStatsResponse, ContainerSummary, ImageInspect, SystemInfo,
};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tracing::instrument;

use logs::StreamKind;

/// Everything this service needs from a container runtime. The handle is created
/// once at start-up and shared read-only by every request.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// All containers, running and stopped, in the runtime's listing order.
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError>;
    async fn inspect_container(&self, id: &str) -> Result<ContainerInspectResponse, RuntimeError>;
    async fn inspect_image(&self, image: &str) -> Result<ImageInspect, RuntimeError>;
    /// A single non-streaming stats response (current and previous CPU sample).
    async fn stats_once(&self, id: &str) -> Result<ContainerStatsResponse, RuntimeError>;
    /// The last `tail` log entries of stdout and stderr as the raw multiplexed stream.
    async fn logs(&self, id: &str, tail: usize) -> Result<Bytes, RuntimeError>;
    async fn start(&self, id: &str) -> Result<(), RuntimeError>;
    async fn stop(&self, id: &str) -> Result<(), RuntimeError>;
    async fn restart(&self, id: &str) -> Result<(), RuntimeError>;
    async fn info(&self) -> Result<SystemInfo, RuntimeError>;
    async fn ping(&self) -> Result<(), RuntimeError>;
}

pub struct DockerRepo {
    docker: Docker,
}

impl DockerRepo {
    pub fn connect(config: &DockerConfig) -> anyhow::Result<Self> {
        let docker = match &config.socket_path {
            Some(path) => {
                Docker::connect_with_unix(path, config.timeout_secs, bollard::API_DEFAULT_VERSION)?
            }
            None => Docker::connect_with_unix_defaults()?
                .with_timeout(std::time::Duration::from_secs(config.timeout_secs)),
        };
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRepo {
    #[instrument(skip(self), fields(repo = "docker", operation = "list_containers"))]
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let options = ListContainersOptions {
            all: true,
            ..Default::default()
        };
        Ok(self.docker.list_containers(Some(options)).await?)
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "inspect_container"))]
    async fn inspect_container(&self, id: &str) -> Result<ContainerInspectResponse, RuntimeError> {
        Ok(self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await?)
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "inspect_image"))]
    async fn inspect_image(&self, image: &str) -> Result<ImageInspect, RuntimeError> {
        Ok(self.docker.inspect_image(image).await?)
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "stats_once"))]
    async fn stats_once(&self, id: &str) -> Result<ContainerStatsResponse, RuntimeError> {
        // one_shot stays off: it skips the pre-sample and leaves precpu_stats empty.
        let options = StatsOptions {
            stream: false,
            ..Default::default()
        };
        let mut stream = self.docker.stats(id, Some(options));
        match stream.next().await {
            Some(result) => Ok(result?),
            None => Err(RuntimeError::Transport(format!(
                "stats stream for {} ended without a sample",
                id
            ))),
        }
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "logs"))]
    async fn logs(&self, id: &str, tail: usize) -> Result<Bytes, RuntimeError> {
        let options = LogsOptions {
            stdout: true,
            stderr: true,
            timestamps: true,
            tail: tail.to_string(),
            ..Default::default()
        };
        // bollard already splits the stream into chunks; put the frame headers back
        // so every runtime feeds the same decoder. TTY output was never framed.
        let mut raw = BytesMut::new();
        let mut stream = self.docker.logs(id, Some(options));
        while let Some(chunk) = stream.next().await {
            match chunk? {
                LogOutput::StdIn { message } => {
                    logs::encode_frame(StreamKind::Stdin, &message, &mut raw)
                }
                LogOutput::StdOut { message } => {
                    logs::encode_frame(StreamKind::Stdout, &message, &mut raw)
                }
                LogOutput::StdErr { message } => {
                    logs::encode_frame(StreamKind::Stderr, &message, &mut raw)
                }
                LogOutput::Console { message } => raw.extend_from_slice(&message),
            }
        }
        Ok(raw.freeze())
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "start"))]
    async fn start(&self, id: &str) -> Result<(), RuntimeError> {
        Ok(self
            .docker
            .start_container(id, None::<StartContainerOptions>)
            .await?)
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "stop"))]
    async fn stop(&self, id: &str) -> Result<(), RuntimeError> {
        Ok(self
            .docker
            .stop_container(id, None::<StopContainerOptions>)
            .await?)
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "restart"))]
    async fn restart(&self, id: &str) -> Result<(), RuntimeError> {
        Ok(self
            .docker
            .restart_container(id, None::<RestartContainerOptions>)
            .await?)
    }

    async fn info(&self) -> Result<SystemInfo, RuntimeError> {
        Ok(self.docker.info().await?)
    }

    async fn ping(&self) -> Result<(), RuntimeError> {
        self.docker.ping().await?;
        Ok(())
    }
}
