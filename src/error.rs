// Error categories for the container runtime and the image registry.

use thiserror::Error;

/// Failure talking to the container runtime. The runtime's own message is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("{0}")]
    NotFound(String),
    /// The runtime refused a state transition (e.g. starting a running container).
    #[error("{0}")]
    Conflict(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("docker unreachable: {0}")]
    Transport(String),
}

impl RuntimeError {
    /// Category name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::NotFound(_) => "not_found",
            RuntimeError::Conflict(_) => "conflict",
            RuntimeError::Rejected { .. } => "rejected",
            RuntimeError::Transport(_) => "transport",
        }
    }

    /// Map a Docker daemon status code and message onto a category.
    pub fn from_status(status: u16, message: String) -> Self {
        let message = if message.trim().is_empty() {
            match status {
                304 => "container already in requested state".to_string(),
                _ => format!("docker responded with status {}", status),
            }
        } else {
            message
        };
        match status {
            404 => RuntimeError::NotFound(message),
            304 | 409 => RuntimeError::Conflict(message),
            _ => RuntimeError::Rejected { status, message },
        }
    }
}

impl From<bollard::errors::Error> for RuntimeError {
    fn from(err: bollard::errors::Error) -> Self {
        match err {
            bollard::errors::Error::DockerResponseServerError {
                status_code,
                message,
            } => RuntimeError::from_status(status_code, message),
            other => RuntimeError::Transport(other.to_string()),
        }
    }
}

/// Failure of a single registry call. Never surfaced to API callers; the update
/// check downgrades it to "no update".
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{stage} request timed out")]
    Timeout { stage: &'static str },
    #[error("{stage} request returned status {status}")]
    Status { stage: &'static str, status: u16 },
    #[error("token response carried no token")]
    MissingToken,
    #[error("manifest response carried no Docker-Content-Digest header")]
    MissingDigest,
    #[error("{stage} request failed: {message}")]
    Transport { stage: &'static str, message: String },
}

impl RegistryError {
    pub(crate) fn from_reqwest(stage: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RegistryError::Timeout { stage }
        } else if let Some(status) = err.status() {
            RegistryError::Status {
                stage,
                status: status.as_u16(),
            }
        } else {
            RegistryError::Transport {
                stage,
                message: err.to_string(),
            }
        }
    }
}
