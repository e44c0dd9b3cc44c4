// Runtime errors rendered as JSON responses: {"error": <what failed>, "message": <runtime message>}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::RuntimeError;

#[derive(Debug)]
pub struct ApiError {
    context: String,
    source: RuntimeError,
}

impl ApiError {
    pub fn new(context: impl Into<String>, source: RuntimeError) -> Self {
        Self {
            context: context.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match &self.source {
            RuntimeError::NotFound(_) => StatusCode::NOT_FOUND,
            RuntimeError::Conflict(_) => StatusCode::CONFLICT,
            RuntimeError::Rejected { status, .. } if (400..500).contains(status) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
            }
            RuntimeError::Rejected { .. } | RuntimeError::Transport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.source, kind = self.source.kind(), "{}", self.context);
        }
        let body = serde_json::json!({
            "error": self.context,
            "message": self.source.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
