use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use quill_agent::AgentError;
use quill_core::GenerationError;

/// Private sentinel error type used to carry an explicit HTTP 404 through
/// the `anyhow::Error` chain.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 404 Not Found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }
}

fn agent_status(err: &AgentError) -> StatusCode {
    match err {
        // The external tool is missing/unstartable: the service cannot
        // generate until the operator fixes the install.
        AgentError::Spawn { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AgentError::Exit { .. } | AgentError::Parse { .. } | AgentError::Upstream(_) => {
            StatusCode::BAD_GATEWAY
        }
        AgentError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(n) = self.0.downcast_ref::<NotFoundError>() {
            let body = serde_json::json!({ "error": n.0.clone() });
            return (StatusCode::NOT_FOUND, axum::Json(body)).into_response();
        }

        let status = if let Some(GenerationError::Agent(e)) =
            self.0.downcast_ref::<GenerationError>()
        {
            agent_status(e)
        } else if let Some(e) = self.0.downcast_ref::<AgentError>() {
            agent_status(e)
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
