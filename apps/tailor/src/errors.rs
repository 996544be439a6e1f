use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::generation::generator::RunState;
use crate::llm_client::LlmError;
use crate::render::AssemblyError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    /// Generated text that did not fit the document schema. `raw` is the only
    /// evidence of what the generator produced, so it travels with the error.
    #[error("Could not parse {context}: {message}")]
    DocumentParse {
        context: &'static str,
        message: String,
        raw: String,
    },

    #[error("Assembly failed: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("{stage} timed out after {}s", after.as_secs())]
    Timeout { stage: &'static str, after: Duration },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Raw generator output, when the error carries one.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            AppError::DocumentParse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::Embedding(_) => (StatusCode::BAD_GATEWAY, "EMBEDDING_FAILURE"),
            AppError::Generation(_) => (StatusCode::BAD_GATEWAY, "GENERATION_FAILURE"),
            AppError::DocumentParse { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "DOCUMENT_PARSE_FAILURE")
            }
            AppError::Assembly(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ASSEMBLY_FAILURE"),
            AppError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Builds the `{"code", "message", "raw_output"?}` error object.
    fn error_body(&self) -> serde_json::Value {
        let (_, code) = self.status_and_code();

        let message = match self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            other => other.to_string(),
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(raw) = self.raw_output() {
            error["raw_output"] = json!(raw);
        }
        error
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();
        (status, Json(json!({ "error": self.error_body() }))).into_response()
    }
}

/// A run that ended in `FAILED`, with the state it was in when the failing step started.
#[derive(Debug, Error)]
#[error("tailoring failed while in {stage}: {error}")]
pub struct RunFailure {
    pub stage: RunState,
    #[source]
    pub error: AppError,
}

impl IntoResponse for RunFailure {
    fn into_response(self) -> Response {
        let (status, _) = self.error.status_and_code();
        let mut error = self.error.error_body();
        error["stage"] = json!(self.stage.to_string());
        (status, Json(json!({ "error": error }))).into_response()
    }
}
