use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::corpus::CorpusError;
use crate::llm_client::LlmError;
use crate::pipeline::artifact::ArtifactError;
use crate::pipeline::parser::ParseError;
use crate::pipeline::stages::{Field, StageName};

/// Coarse failure class of a pipeline run. Tests and callers assert on this
/// instead of matching message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    RetrievalFailure,
    CompletionFailure,
    SchemaViolation,
    PersistenceFailure,
    Timeout,
}

/// Typed failure of a keyword run. Every variant still collapses to `ERROR`
/// on the two-outcome CLI surface.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Role must not be empty")]
    EmptyRole,

    #[error("Retrieval failed: {0}")]
    Retrieval(#[source] CorpusError),

    #[error("Completion failed in {stage} stage: {source}")]
    Completion {
        stage: StageName,
        #[source]
        source: LlmError,
    },

    #[error("{stage} stage timed out after {after:?}")]
    Timeout { stage: StageName, after: Duration },

    #[error("{stage} stage ran before `{field}` was produced")]
    MissingInput { stage: StageName, field: Field },

    #[error("Schema violation in final stage output: {0}")]
    SchemaViolation(#[from] ParseError),

    #[error("Failed to persist result: {0}")]
    Persistence(#[from] ArtifactError),
}

impl PipelineError {
    /// A deadline elapsing is `Timeout` whether the outer stage deadline or the
    /// HTTP client's per-attempt deadline caught it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Timeout { .. }
            | PipelineError::Completion {
                source: LlmError::Timeout(_),
                ..
            }
            | PipelineError::Retrieval(CorpusError::Synthesis(LlmError::Timeout(_))) => {
                ErrorKind::Timeout
            }
            PipelineError::EmptyRole => ErrorKind::InvalidInput,
            PipelineError::Retrieval(_) => ErrorKind::RetrievalFailure,
            PipelineError::Completion { .. } | PipelineError::MissingInput { .. } => {
                ErrorKind::CompletionFailure
            }
            PipelineError::SchemaViolation(_) => ErrorKind::SchemaViolation,
            PipelineError::Persistence(_) => ErrorKind::PersistenceFailure,
        }
    }

    /// The stage that failed, when the failure belongs to one.
    pub fn stage(&self) -> Option<StageName> {
        match self {
            PipelineError::EmptyRole => None,
            PipelineError::Retrieval(_) => Some(StageName::Retrieval),
            PipelineError::Completion { stage, .. }
            | PipelineError::Timeout { stage, .. }
            | PipelineError::MissingInput { stage, .. } => Some(*stage),
            PipelineError::SchemaViolation(_) => Some(StageName::Parse),
            PipelineError::Persistence(_) => Some(StageName::Persist),
        }
    }
}

/// Application-level error type for the HTTP surface.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, stage) = match &self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Pipeline(e) => {
                tracing::error!("Keyword run failed: {e}");
                let (status, code) = match e.kind() {
                    ErrorKind::InvalidInput => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                    ErrorKind::RetrievalFailure => (StatusCode::BAD_GATEWAY, "RETRIEVAL_ERROR"),
                    ErrorKind::CompletionFailure => (StatusCode::BAD_GATEWAY, "LLM_ERROR"),
                    ErrorKind::SchemaViolation => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "SCHEMA_VIOLATION")
                    }
                    ErrorKind::PersistenceFailure => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
                    }
                    ErrorKind::Timeout => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
                };
                (status, code, e.to_string(), e.stage())
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(stage) = stage {
            error["stage"] = json!(stage);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
