//! Axum route handlers for the keyword API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipeline::artifact::RunRecord;
use crate::pipeline::parser::Item;
use crate::pipeline::RunStatus;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateKeywordsRequest {
    pub role: String,
    pub num_keywords: Option<u32>,
    #[serde(default)]
    pub include_intermediates: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerateKeywordsResponse {
    pub run_id: Uuid,
    pub status: String,
    pub plan: Vec<Item>,
    pub artifact_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intermediates: Option<RunRecord>,
}

/// POST /api/v1/keywords
///
/// Runs the full pipeline for one role and returns the persisted plan.
pub async fn handle_generate_keywords(
    State(state): State<AppState>,
    Json(request): Json<GenerateKeywordsRequest>,
) -> Result<Json<GenerateKeywordsResponse>, AppError> {
    if request.role.trim().is_empty() {
        return Err(AppError::Validation("role cannot be empty".to_string()));
    }
    if request.num_keywords == Some(0) {
        return Err(AppError::Validation(
            "num_keywords must be at least 1".to_string(),
        ));
    }

    let num_keywords = request
        .num_keywords
        .unwrap_or(state.default_num_keywords);
    let outcome = state.pipeline.run(&request.role, num_keywords).await?;

    Ok(Json(GenerateKeywordsResponse {
        run_id: outcome.run_id,
        status: RunStatus::Success.to_string(),
        plan: outcome.plan.plan,
        artifact_path: outcome.artifact_path.display().to_string(),
        intermediates: request.include_intermediates.then_some(outcome.intermediates),
    }))
}
