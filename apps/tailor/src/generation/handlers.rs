//! Axum route handlers for the tailoring API.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::embedding::Embedder;
use crate::errors::{AppError, RunFailure};
use crate::generation::generator::{TailoredOutput, TailoringRequest, TailoringRun};
use crate::generation::similarity::{rank, ScoredCandidate};
use crate::models::document::TailoredDocument;
use crate::models::resume::BaseResume;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub job_description: String,
    pub candidates: Vec<String>,
    /// Keep only the best `limit` candidates. All of them when absent.
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RankResponse {
    pub ranked: Vec<ScoredCandidate<String>>,
}

#[derive(Debug, Deserialize)]
pub struct TailorRequest {
    pub base_resume: BaseResume,
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub base_resume: BaseResume,
    pub document: TailoredDocument,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/rank
///
/// Scores free-text candidates against a job description.
pub async fn handle_rank(
    State(state): State<AppState>,
    Json(request): Json<RankRequest>,
) -> Result<Json<RankResponse>, AppError> {
    let ranked = rank_candidates(request, state.embedder.as_ref()).await?;
    Ok(Json(RankResponse { ranked }))
}

/// POST /api/v1/resumes/tailor
///
/// Runs the full pipeline. Failures carry the state the run stopped in.
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(request): Json<TailorRequest>,
) -> Result<Json<TailoredOutput>, RunFailure> {
    let run = TailoringRun::new(state.embedder.as_ref(), state.llm.as_ref(), &state.settings);
    let output = run
        .execute(TailoringRequest {
            base: request.base_resume,
            job_description: request.job_description,
        })
        .await?;
    Ok(Json(output))
}

/// POST /api/v1/resumes/render
///
/// Assembles a tailored document into a PDF and returns its bytes.
pub async fn handle_render(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Response, AppError> {
    let workdir = tempfile::tempdir().map_err(anyhow::Error::from)?;
    let pdf_path = workdir.path().join("resume.pdf");

    state
        .assembler
        .assemble(&request.base_resume, &request.document, &pdf_path)
        .await?;
    let bytes = tokio::fs::read(&pdf_path)
        .await
        .map_err(anyhow::Error::from)?;

    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response())
}

async fn rank_candidates(
    request: RankRequest,
    embedder: &dyn Embedder,
) -> Result<Vec<ScoredCandidate<String>>, AppError> {
    let limit = request.limit.unwrap_or(request.candidates.len());
    let mut ranked = rank(&request.job_description, request.candidates, embedder).await?;
    ranked.truncate(limit);
    Ok(ranked)
}
