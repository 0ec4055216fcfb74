//! Route handlers (spec §6). Each is a thin adapter between the HTTP
//! layer and a module that does the actual work — orchestrator, local
//! scorer, language detection, mesh proxy.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;
use crate::lang::is_japanese;
use crate::orchestrator::SearchQuery;

use super::AppState;

pub async fn healthz(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "guidelines": state.ctx.guidelines.len(),
        "clinicalQuestions": state.ctx.clinical_questions.len(),
    }))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, AppError> {
    let response = crate::orchestrator::search(&state.ctx, query).await?;
    Ok(Json(response).into_response())
}

#[derive(Debug, Deserialize)]
pub struct MeshParams {
    q: Option<String>,
}

pub async fn mesh(State(state): State<Arc<AppState>>, Query(params): Query<MeshParams>) -> Result<Response, AppError> {
    let q = params.q.as_deref().map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        AppError::InvalidArgument("q is required".to_string())
    })?;
    let labels = state.ctx.mesh.lookup(q).await;
    Ok(Json(labels).into_response())
}

#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    q: Option<String>,
}

pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SuggestParams>,
) -> Result<Response, AppError> {
    let q = params.q.as_deref().filter(|s| !s.is_empty()).ok_or_else(|| {
        AppError::InvalidArgument("q is required".to_string())
    })?;
    let suggestions = crate::suggest::suggest(&state.suggest_corpus, q);
    Ok(Json(suggestions).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CqListParams {
    cat: Option<String>,
}

pub async fn cq_list(State(state): State<Arc<AppState>>, Query(params): Query<CqListParams>) -> Response {
    let response = crate::local_scorer::browse_clinical_questions(
        &state.ctx.guidelines,
        &state.ctx.clinical_questions,
        params.cat.as_deref(),
    );
    Json(response).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CqEvidenceParams {
    q: Option<String>,
    kw: Option<String>,
}

pub async fn cq_evidence(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CqEvidenceParams>,
) -> Result<Response, AppError> {
    let q = params.q.as_deref().map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        AppError::InvalidArgument("q is required".to_string())
    })?;
    let response = crate::cq_evidence::evidence_for(&state.ctx, q, params.kw.as_deref()).await?;
    Ok(Json(response).into_response())
}

#[derive(Debug, Deserialize)]
pub struct TranslateParams {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct TranslateResponse {
    text: String,
    src: &'static str,
    tgt: &'static str,
}

pub async fn translate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TranslateParams>,
) -> Result<Response, AppError> {
    let text = params.text.as_deref().map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        AppError::InvalidArgument("text is required".to_string())
    })?;
    let (src, tgt) = if is_japanese(text) { ("ja", "en") } else { ("en", "ja") };
    let translated = state.ctx.translator.translate(text, src, tgt).await;
    Ok(Json(TranslateResponse {
        text: translated.unwrap_or_else(|| text.to_string()),
        src,
        tgt,
    })
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct AiParseBody {
    #[allow(dead_code)]
    query: String,
    #[allow(dead_code)]
    #[serde(rename = "apiKey")]
    api_key: String,
}

pub async fn ai_parse(Json(_body): Json<AiParseBody>) -> Result<Response, AppError> {
    Err(AppError::NotImplemented(
        "POST /api/ai/parse is an out-of-core generative-model proxy contract: body {query, apiKey} -> structured JSON".to_string(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct AiSummaryBody {
    #[allow(dead_code)]
    results: serde_json::Value,
    #[allow(dead_code)]
    query: String,
    #[allow(dead_code)]
    #[serde(rename = "apiKey")]
    api_key: String,
}

pub async fn ai_summary(Json(_body): Json<AiSummaryBody>) -> Result<Response, AppError> {
    Err(AppError::NotImplemented(
        "POST /api/ai/summary is an out-of-core generative-model proxy contract: body {results, query, apiKey} -> {summary}".to_string(),
    ))
}

pub async fn not_found() -> Response {
    AppError::NotFound.into_response()
}
