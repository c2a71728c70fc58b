use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::dto::{GradeRequest, QuizResultRequest, SubmitCapstoneRequest};
use crate::server::extract::ApiJson;
use crate::server::response::{ApiError, ServiceResultExt};
use crate::service::progress::{self, ProgressPatch};

pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path((user_id, course_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let progress = progress::get_or_create(state.store.as_ref(), &user_id, &course_id)
        .api_err("Progress not found", "Progress fetch error")?;

    Ok::<_, ApiError>(Json(progress))
}

pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    ApiJson(patch): ApiJson<ProgressPatch>,
) -> impl IntoResponse {
    let progress = progress::update(state.store.as_ref(), patch)
        .api_err("Progress not found", "Update failed")?;

    Ok::<_, ApiError>(Json(progress))
}

pub async fn grade_capstone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<GradeRequest>,
) -> impl IntoResponse {
    let progress = progress::grade_capstone(state.store.as_ref(), &id, req.score, &req.feedback)
        .api_err("Progress not found", "Grading failed")?;

    Ok::<_, ApiError>(Json(progress))
}

pub async fn submit_capstone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SubmitCapstoneRequest>,
) -> impl IntoResponse {
    let progress = progress::submit_capstone(state.store.as_ref(), &id, &req.submission_text)
        .api_err("Progress not found", "Submission failed")?;

    Ok::<_, ApiError>(Json(progress))
}

pub async fn record_quiz_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<QuizResultRequest>,
) -> impl IntoResponse {
    let progress = progress::record_quiz_result(
        state.store.as_ref(),
        &id,
        &req.quiz_id,
        req.score,
        req.passed,
    )
    .api_err("Progress not found", "Failed to record quiz result")?;

    Ok::<_, ApiError>(Json(progress))
}

pub async fn complete_module(
    State(state): State<Arc<AppState>>,
    Path((id, module_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let progress = progress::complete_module(state.store.as_ref(), &id, &module_id)
        .api_err("Progress not found", "Update failed")?;

    Ok::<_, ApiError>(Json(progress))
}
