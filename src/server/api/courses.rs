use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::extract::ApiJson;
use crate::server::response::{ApiError, ServiceResultExt};
use crate::service::courses::{self, NewCourse};
use crate::types::LiveSession;

pub async fn list_courses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let courses = courses::list_published(state.store.as_ref())
        .api_err("Course not found", "Failed to fetch courses")?;

    Ok::<_, ApiError>(Json(courses))
}

pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let course = courses::get(state.store.as_ref(), &id)
        .api_err("Course not found", "Internal server error")?;

    Ok::<_, ApiError>(Json(course))
}

pub async fn create_course(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<NewCourse>,
) -> impl IntoResponse {
    let course = courses::save(state.store.as_ref(), req)
        .api_err("Course not found", "Validation failed")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(course)))
}

pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    courses::delete(state.store.as_ref(), &id).api_err("Course not found", "Deletion failed")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_enrolled_students(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let students = courses::enrolled_students(state.store.as_ref(), &id)
        .api_err("Course not found", "Failed to fetch student data")?;

    Ok::<_, ApiError>(Json(students))
}

pub async fn schedule_live(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(session): ApiJson<LiveSession>,
) -> impl IntoResponse {
    let course = courses::schedule_live(state.store.as_ref(), &id, session)
        .api_err("Course not found", "Failed to schedule live session")?;

    Ok::<_, ApiError>(Json(course))
}
