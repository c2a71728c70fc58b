use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::dto::{EnrollRequest, LoginRequest, SuspensionRequest};
use crate::server::extract::ApiJson;
use crate::server::response::{ApiError, ServiceResultExt};
use crate::service::enrollment;
use crate::service::users::{self, NewUser};

pub async fn list_users(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let users =
        users::list(state.store.as_ref()).api_err("User not found", "Failed to fetch users")?;

    Ok::<_, ApiError>(Json(users))
}

/// Runs password hashing work off the async workers.
async fn blocking<T, F>(f: F, failure: &'static str) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!("{failure}: {e}");
        ApiError::internal(failure)
    })?
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<NewUser>,
) -> impl IntoResponse {
    let store = Arc::clone(&state.store);
    let user = blocking(
        move || {
            users::create(store.as_ref(), req).api_err("User not found", "Failed to create user")
        },
        "Failed to create user",
    )
    .await?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> impl IntoResponse {
    let store = Arc::clone(&state.store);
    let user = blocking(
        move || {
            users::login(store.as_ref(), &req.email, &req.password)
                .api_err("User not found", "Login failed")
        },
        "Login failed",
    )
    .await?;

    Ok::<_, ApiError>(Json(user))
}

pub async fn enroll(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    ApiJson(req): ApiJson<EnrollRequest>,
) -> impl IntoResponse {
    let user = enrollment::enroll(state.store.as_ref(), &user_id, &req.course_id)
        .api_err("User not found", "Enrollment failed")?;

    Ok::<_, ApiError>(Json(user))
}

pub async fn set_suspension(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    ApiJson(req): ApiJson<SuspensionRequest>,
) -> impl IntoResponse {
    let user = users::set_suspended(state.store.as_ref(), &user_id, req.is_suspended)
        .api_err("User not found", "Suspension update failed")?;

    Ok::<_, ApiError>(Json(user))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    users::delete(state.store.as_ref(), &user_id)
        .api_err("User not found", "User deletion failed")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
