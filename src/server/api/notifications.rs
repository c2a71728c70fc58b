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
use crate::service::notifications::{self, NewNotification};

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let notifications = notifications::list_for_user(state.store.as_ref(), &user_id)
        .api_err("Notification not found", "Failed to fetch notifications")?;

    Ok::<_, ApiError>(Json(notifications))
}

pub async fn send_notification(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<NewNotification>,
) -> impl IntoResponse {
    let notification = notifications::send(state.store.as_ref(), req)
        .api_err("Notification not found", "Failed to send notification")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(notification)))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    notifications::mark_read(state.store.as_ref(), &id)
        .api_err("Notification not found", "Failed to update notification")?;

    Ok::<_, ApiError>(StatusCode::OK)
}
