mod courses;
mod notifications;
mod progress;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::server::AppState;

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Courses
        .route("/courses", get(courses::list_courses))
        .route("/courses", post(courses::create_course))
        .route("/courses/{id}", get(courses::get_course))
        .route("/courses/{id}", delete(courses::delete_course))
        .route("/courses/{id}/students", get(courses::list_enrolled_students))
        .route("/courses/{id}/live", post(courses::schedule_live))
        // Users
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/auth/login", post(users::login))
        .route("/users/{user_id}", delete(users::delete_user))
        .route("/users/{user_id}/enroll", post(users::enroll))
        .route("/users/{user_id}/suspension", patch(users::set_suspension))
        // Progress
        .route("/progress", put(progress::update_progress))
        // Sibling routes must share a parameter name; here `{id}` is the user id.
        .route("/progress/{id}/{course_id}", get(progress::get_progress))
        .route("/progress/{id}/grade", post(progress::grade_capstone))
        .route("/progress/{id}/capstone", post(progress::submit_capstone))
        .route("/progress/{id}/quiz-results", post(progress::record_quiz_result))
        .route(
            "/progress/{id}/modules/{module_id}",
            post(progress::complete_module),
        )
        // Notifications
        .route("/notifications", post(notifications::send_notification))
        // `{id}` is the user id for listing, the notification id for mark-read.
        .route("/notifications/{id}", get(notifications::list_notifications))
        .route("/notifications/{id}/read", patch(notifications::mark_read))
}
