use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::{Error, Result as ServiceResult};

/// API error that converts to a `{"error": "..."}` JSON response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    /// Maps a service error onto a response. Internal failures are logged in
    /// full and reach the client only as `failure`.
    #[must_use]
    pub fn from_service(err: Error, not_found: &str, failure: &str) -> Self {
        match err {
            Error::NotFound => Self::not_found(not_found),
            Error::BadRequest(message) => Self::bad_request(message),
            Error::AlreadyExists => Self::bad_request(format!("{failure}: record already exists")),
            Error::Unauthorized => Self::unauthorized("Invalid email or password"),
            other => {
                tracing::error!("{failure}: {other}");
                Self::internal(failure)
            }
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::from_service(err, "Not found", "Internal server error")
    }
}

/// Malformed bodies and missing or mistyped fields are validation failures
/// (400); other rejections keep axum's status.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match &rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => rejection.status(),
        };
        Self {
            status,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Extension trait for converting service results to API errors.
pub trait ServiceResultExt<T> {
    fn api_err(self, not_found: &'static str, failure: &'static str) -> Result<T, ApiError>;
}

impl<T> ServiceResultExt<T> for ServiceResult<T> {
    fn api_err(self, not_found: &'static str, failure: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::from_service(e, not_found, failure))
    }
}
