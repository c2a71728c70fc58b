use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use edumeet::server::{AppState, create_router};
use edumeet::store::{SqliteStore, Store};

const MAX_BODY: usize = 1024 * 1024;

/// An in-process router over a fresh on-disk database.
pub struct TestServer {
    pub temp_dir: TempDir,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestServer {
    pub fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join("edumeet.db")).expect("open store");
        store.initialize().expect("initialize store");

        let state = Arc::new(AppState::new(Arc::new(store)));

        Self {
            temp_dir,
            router: create_router(state),
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        self.send(request).await
    }

    /// Sends a prebuilt request; the response body is parsed as JSON.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), MAX_BODY)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Option<Value>) -> TestResponse {
        self.request(Method::PATCH, uri, body).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Creates a student and returns its id.
    pub async fn create_user(&self, email: &str) -> String {
        let resp = self
            .post(
                "/api/users",
                serde_json::json!({
                    "name": "Test Student",
                    "email": email,
                    "password": "hunter22",
                }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "create user: {}", resp.body);
        resp.body["id"].as_str().expect("user id").to_string()
    }
}
