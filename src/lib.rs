//! # Edumeet
//!
//! A learning-management REST backend: courses, enrollments, progress
//! tracking with capstone grading, and user notifications.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use edumeet::server::{AppState, create_router};
//! use edumeet::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/edumeet.db").unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store)));
//! let router = create_router(state);
//! // Serve with axum...
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod service;
pub mod store;
pub mod types;
