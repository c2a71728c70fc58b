//! Workflows over the record store.
//!
//! Every function takes the store by reference and maps its outcome onto
//! `crate::error::Error`. Multi-step workflows are not atomic: each step is
//! durably applied before the next runs, and a failure part-way through is
//! logged and returned without undoing earlier steps.

pub mod courses;
pub mod enrollment;
pub mod notifications;
pub mod progress;
pub mod users;
pub mod validation;
