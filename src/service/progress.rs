//! Progress records and capstone grading.

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use super::validation::{require, validate_amount};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{CapstoneStatus, Progress, QuizAttempt, QuizResult};

/// Partial replacement for a progress record. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPatch {
    #[serde(alias = "_id")]
    pub id: String,
    pub completed_module_ids: Option<Vec<String>>,
    pub quiz_results: Option<Vec<QuizResult>>,
    pub quiz_attempts: Option<Vec<QuizAttempt>>,
    pub capstone_status: Option<CapstoneStatus>,
    pub capstone_submission_text: Option<String>,
    pub capstone_grade: Option<f64>,
    pub capstone_feedback: Option<String>,
}

impl ProgressPatch {
    fn apply(&self, progress: &mut Progress) {
        if let Some(ids) = &self.completed_module_ids {
            progress.completed_module_ids.clear();
            for id in ids {
                progress.complete_module(id);
            }
        }
        if let Some(results) = &self.quiz_results {
            progress.quiz_results.clone_from(results);
        }
        if let Some(attempts) = &self.quiz_attempts {
            progress.quiz_attempts.clone_from(attempts);
        }
        if let Some(status) = self.capstone_status {
            progress.capstone_status = status;
        }
        if let Some(text) = &self.capstone_submission_text {
            progress.capstone_submission_text = Some(text.clone());
        }
        if let Some(grade) = self.capstone_grade {
            progress.capstone_grade = Some(grade);
        }
        if let Some(feedback) = &self.capstone_feedback {
            progress.capstone_feedback = Some(feedback.clone());
        }
    }
}

/// Returns the progress record for (user, course), creating a default one if
/// none exists yet.
///
/// Creation goes through the store's compare-and-create primitive, so two
/// racing callers end up with the same record.
pub fn get_or_create(store: &dyn Store, user_id: &str, course_id: &str) -> Result<Progress> {
    if let Some(progress) = store.find_progress(user_id, course_id)? {
        return Ok(progress);
    }

    let fresh = Progress::new(user_id, course_id);
    if store.insert_progress_if_absent(&fresh)? {
        info!(user_id, course_id, progress_id = %fresh.id, "Created progress record");
        return Ok(fresh);
    }

    debug!(user_id, course_id, "Progress created concurrently, re-reading");
    store
        .find_progress(user_id, course_id)?
        .ok_or(Error::NotFound)
}

pub fn get(store: &dyn Store, id: &str) -> Result<Progress> {
    store.get_progress(id)?.ok_or(Error::NotFound)
}

/// Merges the fields present in `patch` into the record it names.
/// Owner and course references are never rewritten.
pub fn update(store: &dyn Store, patch: ProgressPatch) -> Result<Progress> {
    require("id", &patch.id)?;
    if let Some(grade) = patch.capstone_grade {
        validate_amount("capstoneGrade", grade)?;
    }

    store.modify_progress(&patch.id, &mut |progress| {
        patch.apply(progress);
        Ok(true)
    })
}

/// Records a grade and feedback and marks the capstone graded.
///
/// The prior status is not checked: a grader may grade work that was never
/// submitted.
pub fn grade_capstone(store: &dyn Store, id: &str, score: f64, feedback: &str) -> Result<Progress> {
    validate_amount("score", score)?;

    store.grade_capstone(id, score, feedback)?;
    info!(progress_id = id, score, "Capstone graded");
    get(store, id)
}

/// Stores the learner's submission and moves the capstone to `submitted`.
pub fn submit_capstone(store: &dyn Store, id: &str, text: &str) -> Result<Progress> {
    require("submission", text)?;

    store.modify_progress(id, &mut |progress| {
        if progress.capstone_status == CapstoneStatus::Graded {
            return Err(Error::BadRequest(
                "capstone has already been graded".to_string(),
            ));
        }
        progress.capstone_status = CapstoneStatus::Submitted;
        progress.capstone_submission_text = Some(text.to_string());
        Ok(true)
    })
}

pub fn record_quiz_result(
    store: &dyn Store,
    id: &str,
    quiz_id: &str,
    score: f64,
    passed: bool,
) -> Result<Progress> {
    require("quizId", quiz_id)?;
    validate_amount("score", score)?;

    store.modify_progress(id, &mut |progress| {
        progress.record_quiz_result(QuizResult {
            quiz_id: quiz_id.to_string(),
            score,
            passed,
            attempted_at: Utc::now(),
        });
        Ok(true)
    })
}

pub fn complete_module(store: &dyn Store, id: &str, module_id: &str) -> Result<Progress> {
    require("moduleId", module_id)?;

    store.modify_progress(id, &mut |progress| Ok(progress.complete_module(module_id)))
}
