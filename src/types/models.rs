use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CapstoneKind, CapstoneStatus, NotificationKind, Role};

/// Generates a fresh record identifier.
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Returns true if `id` has the shape of a generated record identifier.
#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub role: Role,
    /// Course ids in enrollment order.
    pub enrolled_course_ids: Vec<String>,
    pub is_suspended: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn is_enrolled_in(&self, course_id: &str) -> bool {
        self.enrolled_course_ids.iter().any(|id| id == course_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseModule {
    pub id: String,
    pub title: String,
    pub order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capstone {
    pub instructions: String,
    #[serde(rename = "type")]
    pub kind: CapstoneKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSession {
    pub topic: String,
    pub date: DateTime<Utc>,
    pub meeting_link: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tutor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tutor_name: Option<String>,
    pub modules: Vec<CourseModule>,
    pub quizzes: Vec<Quiz>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capstone: Option<Capstone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_session: Option<LiveSession>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub quiz_id: String,
    pub score: f64,
    pub passed: bool,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub quiz_id: String,
    pub count: u32,
}

/// One user's advancement through one course. Unique per (user, course).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub completed_module_ids: Vec<String>,
    pub quiz_results: Vec<QuizResult>,
    pub quiz_attempts: Vec<QuizAttempt>,
    pub capstone_status: CapstoneStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capstone_submission_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capstone_grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capstone_feedback: Option<String>,
}

impl Progress {
    /// A fresh record: nothing completed, capstone pending.
    #[must_use]
    pub fn new(user_id: &str, course_id: &str) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            completed_module_ids: Vec::new(),
            quiz_results: Vec::new(),
            quiz_attempts: Vec::new(),
            capstone_status: CapstoneStatus::Pending,
            capstone_submission_text: None,
            capstone_grade: None,
            capstone_feedback: None,
        }
    }

    /// Adds a module to the completed set. Returns false if it was already there.
    pub fn complete_module(&mut self, module_id: &str) -> bool {
        if self.completed_module_ids.iter().any(|id| id == module_id) {
            return false;
        }
        self.completed_module_ids.push(module_id.to_string());
        true
    }

    /// Appends a quiz result and bumps the attempt counter for that quiz.
    pub fn record_quiz_result(&mut self, result: QuizResult) {
        match self
            .quiz_attempts
            .iter_mut()
            .find(|a| a.quiz_id == result.quiz_id)
        {
            Some(attempt) => attempt.count = attempt.count.saturating_add(1),
            None => self.quiz_attempts.push(QuizAttempt {
                quiz_id: result.quiz_id.clone(),
                count: 1,
            }),
        }
        self.quiz_results.push(result);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
    pub date: DateTime<Utc>,
}

/// A progress row for a course together with the user it belongs to.
/// `user` is `None` when the user record no longer exists.
#[derive(Debug, Clone, Serialize)]
pub struct EnrolledStudent {
    pub user: Option<User>,
    pub progress: Progress,
}
