use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::validation::{require, validate_amount};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{
    Capstone, Course, CourseModule, EnrolledStudent, LiveSession, Question, Quiz, new_id,
};

/// Ids with this prefix are caller-chosen: saving such a course updates the
/// record with that id (or creates it) instead of inserting a new one.
pub const SEED_ID_PREFIX: &str = "c_";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModule {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub lesson_content: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuiz {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Course fields as posted. Every field is optional so a re-posted seed
/// course only overwrites what the request carries; a new course still
/// needs a title.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub price: Option<f64>,
    pub tutor_id: Option<String>,
    pub tutor_name: Option<String>,
    pub modules: Option<Vec<NewModule>>,
    pub quizzes: Option<Vec<NewQuiz>>,
    pub capstone: Option<Capstone>,
    pub live_session: Option<LiveSession>,
    pub published: Option<bool>,
}

fn validate_quiz(quiz: &NewQuiz) -> Result<()> {
    require("quiz title", &quiz.title)?;
    for question in &quiz.questions {
        if question.correct_index >= question.options.len() {
            return Err(Error::BadRequest(format!(
                "question '{}' has no option at index {}",
                question.text, question.correct_index
            )));
        }
    }
    Ok(())
}

fn validate(req: &NewCourse) -> Result<()> {
    if let Some(title) = &req.title {
        require("title", title)?;
    }
    if let Some(price) = req.price {
        validate_amount("price", price)?;
    }
    for module in req.modules.iter().flatten() {
        require("module title", &module.title)?;
    }
    for quiz in req.quizzes.iter().flatten() {
        validate_quiz(quiz)?;
    }
    Ok(())
}

fn build_modules(modules: &[NewModule]) -> Vec<CourseModule> {
    modules
        .iter()
        .enumerate()
        .map(|(idx, m)| CourseModule {
            id: m.id.clone().unwrap_or_else(new_id),
            title: m.title.clone(),
            order: m.order.unwrap_or(idx as i32 + 1),
            video_url: m.video_url.clone(),
            lesson_content: m.lesson_content.clone(),
            transcript: m.transcript.clone(),
        })
        .collect()
}

fn build_quizzes(quizzes: &[NewQuiz]) -> Vec<Quiz> {
    quizzes
        .iter()
        .map(|q| Quiz {
            id: q.id.clone().unwrap_or_else(new_id),
            title: q.title.clone(),
            questions: q.questions.clone(),
        })
        .collect()
}

fn build_course(req: &NewCourse, id: String) -> Result<Course> {
    let title = req.title.as_deref().unwrap_or_default();
    require("title", title)?;

    Ok(Course {
        id,
        title: title.trim().to_string(),
        description: req.description.clone(),
        thumbnail_url: req.thumbnail_url.clone(),
        price: req.price.unwrap_or_default(),
        tutor_id: req.tutor_id.clone(),
        tutor_name: req.tutor_name.clone(),
        modules: build_modules(req.modules.as_deref().unwrap_or_default()),
        quizzes: build_quizzes(req.quizzes.as_deref().unwrap_or_default()),
        capstone: req.capstone.clone(),
        live_session: req.live_session.clone(),
        published: req.published.unwrap_or_default(),
        created_at: Utc::now(),
    })
}

/// Overwrites the fields `req` carries and keeps the rest of `course`.
fn merge_course(mut course: Course, req: &NewCourse) -> Course {
    if let Some(title) = &req.title {
        course.title = title.trim().to_string();
    }
    if let Some(description) = &req.description {
        course.description = Some(description.clone());
    }
    if let Some(url) = &req.thumbnail_url {
        course.thumbnail_url = Some(url.clone());
    }
    if let Some(price) = req.price {
        course.price = price;
    }
    if let Some(tutor_id) = &req.tutor_id {
        course.tutor_id = Some(tutor_id.clone());
    }
    if let Some(tutor_name) = &req.tutor_name {
        course.tutor_name = Some(tutor_name.clone());
    }
    if let Some(modules) = &req.modules {
        course.modules = build_modules(modules);
    }
    if let Some(quizzes) = &req.quizzes {
        course.quizzes = build_quizzes(quizzes);
    }
    if let Some(capstone) = &req.capstone {
        course.capstone = Some(capstone.clone());
    }
    if let Some(session) = &req.live_session {
        course.live_session = Some(session.clone());
    }
    if let Some(published) = req.published {
        course.published = published;
    }
    course
}

/// Creates a course, or merges into a seeded one when the id carries
/// [`SEED_ID_PREFIX`]. Any other caller-supplied id is ignored.
pub fn save(store: &dyn Store, req: NewCourse) -> Result<Course> {
    validate(&req)?;

    match req.id.as_deref() {
        Some(id) if id.starts_with(SEED_ID_PREFIX) => {
            let course = store.upsert_course_with(id, &mut |existing| match existing {
                Some(course) => Ok(merge_course(course, &req)),
                None => build_course(&req, id.to_string()),
            })?;
            info!(course_id = %course.id, "Course upserted");
            Ok(course)
        }
        _ => {
            let course = build_course(&req, new_id())?;
            store.insert_course(&course)?;
            info!(course_id = %course.id, "Course created");
            Ok(course)
        }
    }
}

pub fn get(store: &dyn Store, id: &str) -> Result<Course> {
    store.get_course(id)?.ok_or(Error::NotFound)
}

pub fn list_published(store: &dyn Store) -> Result<Vec<Course>> {
    store.list_published_courses()
}

/// Deletes a course. Progress records that reference it are left in place.
/// Returns whether a course was removed.
pub fn delete(store: &dyn Store, id: &str) -> Result<bool> {
    let removed = store.delete_course(id)?;
    if removed {
        info!(course_id = id, "Course deleted");
    }
    Ok(removed)
}

pub fn schedule_live(store: &dyn Store, course_id: &str, session: LiveSession) -> Result<Course> {
    require("topic", &session.topic)?;
    require("meetingLink", &session.meeting_link)?;

    store.set_course_live_session(course_id, Some(&session))?;
    info!(course_id, topic = %session.topic, "Live session scheduled");
    get(store, course_id)
}

/// Every progress record for the course paired with its user.
pub fn enrolled_students(store: &dyn Store, course_id: &str) -> Result<Vec<EnrolledStudent>> {
    store
        .list_course_progress(course_id)?
        .into_iter()
        .map(|progress| -> Result<EnrolledStudent> {
            let user = store.get_user(&progress.user_id)?;
            Ok(EnrolledStudent { user, progress })
        })
        .collect()
}
