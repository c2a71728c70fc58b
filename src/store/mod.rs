mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the record store interface.
///
/// Lookups return `Ok(None)` for a missing id; whole-record updates return
/// `Error::NotFound`; deletes report whether anything was removed.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;
    fn set_user_suspended(&self, id: &str, suspended: bool) -> Result<()>;
    fn delete_user(&self, id: &str) -> Result<bool>;

    /// Appends a course to the user's enrollment list.
    /// Returns false if the course was already in the list.
    fn add_enrolled_course(&self, user_id: &str, course_id: &str) -> Result<bool>;

    // Course operations
    fn insert_course(&self, course: &Course) -> Result<()>;
    /// Reads the course with `id` (if any), passes it to `build` and stores the
    /// result under `id`, all under one lock. `created_at` of an existing row
    /// is kept. Returns the stored course.
    fn upsert_course_with(
        &self,
        id: &str,
        build: &mut dyn FnMut(Option<Course>) -> Result<Course>,
    ) -> Result<Course>;
    fn get_course(&self, id: &str) -> Result<Option<Course>>;
    fn list_published_courses(&self) -> Result<Vec<Course>>;
    fn delete_course(&self, id: &str) -> Result<bool>;
    fn set_course_live_session(&self, id: &str, session: Option<&LiveSession>) -> Result<()>;

    // Progress operations
    /// Inserts the record unless one already exists for its (user, course) pair.
    /// Returns true if this call created it.
    fn insert_progress_if_absent(&self, progress: &Progress) -> Result<bool>;
    fn get_progress(&self, id: &str) -> Result<Option<Progress>>;
    fn find_progress(&self, user_id: &str, course_id: &str) -> Result<Option<Progress>>;
    fn list_course_progress(&self, course_id: &str) -> Result<Vec<Progress>>;
    fn list_user_progress(&self, user_id: &str) -> Result<Vec<Progress>>;
    /// Read-modify-write of one progress record under one lock. `apply`
    /// returns whether the record changed; unchanged records are not written.
    /// Returns `Error::NotFound` if no record has `id`.
    fn modify_progress(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut Progress) -> Result<bool>,
    ) -> Result<Progress>;
    fn grade_capstone(&self, id: &str, score: f64, feedback: &str) -> Result<()>;
    fn delete_user_progress(&self, user_id: &str) -> Result<usize>;

    // Notification operations
    fn create_notification(&self, notification: &Notification) -> Result<()>;
    fn list_user_notifications(&self, user_id: &str) -> Result<Vec<Notification>>;
    fn mark_notification_read(&self, id: &str) -> Result<bool>;
    fn delete_user_notifications(&self, user_id: &str) -> Result<usize>;
}
