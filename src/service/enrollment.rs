use tracing::{debug, error, info};

use super::progress;
use super::validation::require;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::User;

/// Enrolls a user in a course and makes sure the matching progress record exists.
///
/// Enrolling twice is a no-op that returns the user unchanged; the progress
/// record is not re-checked in that case. The enrollment is written before the
/// progress record; if the second step fails the user stays enrolled and the
/// error is returned as-is.
pub fn enroll(store: &dyn Store, user_id: &str, course_id: &str) -> Result<User> {
    require("courseId", course_id)?;

    let user = store.get_user(user_id)?.ok_or(Error::NotFound)?;

    if user.is_enrolled_in(course_id) {
        debug!(user_id, course_id, "User already enrolled");
        return Ok(user);
    }

    if !store.add_enrolled_course(user_id, course_id)? {
        debug!(user_id, course_id, "Enrollment added by a concurrent request");
    }

    if let Err(e) = progress::get_or_create(store, user_id, course_id) {
        error!(
            user_id,
            course_id, "User enrolled but progress record could not be created: {e}"
        );
        return Err(e);
    }

    info!(user_id, course_id, "User enrolled");
    store.get_user(user_id)?.ok_or(Error::NotFound)
}
