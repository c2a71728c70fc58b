use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::validation::{require, validate_email, validate_name};
use crate::auth::PasswordHasher;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Role, User, new_id};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// What a user deletion removed besides the user itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub progress_removed: usize,
    pub notifications_removed: usize,
}

pub fn create(store: &dyn Store, req: NewUser) -> Result<User> {
    validate_name(&req.name)?;
    validate_email(&req.email)?;
    require("password", &req.password)?;

    let hasher = PasswordHasher::new();
    let user = User {
        id: new_id(),
        name: req.name.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        password_hash: hasher.hash(&req.password)?,
        phone_number: req.phone_number,
        role: req.role,
        enrolled_course_ids: Vec::new(),
        is_suspended: false,
        created_at: Utc::now(),
    };

    store.create_user(&user)?;
    info!(user_id = %user.id, role = %user.role, "User created");
    Ok(user)
}

pub fn list(store: &dyn Store) -> Result<Vec<User>> {
    store.list_users()
}

pub fn set_suspended(store: &dyn Store, user_id: &str, suspended: bool) -> Result<User> {
    store.set_user_suspended(user_id, suspended)?;
    info!(user_id, suspended, "User suspension updated");
    store.get_user(user_id)?.ok_or(Error::NotFound)
}

/// Checks credentials. Unknown email and wrong password are indistinguishable.
pub fn login(store: &dyn Store, email: &str, password: &str) -> Result<User> {
    let email = email.trim().to_lowercase();
    let user = store
        .get_user_by_email(&email)?
        .ok_or(Error::Unauthorized)?;

    if !PasswordHasher::new().verify(password, &user.password_hash)? {
        return Err(Error::Unauthorized);
    }
    Ok(user)
}

/// Deletes a user, then every progress and notification record it owns.
///
/// Nothing else is touched when the user does not exist. Dependent records
/// are removed unconditionally after the user is gone; a failure there is
/// logged and returned without restoring the user.
pub fn delete(store: &dyn Store, user_id: &str) -> Result<DeletionReport> {
    if !store.delete_user(user_id)? {
        return Err(Error::NotFound);
    }

    let progress_removed = store.delete_user_progress(user_id).inspect_err(|e| {
        error!(user_id, "User deleted but progress cleanup failed: {e}");
    })?;
    let notifications_removed = store.delete_user_notifications(user_id).inspect_err(|e| {
        error!(user_id, "User deleted but notification cleanup failed: {e}");
    })?;

    info!(
        user_id,
        progress_removed, notifications_removed, "User deleted"
    );

    Ok(DeletionReport {
        progress_removed,
        notifications_removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::test_store;
    use crate::service::{enrollment, notifications};
    use crate::types::NotificationKind;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            password: "analytical-engine".to_string(),
            phone_number: None,
            role: Role::Student,
        }
    }

    #[test]
    fn test_create_hashes_password() {
        let (_temp, store) = test_store();
        let user = create(&store, new_user("Ada@Example.com")).unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_ne!(user.password_hash, "analytical-engine");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_create_duplicate_email() {
        let (_temp, store) = test_store();
        create(&store, new_user("ada@example.com")).unwrap();

        let result = create(&store, new_user("ADA@example.com"));
        assert!(matches!(result, Err(Error::AlreadyExists)));
    }

    #[test]
    fn test_create_validates_fields() {
        let (_temp, store) = test_store();

        let mut req = new_user("not-an-email");
        assert!(matches!(create(&store, req), Err(Error::BadRequest(_))));

        req = new_user("ada@example.com");
        req.password = String::new();
        assert!(matches!(create(&store, req), Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_login() {
        let (_temp, store) = test_store();
        let user = create(&store, new_user("ada@example.com")).unwrap();

        let logged_in = login(&store, "ada@example.com", "analytical-engine").unwrap();
        assert_eq!(logged_in.id, user.id);

        assert!(matches!(
            login(&store, "ada@example.com", "wrong"),
            Err(Error::Unauthorized)
        ));
        assert!(matches!(
            login(&store, "nobody@example.com", "analytical-engine"),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn test_set_suspended() {
        let (_temp, store) = test_store();
        let user = create(&store, new_user("ada@example.com")).unwrap();

        let suspended = set_suspended(&store, &user.id, true).unwrap();
        assert!(suspended.is_suspended);

        let restored = set_suspended(&store, &user.id, false).unwrap();
        assert!(!restored.is_suspended);

        assert!(matches!(
            set_suspended(&store, &new_id(), true),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_delete_cascades_to_owned_records() {
        let (_temp, store) = test_store();
        let user = create(&store, new_user("ada@example.com")).unwrap();
        let other = create(&store, new_user("grace@example.com")).unwrap();

        enrollment::enroll(&store, &user.id, "c1").unwrap();
        enrollment::enroll(&store, &user.id, "c2").unwrap();
        enrollment::enroll(&store, &other.id, "c1").unwrap();
        for message in ["one", "two", "three"] {
            notifications::send(
                &store,
                notifications::NewNotification {
                    user_id: user.id.clone(),
                    from_name: None,
                    message: message.to_string(),
                    kind: NotificationKind::Info,
                    date: None,
                },
            )
            .unwrap();
        }

        let report = delete(&store, &user.id).unwrap();

        assert_eq!(
            report,
            DeletionReport {
                progress_removed: 2,
                notifications_removed: 3,
            }
        );
        assert!(store.list_user_progress(&user.id).unwrap().is_empty());
        assert!(store.list_user_notifications(&user.id).unwrap().is_empty());
        assert_eq!(store.list_user_progress(&other.id).unwrap().len(), 1);

        assert!(matches!(delete(&store, &user.id), Err(Error::NotFound)));
    }

    #[test]
    fn test_delete_unknown_user_touches_nothing() {
        let (_temp, store) = test_store();
        let orphan_owner = new_id();
        progress_for(&store, &orphan_owner);

        assert!(matches!(delete(&store, &orphan_owner), Err(Error::NotFound)));
        assert_eq!(store.list_user_progress(&orphan_owner).unwrap().len(), 1);
    }

    fn progress_for(store: &dyn Store, user_id: &str) {
        crate::service::progress::get_or_create(store, user_id, "c1").unwrap();
    }
}
