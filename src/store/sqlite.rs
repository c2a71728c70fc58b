use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, phone_number, role, is_suspended, created_at";

const COURSE_COLUMNS: &str = "id, title, description, thumbnail_url, price, tutor_id, tutor_name,
     modules, quizzes, capstone, live_session, published, created_at";

const PROGRESS_COLUMNS: &str = "id, user_id, course_id, completed_module_ids, quiz_results,
     quiz_attempts, capstone_status, capstone_submission_text, capstone_grade, capstone_feedback";

const NOTIFICATION_COLUMNS: &str = "id, user_id, from_name, message, kind, read, date";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

/// Fixed-width so that text ordering in SQL matches chronological ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Error::from)
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_json_column<T: DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(text) => serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(None),
    }
}

fn enum_column<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    parse(&text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value '{text}'").into(),
        )
    })
}

/// Maps a users row; `enrolled_course_ids` is filled in separately.
fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        phone_number: row.get(4)?,
        role: enum_column(row, 5, Role::parse)?,
        enrolled_course_ids: Vec::new(),
        is_suspended: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn row_to_course(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        thumbnail_url: row.get(3)?,
        price: row.get(4)?,
        tutor_id: row.get(5)?,
        tutor_name: row.get(6)?,
        modules: json_column(row, 7)?,
        quizzes: json_column(row, 8)?,
        capstone: optional_json_column(row, 9)?,
        live_session: optional_json_column(row, 10)?,
        published: row.get(11)?,
        created_at: parse_datetime(&row.get::<_, String>(12)?),
    })
}

fn row_to_progress(row: &Row<'_>) -> rusqlite::Result<Progress> {
    Ok(Progress {
        id: row.get(0)?,
        user_id: row.get(1)?,
        course_id: row.get(2)?,
        completed_module_ids: json_column(row, 3)?,
        quiz_results: json_column(row, 4)?,
        quiz_attempts: json_column(row, 5)?,
        capstone_status: enum_column(row, 6, CapstoneStatus::parse)?,
        capstone_submission_text: row.get(7)?,
        capstone_grade: row.get(8)?,
        capstone_feedback: row.get(9)?,
    })
}

fn row_to_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        from_name: row.get(2)?,
        message: row.get(3)?,
        kind: enum_column(row, 4, NotificationKind::parse)?,
        read: row.get(5)?,
        date: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn enrolled_course_ids(conn: &Connection, user_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT course_id FROM user_courses WHERE user_id = ?1 ORDER BY position")?;
    let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl SqliteStore {
    fn find_user(&self, sql: &str, key: &str) -> Result<Option<User>> {
        let conn = self.conn();
        let user = conn
            .query_row(sql, params![key], row_to_user)
            .optional()?;

        match user {
            Some(mut user) => {
                user.enrolled_course_ids = enrolled_course_ids(&conn, &user.id)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO users (id, name, email, password_hash, phone_number, role, is_suspended, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.id,
                user.name,
                user.email,
                user.password_hash,
                user.phone_number,
                user.role.as_str(),
                user.is_suspended,
                format_datetime(&user.created_at),
            ],
        );

        match result {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => return Err(Error::AlreadyExists),
            Err(e) => return Err(Error::from(e)),
        }

        for (position, course_id) in user.enrolled_course_ids.iter().enumerate() {
            conn.execute(
                "INSERT OR IGNORE INTO user_courses (user_id, course_id, position) VALUES (?1, ?2, ?3)",
                params![user.id, course_id, position as i64],
            )?;
        }
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.find_user(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            id,
        )
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_user(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            email,
        )
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))?;
        let mut users = stmt
            .query_map([], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for user in &mut users {
            user.enrolled_course_ids = enrolled_course_ids(&conn, &user.id)?;
        }
        Ok(users)
    }

    fn set_user_suspended(&self, id: &str, suspended: bool) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET is_suspended = ?1 WHERE id = ?2",
            params![suspended, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_user(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn add_enrolled_course(&self, user_id: &str, course_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "INSERT OR IGNORE INTO user_courses (user_id, course_id, position)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(position), -1) + 1 FROM user_courses WHERE user_id = ?1))",
            params![user_id, course_id],
        )?;
        Ok(rows > 0)
    }

    // Course operations

    fn insert_course(&self, course: &Course) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO courses (id, title, description, thumbnail_url, price, tutor_id, tutor_name,
                                  modules, quizzes, capstone, live_session, published, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                course.id,
                course.title,
                course.description,
                course.thumbnail_url,
                course.price,
                course.tutor_id,
                course.tutor_name,
                to_json(&course.modules)?,
                to_json(&course.quizzes)?,
                course.capstone.as_ref().map(to_json).transpose()?,
                course.live_session.as_ref().map(to_json).transpose()?,
                course.published,
                format_datetime(&course.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn upsert_course_with(
        &self,
        id: &str,
        build: &mut dyn FnMut(Option<Course>) -> Result<Course>,
    ) -> Result<Course> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let existing = tx
            .query_row(
                &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1"),
                params![id],
                row_to_course,
            )
            .optional()?;
        let course = build(existing)?;

        tx.execute(
            "INSERT INTO courses (id, title, description, thumbnail_url, price, tutor_id, tutor_name,
                                  modules, quizzes, capstone, live_session, published, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                thumbnail_url = excluded.thumbnail_url,
                price = excluded.price,
                tutor_id = excluded.tutor_id,
                tutor_name = excluded.tutor_name,
                modules = excluded.modules,
                quizzes = excluded.quizzes,
                capstone = excluded.capstone,
                live_session = excluded.live_session,
                published = excluded.published",
            params![
                id,
                course.title,
                course.description,
                course.thumbnail_url,
                course.price,
                course.tutor_id,
                course.tutor_name,
                to_json(&course.modules)?,
                to_json(&course.quizzes)?,
                course.capstone.as_ref().map(to_json).transpose()?,
                course.live_session.as_ref().map(to_json).transpose()?,
                course.published,
                format_datetime(&course.created_at),
            ],
        )?;

        let stored = tx.query_row(
            &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1"),
            params![id],
            row_to_course,
        )?;
        tx.commit()?;
        Ok(stored)
    }

    fn get_course(&self, id: &str) -> Result<Option<Course>> {
        self.conn()
            .query_row(
                &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1"),
                params![id],
                row_to_course,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_published_courses(&self) -> Result<Vec<Course>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE published = 1
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map([], row_to_course)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_course(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM courses WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn set_course_live_session(&self, id: &str, session: Option<&LiveSession>) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE courses SET live_session = ?1 WHERE id = ?2",
            params![session.map(to_json).transpose()?, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Progress operations

    fn insert_progress_if_absent(&self, progress: &Progress) -> Result<bool> {
        let rows = self.conn().execute(
            "INSERT INTO progress (id, user_id, course_id, completed_module_ids, quiz_results,
                                   quiz_attempts, capstone_status, capstone_submission_text,
                                   capstone_grade, capstone_feedback)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(user_id, course_id) DO NOTHING",
            params![
                progress.id,
                progress.user_id,
                progress.course_id,
                to_json(&progress.completed_module_ids)?,
                to_json(&progress.quiz_results)?,
                to_json(&progress.quiz_attempts)?,
                progress.capstone_status.as_str(),
                progress.capstone_submission_text,
                progress.capstone_grade,
                progress.capstone_feedback,
            ],
        )?;
        Ok(rows > 0)
    }

    fn get_progress(&self, id: &str) -> Result<Option<Progress>> {
        self.conn()
            .query_row(
                &format!("SELECT {PROGRESS_COLUMNS} FROM progress WHERE id = ?1"),
                params![id],
                row_to_progress,
            )
            .optional()
            .map_err(Error::from)
    }

    fn find_progress(&self, user_id: &str, course_id: &str) -> Result<Option<Progress>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {PROGRESS_COLUMNS} FROM progress WHERE user_id = ?1 AND course_id = ?2"
                ),
                params![user_id, course_id],
                row_to_progress,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_course_progress(&self, course_id: &str) -> Result<Vec<Progress>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress WHERE course_id = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt.query_map(params![course_id], row_to_progress)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_user_progress(&self, user_id: &str) -> Result<Vec<Progress>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress WHERE user_id = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt.query_map(params![user_id], row_to_progress)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn modify_progress(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut Progress) -> Result<bool>,
    ) -> Result<Progress> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut progress = tx
            .query_row(
                &format!("SELECT {PROGRESS_COLUMNS} FROM progress WHERE id = ?1"),
                params![id],
                row_to_progress,
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        if !apply(&mut progress)? {
            return Ok(progress);
        }

        tx.execute(
            "UPDATE progress SET
                completed_module_ids = ?1,
                quiz_results = ?2,
                quiz_attempts = ?3,
                capstone_status = ?4,
                capstone_submission_text = ?5,
                capstone_grade = ?6,
                capstone_feedback = ?7
             WHERE id = ?8",
            params![
                to_json(&progress.completed_module_ids)?,
                to_json(&progress.quiz_results)?,
                to_json(&progress.quiz_attempts)?,
                progress.capstone_status.as_str(),
                progress.capstone_submission_text,
                progress.capstone_grade,
                progress.capstone_feedback,
                id,
            ],
        )?;
        tx.commit()?;
        Ok(progress)
    }

    fn grade_capstone(&self, id: &str, score: f64, feedback: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE progress SET capstone_grade = ?1, capstone_feedback = ?2, capstone_status = ?3
             WHERE id = ?4",
            params![score, feedback, CapstoneStatus::Graded.as_str(), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_user_progress(&self, user_id: &str) -> Result<usize> {
        let rows = self
            .conn()
            .execute("DELETE FROM progress WHERE user_id = ?1", params![user_id])?;
        Ok(rows)
    }

    // Notification operations

    fn create_notification(&self, notification: &Notification) -> Result<()> {
        self.conn().execute(
            "INSERT INTO notifications (id, user_id, from_name, message, kind, read, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                notification.id,
                notification.user_id,
                notification.from_name,
                notification.message,
                notification.kind.as_str(),
                notification.read,
                format_datetime(&notification.date),
            ],
        )?;
        Ok(())
    }

    fn list_user_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = ?1
             ORDER BY date DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map(params![user_id], row_to_notification)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn mark_notification_read(&self, id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE notifications SET read = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(rows > 0)
    }

    fn delete_user_notifications(&self, user_id: &str) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM notifications WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn test_user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            phone_number: None,
            role: Role::Student,
            enrolled_course_ids: Vec::new(),
            is_suspended: false,
            created_at: Utc::now(),
        }
    }

    fn test_course(id: &str, published: bool) -> Course {
        Course {
            id: id.to_string(),
            title: format!("Course {id}"),
            description: None,
            thumbnail_url: None,
            price: 0.0,
            tutor_id: None,
            tutor_name: None,
            modules: vec![CourseModule {
                id: "m1".to_string(),
                title: "Intro".to_string(),
                order: 1,
                video_url: None,
                lesson_content: Some("Welcome".to_string()),
                transcript: None,
            }],
            quizzes: Vec::new(),
            capstone: Some(Capstone {
                instructions: "Build something".to_string(),
                kind: CapstoneKind::Project,
            }),
            live_session: None,
            published,
            created_at: Utc::now(),
        }
    }

    fn test_notification(user_id: &str, message: &str, date: DateTime<Utc>) -> Notification {
        Notification {
            id: new_id(),
            user_id: user_id.to_string(),
            from_name: Some("System".to_string()),
            message: message.to_string(),
            kind: NotificationKind::Info,
            read: false,
            date,
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (_temp, store) = test_store();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"user_courses".to_string()));
        assert!(tables.contains(&"courses".to_string()));
        assert!(tables.contains(&"progress".to_string()));
        assert!(tables.contains(&"notifications".to_string()));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (_temp, store) = test_store();
        store.initialize().unwrap();
    }

    #[test]
    fn test_user_crud() {
        let (_temp, store) = test_store();

        store.create_user(&test_user("u1", "a@example.com")).unwrap();

        let fetched = store.get_user("u1").unwrap().unwrap();
        assert_eq!(fetched.email, "a@example.com");
        assert_eq!(fetched.role, Role::Student);
        assert!(fetched.enrolled_course_ids.is_empty());

        let by_email = store.get_user_by_email("a@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, "u1");

        store.set_user_suspended("u1", true).unwrap();
        assert!(store.get_user("u1").unwrap().unwrap().is_suspended);

        assert!(store.delete_user("u1").unwrap());
        assert!(store.get_user("u1").unwrap().is_none());
        assert!(!store.delete_user("u1").unwrap());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (_temp, store) = test_store();

        store.create_user(&test_user("u1", "a@example.com")).unwrap();
        let result = store.create_user(&test_user("u2", "a@example.com"));
        assert!(matches!(result, Err(Error::AlreadyExists)));
    }

    #[test]
    fn test_set_suspended_missing_user() {
        let (_temp, store) = test_store();
        assert!(matches!(
            store.set_user_suspended("nope", true),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_enrollment_list_keeps_order_and_ignores_duplicates() {
        let (_temp, store) = test_store();
        store.create_user(&test_user("u1", "a@example.com")).unwrap();

        assert!(store.add_enrolled_course("u1", "c2").unwrap());
        assert!(store.add_enrolled_course("u1", "c1").unwrap());
        assert!(!store.add_enrolled_course("u1", "c2").unwrap());
        assert!(store.add_enrolled_course("u1", "c3").unwrap());

        let user = store.get_user("u1").unwrap().unwrap();
        assert_eq!(user.enrolled_course_ids, vec!["c2", "c1", "c3"]);

        let listed = store.list_users().unwrap();
        assert_eq!(listed[0].enrolled_course_ids, vec!["c2", "c1", "c3"]);
    }

    #[test]
    fn test_enrollment_rows_removed_with_user() {
        let (_temp, store) = test_store();
        store.create_user(&test_user("u1", "a@example.com")).unwrap();
        store.add_enrolled_course("u1", "c1").unwrap();

        store.delete_user("u1").unwrap();

        let count: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM user_courses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_course_insert_and_get() {
        let (_temp, store) = test_store();
        store.insert_course(&test_course("c1", true)).unwrap();

        let course = store.get_course("c1").unwrap().unwrap();
        assert_eq!(course.title, "Course c1");
        assert_eq!(course.modules.len(), 1);
        assert_eq!(course.modules[0].lesson_content.as_deref(), Some("Welcome"));
        assert_eq!(
            course.capstone.as_ref().map(|c| c.kind),
            Some(CapstoneKind::Project)
        );

        let result = store.insert_course(&test_course("c1", true));
        assert!(matches!(result, Err(Error::AlreadyExists)));
    }

    #[test]
    fn test_course_upsert_with_sees_existing_record() {
        let (_temp, store) = test_store();

        let created = store
            .upsert_course_with("c_seed", &mut |existing| {
                assert!(existing.is_none());
                Ok(test_course("c_seed", false))
            })
            .unwrap();
        assert!(!created.published);

        let updated = store
            .upsert_course_with("c_seed", &mut |existing| {
                let mut course = existing.expect("seeded course");
                course.title = "Renamed".to_string();
                course.published = true;
                Ok(course)
            })
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert!(updated.published);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(store.get_course("c_seed").unwrap().unwrap().title, "Renamed");
    }

    #[test]
    fn test_course_upsert_with_aborts_on_error() {
        let (_temp, store) = test_store();

        let result = store.upsert_course_with("c_seed", &mut |_| Err(Error::NotFound));

        assert!(matches!(result, Err(Error::NotFound)));
        assert!(store.get_course("c_seed").unwrap().is_none());
    }

    #[test]
    fn test_list_published_courses_newest_first() {
        let (_temp, store) = test_store();
        let now = Utc::now();

        let mut old = test_course("old", true);
        old.created_at = now - Duration::days(2);
        let mut new = test_course("new", true);
        new.created_at = now;
        let hidden = test_course("hidden", false);

        store.insert_course(&old).unwrap();
        store.insert_course(&new).unwrap();
        store.insert_course(&hidden).unwrap();

        let ids: Vec<String> = store
            .list_published_courses()
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn test_live_session_update() {
        let (_temp, store) = test_store();
        store.insert_course(&test_course("c1", true)).unwrap();

        let session = LiveSession {
            topic: "Q&A".to_string(),
            date: Utc::now(),
            meeting_link: "https://meet.example.com/abc".to_string(),
            is_active: true,
        };
        store.set_course_live_session("c1", Some(&session)).unwrap();

        let course = store.get_course("c1").unwrap().unwrap();
        assert_eq!(course.live_session.unwrap().topic, "Q&A");

        assert!(matches!(
            store.set_course_live_session("missing", Some(&session)),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_progress_unique_per_pair() {
        let (_temp, store) = test_store();

        let first = Progress::new("u1", "c1");
        assert!(store.insert_progress_if_absent(&first).unwrap());

        let second = Progress::new("u1", "c1");
        assert!(!store.insert_progress_if_absent(&second).unwrap());

        let found = store.find_progress("u1", "c1").unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(store.get_progress(&second.id).unwrap().is_none());
    }

    #[test]
    fn test_modify_progress_round_trip() {
        let (_temp, store) = test_store();
        let progress = Progress::new("u1", "c1");
        store.insert_progress_if_absent(&progress).unwrap();

        let modified = store
            .modify_progress(&progress.id, &mut |p| {
                p.complete_module("m1");
                p.capstone_status = CapstoneStatus::Submitted;
                p.capstone_submission_text = Some("https://github.com/me/project".to_string());
                Ok(true)
            })
            .unwrap();
        assert_eq!(modified.capstone_status, CapstoneStatus::Submitted);

        let fetched = store.get_progress(&progress.id).unwrap().unwrap();
        assert_eq!(fetched.completed_module_ids, vec!["m1"]);
        assert_eq!(fetched.capstone_status, CapstoneStatus::Submitted);

        assert!(matches!(
            store.modify_progress("missing", &mut |_| Ok(true)),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_modify_progress_skips_write_when_unchanged() {
        let (_temp, store) = test_store();
        let progress = Progress::new("u1", "c1");
        store.insert_progress_if_absent(&progress).unwrap();

        store
            .modify_progress(&progress.id, &mut |p| {
                p.complete_module("m1");
                Ok(false)
            })
            .unwrap();

        let fetched = store.get_progress(&progress.id).unwrap().unwrap();
        assert!(fetched.completed_module_ids.is_empty());
    }

    #[test]
    fn test_grade_capstone() {
        let (_temp, store) = test_store();
        let progress = Progress::new("u1", "c1");
        store.insert_progress_if_absent(&progress).unwrap();

        store.grade_capstone(&progress.id, 85.0, "Good work").unwrap();

        let graded = store.get_progress(&progress.id).unwrap().unwrap();
        assert_eq!(graded.capstone_status, CapstoneStatus::Graded);
        assert_eq!(graded.capstone_grade, Some(85.0));
        assert_eq!(graded.capstone_feedback.as_deref(), Some("Good work"));

        assert!(matches!(
            store.grade_capstone("missing", 50.0, ""),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_list_course_progress() {
        let (_temp, store) = test_store();
        store
            .insert_progress_if_absent(&Progress::new("u1", "c1"))
            .unwrap();
        store
            .insert_progress_if_absent(&Progress::new("u2", "c1"))
            .unwrap();
        store
            .insert_progress_if_absent(&Progress::new("u1", "c2"))
            .unwrap();

        let rows = store.list_course_progress("c1").unwrap();
        let users: Vec<&str> = rows.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(users, vec!["u1", "u2"]);

        assert_eq!(store.list_user_progress("u1").unwrap().len(), 2);
        assert_eq!(store.delete_user_progress("u1").unwrap(), 2);
        assert!(store.list_user_progress("u1").unwrap().is_empty());
    }

    #[test]
    fn test_notifications_newest_first() {
        let (_temp, store) = test_store();
        let now = Utc::now();

        store
            .create_notification(&test_notification("u1", "older", now - Duration::hours(1)))
            .unwrap();
        store
            .create_notification(&test_notification("u1", "newer", now))
            .unwrap();
        store
            .create_notification(&test_notification("u2", "other", now))
            .unwrap();

        let messages: Vec<String> = store
            .list_user_notifications("u1")
            .unwrap()
            .into_iter()
            .map(|n| n.message)
            .collect();
        assert_eq!(messages, vec!["newer", "older"]);
    }

    #[test]
    fn test_mark_notification_read() {
        let (_temp, store) = test_store();
        let notification = test_notification("u1", "hello", Utc::now());
        store.create_notification(&notification).unwrap();

        assert!(store.mark_notification_read(&notification.id).unwrap());
        assert!(!store.mark_notification_read("missing").unwrap());

        let listed = store.list_user_notifications("u1").unwrap();
        assert!(listed[0].read);

        assert_eq!(store.delete_user_notifications("u1").unwrap(), 1);
        assert_eq!(store.delete_user_notifications("u1").unwrap(), 0);
    }
}
