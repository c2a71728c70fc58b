pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    phone_number TEXT,
    role TEXT NOT NULL DEFAULT 'student',
    is_suspended INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Enrollment list; position keeps insertion order.
-- course_id is a plain reference: deleting a course leaves these rows alone.
CREATE TABLE IF NOT EXISTS user_courses (
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    course_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (user_id, course_id)
);

-- Nested collections (modules, quizzes, capstone, live session) are JSON documents
CREATE TABLE IF NOT EXISTS courses (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    thumbnail_url TEXT,
    price REAL NOT NULL DEFAULT 0,
    tutor_id TEXT,
    tutor_name TEXT,
    modules TEXT NOT NULL DEFAULT '[]',
    quizzes TEXT NOT NULL DEFAULT '[]',
    capstone TEXT,
    live_session TEXT,
    published INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

-- No foreign keys: progress and notifications reference users and courses by id only,
-- dependent rows are removed by the application when a user is deleted.
CREATE TABLE IF NOT EXISTS progress (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    course_id TEXT NOT NULL,
    completed_module_ids TEXT NOT NULL DEFAULT '[]',
    quiz_results TEXT NOT NULL DEFAULT '[]',
    quiz_attempts TEXT NOT NULL DEFAULT '[]',
    capstone_status TEXT NOT NULL DEFAULT 'pending',
    capstone_submission_text TEXT,
    capstone_grade REAL,
    capstone_feedback TEXT,

    UNIQUE(user_id, course_id)
);

CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    from_name TEXT,
    message TEXT NOT NULL,
    kind TEXT NOT NULL,
    read INTEGER NOT NULL DEFAULT 0,
    date TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_user_courses_user ON user_courses(user_id);
CREATE INDEX IF NOT EXISTS idx_courses_published ON courses(published, created_at);
CREATE INDEX IF NOT EXISTS idx_progress_user ON progress(user_id);
CREATE INDEX IF NOT EXISTS idx_progress_course ON progress(course_id);
CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, date);
"#;
