use rusqlite::Connection;

/// Creates every table the engine reads or writes. Safe to run on an existing database.
pub(crate) fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS users(
            id BLOB PRIMARY KEY,
            display_name TEXT NOT NULL,
            role TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS subjects(
            id BLOB PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS levels(
            id BLOB PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sessions(
            id BLOB PRIMARY KEY,
            teacher_id BLOB NOT NULL,
            status TEXT NOT NULL,
            FOREIGN KEY(teacher_id) REFERENCES users(id)
        );

        CREATE TABLE IF NOT EXISTS session_participants(
            session_id BLOB NOT NULL,
            user_id BLOB NOT NULL,
            PRIMARY KEY(session_id, user_id),
            FOREIGN KEY(session_id) REFERENCES sessions(id),
            FOREIGN KEY(user_id) REFERENCES users(id)
        );

        CREATE TABLE IF NOT EXISTS homework(
            id BLOB PRIMARY KEY,
            teacher_id BLOB NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            instructions TEXT,
            subject_id BLOB,
            level_id BLOB,
            deadline TEXT,
            allow_late INTEGER NOT NULL DEFAULT 1,
            late_penalty_percent INTEGER NOT NULL DEFAULT 0 CHECK(late_penalty_percent BETWEEN 0 AND 100),
            created_at TEXT NOT NULL,
            FOREIGN KEY(teacher_id) REFERENCES users(id)
        );
        CREATE INDEX IF NOT EXISTS idx_homework_teacher ON homework(teacher_id);

        CREATE TABLE IF NOT EXISTS homework_assignments(
            homework_id BLOB NOT NULL,
            student_id BLOB NOT NULL,
            status TEXT NOT NULL DEFAULT 'assigned',
            assigned_at TEXT NOT NULL,
            PRIMARY KEY(homework_id, student_id),
            FOREIGN KEY(homework_id) REFERENCES homework(id),
            FOREIGN KEY(student_id) REFERENCES users(id)
        );
        CREATE INDEX IF NOT EXISTS idx_assignments_student ON homework_assignments(student_id);

        CREATE TABLE IF NOT EXISTS homework_submissions(
            id BLOB PRIMARY KEY,
            homework_id BLOB NOT NULL,
            student_id BLOB NOT NULL,
            content TEXT,
            file_refs TEXT NOT NULL DEFAULT '[]',
            is_late INTEGER NOT NULL,
            submitted_at TEXT NOT NULL,
            grade REAL,
            max_grade REAL,
            feedback TEXT,
            graded_at TEXT,
            FOREIGN KEY(homework_id) REFERENCES homework(id),
            FOREIGN KEY(student_id) REFERENCES users(id)
        );
        CREATE INDEX IF NOT EXISTS idx_submissions_homework ON homework_submissions(homework_id, student_id);

        CREATE TABLE IF NOT EXISTS quizzes(
            id BLOB PRIMARY KEY,
            teacher_id BLOB NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            subject_id BLOB,
            level_id BLOB,
            time_limit_minutes INTEGER,
            shuffle_questions INTEGER NOT NULL DEFAULT 0,
            shuffle_answers INTEGER NOT NULL DEFAULT 0,
            max_attempts INTEGER NOT NULL CHECK(max_attempts >= 1),
            questions TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(teacher_id) REFERENCES users(id)
        );

        CREATE TABLE IF NOT EXISTS quiz_attempts(
            id BLOB PRIMARY KEY,
            quiz_id BLOB NOT NULL,
            student_id BLOB NOT NULL,
            attempt_number INTEGER NOT NULL,
            answers TEXT NOT NULL,
            score INTEGER,
            max_score INTEGER NOT NULL,
            is_graded INTEGER NOT NULL DEFAULT 0,
            started_at TEXT NOT NULL,
            completed_at TEXT,
            UNIQUE(quiz_id, student_id, attempt_number),
            FOREIGN KEY(quiz_id) REFERENCES quizzes(id),
            FOREIGN KEY(student_id) REFERENCES users(id)
        );

        CREATE TABLE IF NOT EXISTS reviews(
            id BLOB PRIMARY KEY,
            session_id BLOB NOT NULL,
            reviewer_id BLOB NOT NULL,
            teacher_id BLOB NOT NULL,
            rating INTEGER NOT NULL CHECK(rating BETWEEN 1 AND 5),
            knowledge_rating INTEGER CHECK(knowledge_rating BETWEEN 1 AND 5),
            communication_rating INTEGER CHECK(communication_rating BETWEEN 1 AND 5),
            punctuality_rating INTEGER CHECK(punctuality_rating BETWEEN 1 AND 5),
            patience_rating INTEGER CHECK(patience_rating BETWEEN 1 AND 5),
            comment TEXT,
            teacher_response TEXT,
            responded_at TEXT,
            created_at TEXT NOT NULL,
            UNIQUE(session_id, reviewer_id),
            FOREIGN KEY(session_id) REFERENCES sessions(id),
            FOREIGN KEY(reviewer_id) REFERENCES users(id),
            FOREIGN KEY(teacher_id) REFERENCES users(id)
        );
        CREATE INDEX IF NOT EXISTS idx_reviews_teacher ON reviews(teacher_id, created_at);

        CREATE TABLE IF NOT EXISTS notification_preferences(
            user_id BLOB PRIMARY KEY,
            session_reminders INTEGER NOT NULL DEFAULT 1,
            homework_alerts INTEGER NOT NULL DEFAULT 1,
            payment_alerts INTEGER NOT NULL DEFAULT 1,
            marketing INTEGER NOT NULL DEFAULT 1,
            sms_enabled INTEGER NOT NULL DEFAULT 1,
            quiet_hours_start TEXT,
            quiet_hours_end TEXT,
            updated_at TEXT
        );",
    )
}
