//! Store Module - SQLite Persistence
//!
//! One bundled-SQLite connection behind a mutex; every query runs on
//! the blocking pool so handlers never stall the async runtime.
//!
//! Rows travel as the records in `models::types`; comma-joined and
//! JSON-encoded columns are converted at this boundary.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::models::{AppError, AppResult, ErrorCode};

mod assignments;
mod courses;
mod messages;
mod quizzes;
mod users;

/// Bump when the schema changes shape
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = "
    PRAGMA journal_mode=WAL;
    PRAGMA synchronous=NORMAL;
    PRAGMA foreign_keys=ON;
    PRAGMA busy_timeout=5000;
    CREATE TABLE IF NOT EXISTS users (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      email TEXT NOT NULL UNIQUE,
      password_hash TEXT NOT NULL,
      role TEXT NOT NULL CHECK(role IN ('student','admin')),
      verified INTEGER NOT NULL DEFAULT 0,
      verification_code TEXT
    );
    CREATE TABLE IF NOT EXISTS courses (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      title TEXT NOT NULL,
      description TEXT NOT NULL,
      files TEXT NOT NULL DEFAULT '',
      created_by INTEGER NOT NULL REFERENCES users(id),
      created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS assignments (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      student_id INTEGER NOT NULL REFERENCES users(id),
      course_id INTEGER NOT NULL REFERENCES courses(id),
      filename TEXT NOT NULL,
      submitted_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS quizzes (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      question TEXT NOT NULL,
      options TEXT NOT NULL,
      answer TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS quiz_results (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      student_id INTEGER NOT NULL REFERENCES users(id),
      score INTEGER NOT NULL,
      total INTEGER NOT NULL,
      taken_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS contact_messages (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      email TEXT NOT NULL,
      message TEXT NOT NULL,
      received_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_assignments_student ON assignments(student_id);
    CREATE INDEX IF NOT EXISTS idx_quiz_results_student ON quiz_results(student_id);
";

/// Shared handle to the platform database
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) the database file and apply the schema
    pub fn open(path: &str) -> AppResult<Self> {
        let conn = Connection::open(path).map_err(|e| {
            AppError::with_source(ErrorCode::DbOpenFailed, format!("open {}", path), e)
        })?;
        Self::init(conn, path)
    }

    /// Private in-memory database, used by tests and the seed tool
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::with_source(ErrorCode::DbOpenFailed, "open :memory:", e))?;
        Self::init(conn, ":memory:")
    }

    fn init(conn: Connection, path: &str) -> AppResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::with_source(ErrorCode::DbOpenFailed, "apply schema", e))?;
        conn.execute_batch(&format!("PRAGMA user_version={};", SCHEMA_VERSION))
            .map_err(|e| AppError::with_source(ErrorCode::DbOpenFailed, "set user_version", e))?;
        info!("💾 DATABASE READY: {} (schema v{})", path, SCHEMA_VERSION);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool
    pub(crate) async fn call<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Connection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| AppError::internal("database lock poisoned"))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| AppError::internal(format!("database task failed: {}", e)))?
    }

    /// Row counts across all tables, for the stats endpoint
    pub async fn counts(&self) -> AppResult<TableCounts> {
        self.call(|conn| {
            let count = |conn: &Connection, table: &str| -> AppResult<i64> {
                let n = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
                Ok(n)
            };
            Ok(TableCounts {
                users: count(conn, "users")?,
                courses: count(conn, "courses")?,
                assignments: count(conn, "assignments")?,
                quizzes: count(conn, "quizzes")?,
                quiz_results: count(conn, "quiz_results")?,
                contact_messages: count(conn, "contact_messages")?,
            })
        })
        .await
    }
}

/// Per-table row counts
#[derive(Debug, Clone, serde::Serialize)]
pub struct TableCounts {
    pub users: i64,
    pub courses: i64,
    pub assignments: i64,
    pub quizzes: i64,
    pub quiz_results: i64,
    pub contact_messages: i64,
}

/// Parse an RFC 3339 TEXT column into a UTC timestamp
pub(crate) fn parse_ts(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory_and_counts() {
        let store = Store::open_in_memory().unwrap();
        let counts = store.counts().await.unwrap();
        assert_eq!(counts.users, 0);
        assert_eq!(counts.quizzes, 0);
    }

    #[test]
    fn test_parse_ts() {
        let ts = parse_ts(0, "2025-06-01T12:00:00+00:00".to_string()).unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-06-01T12:00:00+00:00");
        assert!(parse_ts(0, "not-a-date".to_string()).is_err());
    }
}
