//! Course rows
//!
//! The `files` column stays comma-joined on disk; records cross this
//! boundary with the list already split.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_ts, Store};
use crate::models::{AppError, AppResult, Course};

fn row_to_course(row: &Row) -> rusqlite::Result<Course> {
    let files: String = row.get(3)?;
    Ok(Course {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        files: Course::file_list(&files),
        created_by: row.get(4)?,
        created_at: parse_ts(5, row.get(5)?)?,
    })
}

const COURSE_COLS: &str = "id, title, description, files, created_by, created_at";

impl Store {
    pub async fn create_course(
        &self,
        title: String,
        description: String,
        created_by: i64,
        created_at: DateTime<Utc>,
    ) -> AppResult<Course> {
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO courses (title, description, files, created_by, created_at)
                 VALUES (?1, ?2, '', ?3, ?4)",
                params![title, description, created_by, created_at.to_rfc3339()],
            )?;
            Ok(Course {
                id: conn.last_insert_rowid(),
                title,
                description,
                files: Vec::new(),
                created_by,
                created_at,
            })
        })
        .await
    }

    /// All courses, newest first
    pub async fn list_courses(&self) -> AppResult<Vec<Course>> {
        self.call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM courses ORDER BY created_at DESC, id DESC",
                COURSE_COLS
            ))?;
            let rows = stmt.query_map([], row_to_course)?;
            let mut courses = Vec::new();
            for course in rows {
                courses.push(course?);
            }
            Ok(courses)
        })
        .await
    }

    pub async fn course_by_id(&self, id: i64) -> AppResult<Option<Course>> {
        self.call(move |conn| {
            let course = conn
                .query_row(
                    &format!("SELECT {} FROM courses WHERE id = ?1", COURSE_COLS),
                    params![id],
                    row_to_course,
                )
                .optional()?;
            Ok(course)
        })
        .await
    }

    /// Attach a stored filename to a course
    pub async fn append_course_file(&self, course_id: i64, filename: String) -> AppResult<Course> {
        self.call(move |conn| {
            let current: Option<String> = conn
                .query_row(
                    "SELECT files FROM courses WHERE id = ?1",
                    params![course_id],
                    |row| row.get(0),
                )
                .optional()?;
            let current = match current {
                Some(files) => files,
                None => return Err(AppError::not_found(format!("course {}", course_id))),
            };
            let mut names = Course::file_list(&current);
            names.push(filename);
            conn.execute(
                "UPDATE courses SET files = ?1 WHERE id = ?2",
                params![Course::join_files(&names), course_id],
            )?;
            let course = conn.query_row(
                &format!("SELECT {} FROM courses WHERE id = ?1", COURSE_COLS),
                params![course_id],
                row_to_course,
            )?;
            Ok(course)
        })
        .await
    }
}
