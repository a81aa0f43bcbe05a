//! Assignment submission rows

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use super::{parse_ts, Store};
use crate::models::{AppResult, Assignment};

fn row_to_assignment(row: &Row) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: row.get(0)?,
        student_id: row.get(1)?,
        course_id: row.get(2)?,
        filename: row.get(3)?,
        submitted_at: parse_ts(4, row.get(4)?)?,
    })
}

impl Store {
    pub async fn create_assignment(
        &self,
        student_id: i64,
        course_id: i64,
        filename: String,
        submitted_at: DateTime<Utc>,
    ) -> AppResult<Assignment> {
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO assignments (student_id, course_id, filename, submitted_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![student_id, course_id, filename, submitted_at.to_rfc3339()],
            )?;
            Ok(Assignment {
                id: conn.last_insert_rowid(),
                student_id,
                course_id,
                filename,
                submitted_at,
            })
        })
        .await
    }

    /// Submissions by one student, newest first
    pub async fn assignments_by_student(&self, student_id: i64) -> AppResult<Vec<Assignment>> {
        self.call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, student_id, course_id, filename, submitted_at
                 FROM assignments WHERE student_id = ?1
                 ORDER BY submitted_at DESC, id DESC",
            )?;
            let rows = stmt.query_map(params![student_id], row_to_assignment)?;
            let mut assignments = Vec::new();
            for assignment in rows {
                assignments.push(assignment?);
            }
            Ok(assignments)
        })
        .await
    }
}
