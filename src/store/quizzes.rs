//! Quiz and quiz-result rows
//!
//! Options are stored as a JSON array in a TEXT column.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use super::{parse_ts, Store};
use crate::models::{AppResult, Quiz, QuizResult};

fn row_to_quiz(row: &Row) -> rusqlite::Result<Quiz> {
    let options_raw: String = row.get(2)?;
    let options: Vec<String> = serde_json::from_str(&options_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Quiz {
        id: row.get(0)?,
        question: row.get(1)?,
        options,
        answer: row.get(3)?,
    })
}

fn row_to_result(row: &Row) -> rusqlite::Result<QuizResult> {
    Ok(QuizResult {
        id: row.get(0)?,
        student_id: row.get(1)?,
        score: row.get(2)?,
        total: row.get(3)?,
        taken_at: parse_ts(4, row.get(4)?)?,
    })
}

impl Store {
    pub async fn create_quiz(
        &self,
        question: String,
        options: Vec<String>,
        answer: String,
    ) -> AppResult<Quiz> {
        self.call(move |conn| {
            let options_json = serde_json::to_string(&options)?;
            conn.execute(
                "INSERT INTO quizzes (question, options, answer) VALUES (?1, ?2, ?3)",
                params![question, options_json, answer],
            )?;
            Ok(Quiz {
                id: conn.last_insert_rowid(),
                question,
                options,
                answer,
            })
        })
        .await
    }

    /// Every quiz, answers included; callers strip answers before the wire
    pub async fn list_quizzes(&self) -> AppResult<Vec<Quiz>> {
        self.call(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, question, options, answer FROM quizzes ORDER BY id")?;
            let rows = stmt.query_map([], row_to_quiz)?;
            let mut quizzes = Vec::new();
            for quiz in rows {
                quizzes.push(quiz?);
            }
            Ok(quizzes)
        })
        .await
    }

    /// Grading denominator: the full question bank, not just answered ones
    pub async fn count_quizzes(&self) -> AppResult<i64> {
        self.call(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM quizzes", [], |row| row.get(0))?;
            Ok(n)
        })
        .await
    }

    pub async fn record_quiz_result(
        &self,
        student_id: i64,
        score: i64,
        total: i64,
        taken_at: DateTime<Utc>,
    ) -> AppResult<QuizResult> {
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO quiz_results (student_id, score, total, taken_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![student_id, score, total, taken_at.to_rfc3339()],
            )?;
            Ok(QuizResult {
                id: conn.last_insert_rowid(),
                student_id,
                score,
                total,
                taken_at,
            })
        })
        .await
    }

    /// A student's attempt history, newest first
    pub async fn quiz_results_by_student(&self, student_id: i64) -> AppResult<Vec<QuizResult>> {
        self.call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, student_id, score, total, taken_at
                 FROM quiz_results WHERE student_id = ?1
                 ORDER BY taken_at DESC, id DESC",
            )?;
            let rows = stmt.query_map(params![student_id], row_to_result)?;
            let mut results = Vec::new();
            for result in rows {
                results.push(result?);
            }
            Ok(results)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[tokio::test]
    async fn test_quiz_round_trip_preserves_options() {
        let store = Store::open_in_memory().unwrap();
        store
            .create_quiz(
                "Best knot for a harness tie-in?".into(),
                vec![
                    "Figure-eight follow-through".into(),
                    "Bowline, with backup".into(),
                    "Clove hitch".into(),
                ],
                "Figure-eight follow-through".into(),
            )
            .await
            .unwrap();

        let all = store.list_quizzes().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].options.len(), 3);
        // Options with commas survive, unlike a comma-joined column
        assert_eq!(all[0].options[1], "Bowline, with backup");
        assert_eq!(store.count_quizzes().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_results_history() {
        let store = Store::open_in_memory().unwrap();
        let s = store
            .create_user("S".into(), "s@x.y".into(), "h".into(), Role::Student, None)
            .await
            .unwrap();

        let earlier = Utc::now() - chrono::Duration::days(1);
        store.record_quiz_result(s.id, 1, 3, earlier).await.unwrap();
        store
            .record_quiz_result(s.id, 3, 3, Utc::now())
            .await
            .unwrap();

        let history = store.quiz_results_by_student(s.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].score, 3);
        assert_eq!(history[1].score, 1);
        assert!(store
            .quiz_results_by_student(9999)
            .await
            .unwrap()
            .is_empty());
    }
}
