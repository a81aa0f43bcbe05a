//! Type definitions for the Belay learning platform
//! Core records for accounts, courses, assignments, quizzes and contact intake

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role; decides which dashboard and routes a session may reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular learner: courses, submissions, quizzes
    Student,
    /// Staff: uploads content, sees platform stats
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Registered account as stored in the `users` table
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Salted iterated digest, never the raw password
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    /// False until the mailed verification code is confirmed
    pub verified: bool,
    #[serde(skip_serializing)]
    pub verification_code: Option<String>,
}

/// Course with its attached content files
///
/// The `files` column is stored as one comma-joined string; the record
/// carries the split list and the store converts at the boundary.
#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub files: Vec<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Split the comma-joined column into individual filenames
    pub fn file_list(files: &str) -> Vec<String> {
        files
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// Join filenames back into the column format
    pub fn join_files(names: &[String]) -> String {
        names.join(",")
    }
}

/// One student upload against a course
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub filename: String,
    pub submitted_at: DateTime<Utc>,
}

/// Single-question quiz with its accepted answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
    /// Never serialized to students; see [`Quiz::public`]
    pub answer: String,
}

/// Quiz as shown to students: no answer field
#[derive(Debug, Clone, Serialize)]
pub struct QuizPublic {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
}

impl Quiz {
    /// Strip the answer for the student-facing listing
    pub fn public(&self) -> QuizPublic {
        QuizPublic {
            id: self.id,
            question: self.question.clone(),
            options: self.options.clone(),
        }
    }

    /// Case-insensitive, whitespace-trimmed answer comparison
    pub fn accepts(&self, given: &str) -> bool {
        normalize_answer(given) == normalize_answer(&self.answer)
    }
}

/// Trim and lowercase an answer before comparison
pub fn normalize_answer(s: &str) -> String {
    s.trim().to_lowercase()
}

/// A graded quiz attempt
#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    pub id: i64,
    pub student_id: i64,
    pub score: i64,
    pub total: i64,
    pub taken_at: DateTime<Utc>,
}

/// Contact-form submission from the marketing site
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::from_str("student"), Ok(Role::Student));
        assert_eq!(Role::from_str("admin"), Ok(Role::Admin));
        assert!(Role::from_str("teacher").is_err());
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn test_file_list_handles_blanks() {
        assert_eq!(
            Course::file_list("a.pdf, b.mp4,,c.pdf"),
            vec!["a.pdf", "b.mp4", "c.pdf"]
        );
        assert!(Course::file_list("").is_empty());
    }

    #[test]
    fn test_answer_normalization() {
        let quiz = Quiz {
            id: 1,
            question: "2+2?".into(),
            options: vec!["3".into(), "4".into()],
            answer: "4".into(),
        };
        assert!(quiz.accepts("  4 "));
        assert!(quiz.accepts("4"));
        assert!(!quiz.accepts("3"));

        let text = Quiz {
            id: 2,
            question: "Capital of France?".into(),
            options: vec!["Paris".into(), "Lyon".into()],
            answer: "Paris".into(),
        };
        assert!(text.accepts("paris"));
        assert!(text.accepts(" PARIS "));
    }

    #[test]
    fn test_quiz_public_hides_answer() {
        let quiz = Quiz {
            id: 7,
            question: "q".into(),
            options: vec!["a".into()],
            answer: "a".into(),
        };
        let json = serde_json::to_value(quiz.public()).unwrap();
        assert!(json.get("answer").is_none());
        assert_eq!(json["id"], 7);
    }
}
