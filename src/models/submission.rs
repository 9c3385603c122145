// src/models/submission.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'submissions' table in the database.
/// One row per (student, test); rows are never updated or deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub student_id: i64,
    pub test_id: i64,
    pub score: i64,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Aggregated struct for displaying the leaderboard.
/// Represents a row joined from `users` and `submissions`.
#[derive(Debug, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub student_id: i64,
    pub name: String,
    pub enrollment_number: Option<String>,
    pub score: i64,
}

/// A student who has not submitted a given test.
#[derive(Debug, Serialize, FromRow)]
pub struct AbsenteeEntry {
    pub student_id: i64,
    pub name: String,
    pub enrollment_number: Option<String>,
    pub email: String,
}

/// One row of a student's own score history.
#[derive(Debug, Serialize, FromRow)]
pub struct ScoreHistoryEntry {
    pub test_id: i64,
    pub title: String,
    pub date: chrono::NaiveDate,
    pub score: i64,
}

/// DTO for submitting answers to a test.
///
/// Answers are matched to questions by array position; `null` marks a
/// skipped question. Entries beyond the question count are ignored.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<Option<String>>,
}
