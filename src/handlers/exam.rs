// src/handlers/exam.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, codes},
    models::{
        submission::{ScoreHistoryEntry, SubmitAnswersRequest},
        test::{PublicTest, Question, SyllabusItem, Test},
        user::Role,
    },
    services::{availability, scoring},
    utils::jwt::Claims,
};

async fn find_test(pool: &SqlitePool, test_id: i64) -> Result<Test, AppError> {
    sqlx::query_as::<_, Test>(
        "SELECT id, title, date, start_time, end_time, duration_minutes, total_marks, \
         created_by, created_at
         FROM tests
         WHERE id = ?",
    )
    .bind(test_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Test not found".to_string()))
}

pub(crate) async fn load_questions(
    pool: &SqlitePool,
    test_id: i64,
) -> Result<Vec<Question>, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, test_id, position, text, options, correct_answer
         FROM questions
         WHERE test_id = ?
         ORDER BY position",
    )
    .bind(test_id)
    .fetch_all(pool)
    .await?;

    Ok(questions)
}

pub(crate) async fn load_syllabus(
    pool: &SqlitePool,
    test_id: i64,
) -> Result<Vec<SyllabusItem>, AppError> {
    let syllabus = sqlx::query_as::<_, SyllabusItem>(
        "SELECT id, test_id, position, topic, description
         FROM syllabus_items
         WHERE test_id = ?
         ORDER BY position",
    )
    .bind(test_id)
    .fetch_all(pool)
    .await?;

    Ok(syllabus)
}

async fn find_score(
    pool: &SqlitePool,
    student_id: i64,
    test_id: i64,
) -> Result<Option<i64>, AppError> {
    let score = sqlx::query_scalar::<_, i64>(
        "SELECT score FROM submissions WHERE student_id = ? AND test_id = ?",
    )
    .bind(student_id)
    .bind(test_id)
    .fetch_optional(pool)
    .await?;

    Ok(score)
}

/// Ensures the caller still has a student record. Tokens outlive
/// accounts, so a deleted student must surface as NotFound, not as a
/// dangling submission row.
async fn ensure_student_exists(pool: &SqlitePool, student_id: i64) -> Result<(), AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ? AND role = ?")
        .bind(student_id)
        .bind(Role::Student)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

    Ok(())
}

/// Lists every test whose scheduled window contains the current UTC
/// instant, redacted for student eyes. An empty list is a normal
/// response, not an error.
pub async fn active_tests(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();

    let scheduled_today = sqlx::query_as::<_, Test>(
        "SELECT id, title, date, start_time, end_time, duration_minutes, total_marks, \
         created_by, created_at
         FROM tests
         WHERE date = ?
         ORDER BY start_time",
    )
    .bind(now.date_naive())
    .fetch_all(&pool)
    .await?;

    let mut active = Vec::new();
    for test in scheduled_today {
        if !availability::is_open(&test, now) {
            continue;
        }
        let questions = load_questions(&pool, test.id).await?;
        let syllabus = load_syllabus(&pool, test.id).await?;
        active.push(PublicTest::from_parts(test, questions, syllabus));
    }

    Ok(Json(active))
}

/// Fetches one test for taking.
///
/// The availability gate runs first; a test already submitted by this
/// student is rejected with 409 so the client can show the score page
/// instead. The payload never contains answer keys.
pub async fn get_exam(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let test = find_test(&pool, test_id).await?;

    availability::check(&test, Utc::now())?;

    if find_score(&pool, student_id, test_id).await?.is_some() {
        return Err(AppError::conflict(
            codes::ALREADY_SUBMITTED,
            "Test already submitted",
        ));
    }

    let questions = load_questions(&pool, test_id).await?;
    let syllabus = load_syllabus(&pool, test_id).await?;

    Ok(Json(PublicTest::from_parts(test, questions, syllabus)))
}

/// Submits a student's answers and records the score.
///
/// Scoring is position-aligned exact string matching. The first
/// submission per (student, test) wins; any later one is rejected with
/// 409 and the stored score stays untouched. The UNIQUE constraint on
/// submissions makes the insert atomic, so two racing submits cannot
/// both land — the pre-check below only produces the friendly error.
pub async fn submit_exam(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
    Json(req): Json<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;

    let test = find_test(&pool, test_id).await?;
    ensure_student_exists(&pool, student_id).await?;

    if find_score(&pool, student_id, test_id).await?.is_some() {
        return Err(AppError::conflict(
            codes::ALREADY_SUBMITTED,
            "Test already submitted",
        ));
    }

    let questions = load_questions(&pool, test_id).await?;
    let score = scoring::score_answers(&questions, &req.answers);

    sqlx::query("INSERT INTO submissions (student_id, test_id, score) VALUES (?, ?, ?)")
        .bind(student_id)
        .bind(test_id)
        .bind(score)
        .execute(&pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict(codes::ALREADY_SUBMITTED, "Test already submitted")
            }
            _ => {
                tracing::error!("Failed to record submission: {:?}", e);
                AppError::InternalServerError(e.to_string())
            }
        })?;

    tracing::info!(
        student_id,
        test_id = test.id,
        score,
        "submission recorded"
    );

    Ok(Json(serde_json::json!({
        "score": score,
        "total_questions": questions.len(),
    })))
}

/// Returns the caller's score for one test, or 404 if they have not
/// submitted it yet.
pub async fn my_result(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;

    find_test(&pool, test_id).await?;

    let score = find_score(&pool, student_id, test_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No result for this test".to_string()))?;

    Ok(Json(serde_json::json!({
        "test_id": test_id,
        "score": score,
    })))
}

/// Returns the caller's full score history, newest test first.
pub async fn my_scores(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;

    let history = sqlx::query_as::<_, ScoreHistoryEntry>(
        "SELECT s.test_id, t.title, t.date, s.score
         FROM submissions s
         JOIN tests t ON t.id = s.test_id
         WHERE s.student_id = ?
         ORDER BY t.date DESC, s.id DESC",
    )
    .bind(student_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(history))
}
