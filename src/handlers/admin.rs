// src/handlers/admin.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{SqlitePool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::{AppError, codes},
    handlers::exam::{load_questions, load_syllabus},
    models::{
        test::{CreateTestRequest, Test, TestDetail},
        user::{CreateAdminRequest, CreateStudentRequest, Role, StudentSummary},
    },
    utils::{hash::hash_password, html::clean_html, jwt::Claims},
};

fn map_insert_error(e: sqlx::Error, what: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::conflict(
            codes::DUPLICATE_FIELD,
            format!("{} already exists", what),
        ),
        _ => {
            tracing::error!("Failed to create {}: {:?}", what, e);
            AppError::InternalServerError(e.to_string())
        }
    }
}

/// Creates an admin account.
/// Super-admin only.
pub async fn create_admin(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateAdminRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&hashed_password)
    .bind(Role::Admin)
    .fetch_one(&pool)
    .await
    .map_err(|e| map_insert_error(e, "An account with this email"))?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Creates a student account.
/// Admin only.
pub async fn create_student(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password, role, enrollment_number)
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&hashed_password)
    .bind(Role::Student)
    .bind(&payload.enrollment_number)
    .fetch_one(&pool)
    .await
    .map_err(|e| map_insert_error(e, "A student with this email or enrollment number"))?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Lists all student accounts.
/// Admin only.
pub async fn list_students(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let students = sqlx::query_as::<_, StudentSummary>(
        "SELECT id, name, email, enrollment_number
         FROM users
         WHERE role = 'student'
         ORDER BY id",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(students))
}

/// Creates a test with its questions and syllabus in one request.
/// Admin only.
///
/// Question and syllabus text is sanitized before storage since it is
/// later rendered to students. Questions keep their payload order as
/// `position`; answers are matched against that order at submission
/// time.
pub async fn create_test(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let created_by = claims.user_id()?;

    let mut tx = pool.begin().await?;

    let test_id: i64 = sqlx::query_scalar(
        "INSERT INTO tests (title, date, start_time, end_time, duration_minutes, total_marks, created_by)
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&payload.title)
    .bind(payload.date)
    .bind(payload.start_time)
    .bind(payload.end_time)
    .bind(payload.duration_minutes)
    .bind(payload.total_marks)
    .bind(created_by)
    .fetch_one(&mut *tx)
    .await?;

    for (position, question) in payload.questions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO questions (test_id, position, text, options, correct_answer)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(test_id)
        .bind(position as i64)
        .bind(clean_html(&question.text))
        .bind(SqlJson(&question.options))
        .bind(&question.correct_answer)
        .execute(&mut *tx)
        .await?;
    }

    for (position, item) in payload.syllabus.iter().enumerate() {
        sqlx::query(
            "INSERT INTO syllabus_items (test_id, position, topic, description)
             VALUES (?, ?, ?, ?)",
        )
        .bind(test_id)
        .bind(position as i64)
        .bind(&item.topic)
        .bind(clean_html(&item.description))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(test_id, created_by, "test created");

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": test_id }))))
}

/// Lists all tests, newest scheduled first.
/// Admin only.
pub async fn list_tests(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let tests = sqlx::query_as::<_, Test>(
        "SELECT id, title, date, start_time, end_time, duration_minutes, total_marks, \
         created_by, created_at
         FROM tests
         ORDER BY date DESC, start_time DESC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(tests))
}

/// Fetches one test with questions (answer keys included) and syllabus.
/// Admin only; this is the one read path that may carry answer keys.
pub async fn get_test_detail(
    State(pool): State<SqlitePool>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let test = sqlx::query_as::<_, Test>(
        "SELECT id, title, date, start_time, end_time, duration_minutes, total_marks, \
         created_by, created_at
         FROM tests
         WHERE id = ?",
    )
    .bind(test_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Test not found".to_string()))?;

    let questions = load_questions(&pool, test_id).await?;
    let syllabus = load_syllabus(&pool, test_id).await?;

    Ok(Json(TestDetail {
        test,
        questions,
        syllabus,
    }))
}
