// src/handlers/results.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::submission::{AbsenteeEntry, LeaderboardEntry},
    utils::jwt::Claims,
};

/// Hard ceiling on leaderboard size; `?limit=` may lower it, never raise it.
const LEADERBOARD_CAP: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<i64>,
}

async fn ensure_test_exists(pool: &SqlitePool, test_id: i64) -> Result<(), AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM tests WHERE id = ?")
        .bind(test_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Test not found".to_string()))?;

    Ok(())
}

/// Retrieves the ranked results for one test.
///
/// Scores descend; equal scores keep submission insertion order, so
/// repeated reads return the same ranking.
pub async fn get_leaderboard(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    if !claims.role.can_view_leaderboard() {
        return Err(AppError::forbidden(
            crate::error::codes::WRONG_ROLE,
            "Leaderboard access denied",
        ));
    }

    ensure_test_exists(&pool, test_id).await?;

    let limit = params.limit.unwrap_or(LEADERBOARD_CAP).clamp(1, LEADERBOARD_CAP);

    let leaderboard = sqlx::query_as::<_, LeaderboardEntry>(
        "SELECT u.id AS student_id, u.name, u.enrollment_number, s.score
         FROM submissions s
         JOIN users u ON u.id = s.student_id
         WHERE s.test_id = ?
         ORDER BY s.score DESC, s.id ASC
         LIMIT ?",
    )
    .bind(test_id)
    .bind(limit)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(leaderboard))
}

/// Lists every student with no submission for the given test.
///
/// Operational/admin report; a full scan over the student population
/// is acceptable here.
pub async fn get_absentees(
    State(pool): State<SqlitePool>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_test_exists(&pool, test_id).await?;

    let absentees = sqlx::query_as::<_, AbsenteeEntry>(
        "SELECT u.id AS student_id, u.name, u.enrollment_number, u.email
         FROM users u
         WHERE u.role = 'student'
           AND NOT EXISTS (
               SELECT 1 FROM submissions s
               WHERE s.student_id = u.id AND s.test_id = ?
           )
         ORDER BY u.id",
    )
    .bind(test_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch absentee list: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(absentees))
}
