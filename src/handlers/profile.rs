// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{exam_result::MyResultEntry, user::MeResponse},
    utils::jwt::Claims,
};

/// Get current user's profile and statistics.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let me = sqlx::query_as::<_, MeResponse>(
        r#"
        SELECT
            u.id, u.name, u.phone, u.school, u.points, u.level, u.created_at,
            (SELECT COUNT(*) FROM results r WHERE r.user_id = u.id) AS exams_taken
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(me))
}

/// Full result history of the current user, newest first.
pub async fn get_my_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let results = sqlx::query_as::<_, MyResultEntry>(
        r#"
        SELECT
            r.id, r.set_id, s.name AS set_name, s.category,
            r.score, r.total_marks, r.submitted_at
        FROM results r
        JOIN question_sets s ON s.id = r.set_id
        WHERE r.user_id = $1
        ORDER BY r.submitted_at DESC, r.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch results for user {}: {:?}", user_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(results))
}
