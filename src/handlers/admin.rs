// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        exam_result::AdminResultEntry,
        question::{
            CreateQuestionRequest, Question, UpdateQuestionRequest, check_answer_key,
            normalize_options,
        },
        question_set::{
            CreateQuestionSetRequest, QuestionSet, QuestionSetDetail, QuestionSetSummary,
            UpdateQuestionSetRequest,
        },
    },
};

const SET_COLUMNS: &str = "id, name, category, is_active, exam_time_minutes, created_at";
const QUESTION_COLUMNS: &str = "id, set_id, question_text, options, correct_option";

async fn fetch_set(pool: &PgPool, id: i32) -> Result<QuestionSet, AppError> {
    sqlx::query_as::<_, QuestionSet>(&format!(
        "SELECT {} FROM question_sets WHERE id = $1",
        SET_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Question set not found".to_string()))
}

/// Creates a new question set.
/// Creating it active deactivates every other set.
pub async fn create_question_set(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuestionSetRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let is_active = payload.is_active.unwrap_or(false);
    let mut tx = pool.begin().await?;

    if is_active {
        sqlx::query("UPDATE question_sets SET is_active = FALSE WHERE is_active = TRUE")
            .execute(&mut *tx)
            .await?;
    }

    let set = sqlx::query_as::<_, QuestionSet>(&format!(
        r#"
        INSERT INTO question_sets (name, category, is_active, exam_time_minutes)
        VALUES ($1, $2, $3, COALESCE($4, 30))
        RETURNING {}
        "#,
        SET_COLUMNS
    ))
    .bind(payload.name.trim())
    .bind(&payload.category)
    .bind(is_active)
    .bind(payload.exam_time_minutes)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question set: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tx.commit().await?;
    tracing::info!(set_id = set.id, is_active, "Question set created");

    Ok((StatusCode::CREATED, Json(set)))
}

/// Lists all question sets with their question counts, newest first.
pub async fn list_question_sets(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let sets = sqlx::query_as::<_, QuestionSetSummary>(
        r#"
        SELECT
            s.id, s.name, s.category, s.is_active, s.exam_time_minutes, s.created_at,
            (SELECT COUNT(*) FROM questions q WHERE q.set_id = s.id) AS question_count
        FROM question_sets s
        ORDER BY s.created_at DESC, s.id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list question sets: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(sets))
}

/// Returns a question set with all of its questions, answers included.
pub async fn get_question_set(
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let set = fetch_set(&pool, id).await?;

    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {} FROM questions WHERE set_id = $1 ORDER BY id",
        QUESTION_COLUMNS
    ))
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(QuestionSetDetail { set, questions }))
}

/// Updates a question set by ID.
///
/// Setting `is_active` to true deactivates all other sets in the same
/// transaction, so at most one set is live.
pub async fn update_question_set(
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateQuestionSetRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload.is_empty() {
        return Ok(Json(fetch_set(&pool, id).await?));
    }

    let mut tx = pool.begin().await?;

    if payload.is_active == Some(true) {
        sqlx::query("UPDATE question_sets SET is_active = FALSE WHERE is_active = TRUE AND id <> $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE question_sets SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name.trim().to_string());
    }

    if let Some(category) = payload.category {
        separated.push("category = ");
        separated.push_bind_unseparated(category);
    }

    if let Some(minutes) = payload.exam_time_minutes {
        separated.push("exam_time_minutes = ");
        separated.push_bind_unseparated(minutes);
    }

    if let Some(is_active) = payload.is_active {
        separated.push("is_active = ");
        separated.push_bind_unseparated(is_active);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING ");
    builder.push(SET_COLUMNS);

    let set = builder
        .build_query_as::<QuestionSet>()
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update question set: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AppError::NotFound("Question set not found".to_string()))?;

    tx.commit().await?;
    tracing::info!(set_id = set.id, is_active = set.is_active, "Question set updated");

    Ok(Json(set))
}

/// Deletes a question set by ID.
/// Its questions and results are removed by the foreign key cascade.
pub async fn delete_question_set(
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM question_sets WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question set: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question set not found".to_string()));
    }

    tracing::info!(set_id = id, "Question set deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Adds a question to an existing set.
pub async fn add_question(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let options = normalize_options(payload.options);
    let correct_option = payload.correct_option.trim().to_string();
    check_answer_key(&options, &correct_option)?;

    fetch_set(&pool, payload.set_id).await?;

    let question = sqlx::query_as::<_, Question>(&format!(
        r#"
        INSERT INTO questions (set_id, question_text, options, correct_option)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        QUESTION_COLUMNS
    ))
    .bind(payload.set_id)
    .bind(&payload.question_text)
    .bind(SqlJson(options))
    .bind(correct_option)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Updates a question by ID.
/// The merged row must still list its correct option among the options.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let existing = sqlx::query_as::<_, Question>(&format!(
        "SELECT {} FROM questions WHERE id = $1",
        QUESTION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    if payload.is_empty() {
        return Ok(Json(existing));
    }

    let question_text = payload.question_text.unwrap_or(existing.question_text);
    let options = payload
        .options
        .map(normalize_options)
        .unwrap_or(existing.options.0);
    let correct_option = payload
        .correct_option
        .map(|c| c.trim().to_string())
        .unwrap_or(existing.correct_option);
    check_answer_key(&options, &correct_option)?;

    let question = sqlx::query_as::<_, Question>(&format!(
        r#"
        UPDATE questions
        SET question_text = $1, options = $2, correct_option = $3
        WHERE id = $4
        RETURNING {}
        "#,
        QUESTION_COLUMNS
    ))
    .bind(question_text)
    .bind(SqlJson(options))
    .bind(correct_option)
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(question))
}

/// Deletes a question by ID.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Query parameters for listing results.
#[derive(Debug, Deserialize)]
pub struct ResultsFilter {
    pub set_id: Option<i32>,
}

/// Lists submitted results with user and set info, newest first.
pub async fn list_results(
    State(pool): State<PgPool>,
    Query(filter): Query<ResultsFilter>,
) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, AdminResultEntry>(
        r#"
        SELECT
            r.id, r.user_id, u.name AS user_name, u.phone, u.school,
            r.set_id, s.name AS set_name,
            r.score, r.total_marks, r.submitted_at
        FROM results r
        JOIN users u ON u.id = r.user_id
        JOIN question_sets s ON s.id = r.set_id
        WHERE ($1::INT IS NULL OR r.set_id = $1)
        ORDER BY r.submitted_at DESC, r.id DESC
        "#,
    )
    .bind(filter.set_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(results))
}
