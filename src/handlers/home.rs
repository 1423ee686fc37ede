// src/handlers/home.rs

use axum::{Json, response::IntoResponse};
use serde_json::json;

use crate::error::AppError;

/// Welcome message at the API root.
pub async fn index() -> impl IntoResponse {
    Json(json!({ "message": "Welcome to the MCQ Exam API!" }))
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}
