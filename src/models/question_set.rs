// src/models/question_set.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::question::Question;

/// Allowed values of `question_sets.category`.
pub const CATEGORIES: [&str; 4] = ["daily", "weekly", "monthly", "subject"];

/// Represents the 'question_sets' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuestionSet {
    pub id: i32,
    pub name: String,
    /// One of `CATEGORIES`.
    pub category: String,
    /// Whether this set is currently served by the live exam endpoint.
    pub is_active: bool,
    pub exam_time_minutes: i32,
    pub created_at: NaiveDateTime,
}

/// Admin listing row.
#[derive(Debug, Serialize, FromRow)]
pub struct QuestionSetSummary {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub is_active: bool,
    pub exam_time_minutes: i32,
    pub created_at: NaiveDateTime,
    pub question_count: i64,
}

/// A set with its full question list, answers included. Admin only.
#[derive(Debug, Serialize)]
pub struct QuestionSetDetail {
    #[serde(flatten)]
    pub set: QuestionSet,
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionSetRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom(function = validate_category))]
    pub category: String,
    #[validate(range(min = 1, max = 600))]
    pub exam_time_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

/// DTO for updating a question set. Fields are optional.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateQuestionSetRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(custom(function = validate_category))]
    pub category: Option<String>,
    #[validate(range(min = 1, max = 600))]
    pub exam_time_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateQuestionSetRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.exam_time_minutes.is_none()
            && self.is_active.is_none()
    }
}

/// Restricts the category to the four known kinds.
fn validate_category(category: &str) -> Result<(), validator::ValidationError> {
    if !CATEGORIES.contains(&category) {
        return Err(validator::ValidationError::new("invalid_category"));
    }
    Ok(())
}
