// src/models/question.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::error::AppError;

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;
const MAX_OPTION_LEN: usize = 255;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i32,

    pub set_id: i32,

    pub question_text: String,

    /// List of options (e.g., ["Dhaka", "Khulna", "Sylhet", "Rajshahi"]).
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// The text of the correct option.
    pub correct_option: String,
}

/// DTO for sending a question to a student (excludes the correct option).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: i32,
    pub question_text: String,
    pub options: Vec<String>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text,
            options: q.options.0,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub set_id: i32,
    #[validate(length(min = 1, max = 5000))]
    pub question_text: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 255))]
    pub correct_option: String,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 5000))]
    pub question_text: Option<String>,
    #[validate(custom(function = validate_options))]
    pub options: Option<Vec<String>>,
    #[validate(length(min = 1, max = 255))]
    pub correct_option: Option<String>,
}

impl UpdateQuestionRequest {
    pub fn is_empty(&self) -> bool {
        self.question_text.is_none() && self.options.is_none() && self.correct_option.is_none()
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() < MIN_OPTIONS || options.len() > MAX_OPTIONS {
        return Err(validator::ValidationError::new("options_count_out_of_range"));
    }
    let mut seen = HashSet::new();
    for opt in options {
        let opt = opt.trim();
        if opt.is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > MAX_OPTION_LEN {
            return Err(validator::ValidationError::new("option_too_long"));
        }
        if !seen.insert(opt) {
            return Err(validator::ValidationError::new("duplicate_option"));
        }
    }
    Ok(())
}

/// Trims surrounding whitespace from every option.
pub fn normalize_options(options: Vec<String>) -> Vec<String> {
    options.into_iter().map(|o| o.trim().to_string()).collect()
}

/// Ensures the answer key names one of the listed options.
pub fn check_answer_key(options: &[String], correct_option: &str) -> Result<(), AppError> {
    if options.iter().any(|o| o == correct_option) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "correct_option '{}' is not one of the options",
            correct_option
        )))
    }
}
