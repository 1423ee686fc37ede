// src/models/user.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::phone::validate_phone;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i32,

    pub name: String,

    /// Unique login identifier.
    pub phone: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    pub school: Option<String>,

    /// Accumulated exam score across all submissions.
    pub points: i32,

    pub level: i32,

    pub created_at: NaiveDateTime,
}

/// Profile of the current user.
#[derive(Debug, Serialize, FromRow)]
pub struct MeResponse {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub school: Option<String>,
    pub points: i32,
    pub level: i32,
    pub created_at: NaiveDateTime,
    pub exams_taken: i64,
}

/// DTO for creating a new user (Signup).
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100, message = "Name length must be between 1 and 100 characters."))]
    pub name: String,
    #[validate(custom(function = validate_phone))]
    pub phone: String,
    #[validate(length(min = 6, max = 128, message = "Password length must be between 6 and 128 characters."))]
    pub password: String,
    #[validate(length(max = 100, message = "School name must be at most 100 characters."))]
    pub school: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 11))]
    pub phone: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}
