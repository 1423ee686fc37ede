// src/models/exam_result.rs

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::question::PublicQuestion;

/// Represents the 'results' table in the database.
/// One row per exam submission.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExamResult {
    pub id: i32,
    pub user_id: i32,
    pub set_id: i32,
    pub score: i32,
    pub total_marks: i32,
    pub submitted_at: NaiveDateTime,
}

/// A caller's own result, joined with the set it belongs to.
#[derive(Debug, Serialize, FromRow)]
pub struct MyResultEntry {
    pub id: i32,
    pub set_id: i32,
    pub set_name: String,
    pub category: String,
    pub score: i32,
    pub total_marks: i32,
    pub submitted_at: NaiveDateTime,
}

/// Admin result listing row, joined with user and set identity.
#[derive(Debug, Serialize, FromRow)]
pub struct AdminResultEntry {
    pub id: i32,
    pub user_id: i32,
    pub user_name: String,
    pub phone: String,
    pub school: Option<String>,
    pub set_id: i32,
    pub set_name: String,
    pub score: i32,
    pub total_marks: i32,
    pub submitted_at: NaiveDateTime,
}

/// Aggregated struct for displaying the leaderboard.
#[derive(Debug, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: i32,
    pub name: String,
    pub school: Option<String>,
    pub score: i64,
    pub level: i32,
}

/// DTO for returning the live exam.
#[derive(Debug, Serialize)]
pub struct LiveExamResponse {
    pub set_id: i32,
    pub name: String,
    pub category: String,
    pub exam_time_minutes: i32,
    pub total_questions: usize,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for submitting an exam attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitExamRequest {
    pub set_id: i32,

    /// User's answers map.
    /// Key: Question ID
    /// Value: selected option text, or null when left unanswered.
    pub answers: HashMap<i32, Option<String>>,
}

/// Per-question feedback returned after submission.
#[derive(Debug, Serialize, PartialEq)]
pub struct AnswerReview {
    pub question_id: i32,
    pub question_text: String,
    pub your_answer: Option<String>,
    pub correct_option: String,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmitExamResponse {
    pub result_id: i32,
    pub set_id: i32,
    pub score: i32,
    pub total_marks: i32,
    pub points: i32,
    pub level: i32,
    pub review: Vec<AnswerReview>,
}
