// src/handlers/leaderboard.rs

use std::str::FromStr;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::{
    config::{DEFAULT_LEADERBOARD_LIMIT, MAX_LEADERBOARD_LIMIT},
    error::AppError,
    models::exam_result::LeaderboardEntry,
};

/// Window the leaderboard aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeframe {
    /// Result scores since midnight.
    Today,
    /// Result scores over the last 7 days.
    Weekly,
    /// Accumulated user points.
    #[default]
    AllTime,
}

impl FromStr for Timeframe {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" | "daily" => Ok(Timeframe::Today),
            "weekly" | "week" => Ok(Timeframe::Weekly),
            "all-time" | "all_time" | "alltime" | "all" => Ok(Timeframe::AllTime),
            other => Err(AppError::BadRequest(format!(
                "Unknown timeframe '{}', expected today, weekly or all-time",
                other
            ))),
        }
    }
}

impl Timeframe {
    /// Lower bound on `results.submitted_at`, or `None` when ranking by points.
    fn since(self) -> Option<&'static str> {
        match self {
            Timeframe::Today => Some("date_trunc('day', LOCALTIMESTAMP)"),
            Timeframe::Weekly => Some("LOCALTIMESTAMP - INTERVAL '7 days'"),
            Timeframe::AllTime => None,
        }
    }
}

/// Query parameters for the leaderboard.
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub timeframe: Option<String>,
    pub limit: Option<i64>,
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT)
}

/// Returns the top performers for the requested timeframe.
/// Ties share a rank.
pub async fn get_leaderboard(
    State(pool): State<PgPool>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let timeframe = match params.timeframe.as_deref() {
        Some(raw) => raw.parse::<Timeframe>()?,
        None => Timeframe::default(),
    };
    let limit = clamp_limit(params.limit);

    let sql = match timeframe.since() {
        Some(since) => format!(
            r#"
            SELECT
                RANK() OVER (ORDER BY t.score DESC) AS rank,
                u.id AS user_id,
                u.name,
                u.school,
                t.score,
                u.level
            FROM (
                SELECT user_id, SUM(score)::BIGINT AS score
                FROM results
                WHERE submitted_at >= {}
                GROUP BY user_id
            ) t
            JOIN users u ON u.id = t.user_id
            ORDER BY t.score DESC, u.id
            LIMIT $1
            "#,
            since
        ),
        None => r#"
            SELECT
                RANK() OVER (ORDER BY points DESC) AS rank,
                id AS user_id,
                name,
                school,
                points::BIGINT AS score,
                level
            FROM users
            WHERE points > 0
            ORDER BY points DESC, id
            LIMIT $1
            "#
        .to_string(),
    };

    let leaderboard = sqlx::query_as::<_, LeaderboardEntry>(&sql)
        .bind(limit)
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch leaderboard: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(leaderboard))
}
