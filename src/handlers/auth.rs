// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    db,
    error::{AppError, is_unique_violation},
    models::user::{LoginRequest, SignupRequest, User},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

const INVALID_CREDENTIALS: &str = "Invalid phone or password";

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// The configured admin phone is reserved for the seeded account.
/// Returns 201 Created and the user object (excluding password hash).
pub async fn signup(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name cannot be blank".to_string()));
    }
    if config.is_admin_phone(&payload.phone) {
        return Err(AppError::Conflict(format!(
            "Phone '{}' is already registered",
            payload.phone
        )));
    }

    let hashed_password = hash_password(&payload.password)?;
    let school = payload
        .school
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, phone, password_hash, school)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, phone, password_hash, school, points, level, created_at
        "#,
    )
    .bind(payload.name.trim())
    .bind(&payload.phone)
    .bind(hashed_password)
    .bind(school)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Phone '{}' is already registered", payload.phone))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(user_id = user.id, "New user registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Unknown phone and wrong password yield the same 401 so phones cannot be probed.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut user = find_by_phone(&pool, &payload.phone).await?;
    if user.is_none() && config.is_admin_phone(&payload.phone) {
        // Startup seeding did not run, e.g. the database came up late.
        db::seed_admin(&pool, &config).await?;
        user = find_by_phone(&pool, &payload.phone).await?;
    }
    let user = user.ok_or(AppError::AuthError(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
    }

    let token = sign_jwt(
        user.id,
        config.role_for_phone(&user.phone),
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "expires_in": config.jwt_expiration,
        "user": user
    })))
}

async fn find_by_phone(pool: &PgPool, phone: &str) -> Result<Option<User>, AppError> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, phone, password_hash, school, points, level, created_at
        FROM users
        WHERE phone = $1
        "#,
    )
    .bind(phone)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })
}
