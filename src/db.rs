// src/db.rs

use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{config::Config, error::AppError, utils::hash::hash_password};

/// Idempotent schema. Executed in order on every startup.
pub const SCHEMA: [&str; 7] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        phone VARCHAR(11) UNIQUE NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        school VARCHAR(100),
        points INTEGER NOT NULL DEFAULT 0,
        level INTEGER NOT NULL DEFAULT 1,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS question_sets (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        category VARCHAR(50) NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT FALSE,
        exam_time_minutes INTEGER NOT NULL DEFAULT 30,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS questions (
        id SERIAL PRIMARY KEY,
        set_id INTEGER NOT NULL REFERENCES question_sets(id) ON DELETE CASCADE,
        question_text TEXT NOT NULL,
        options JSONB NOT NULL,
        correct_option VARCHAR(255) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS results (
        id SERIAL PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        set_id INTEGER NOT NULL REFERENCES question_sets(id) ON DELETE CASCADE,
        score INTEGER NOT NULL,
        total_marks INTEGER NOT NULL,
        submitted_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_questions_set_id ON questions (set_id)",
    "CREATE INDEX IF NOT EXISTS idx_results_user_id ON results (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_results_set_submitted ON results (set_id, submitted_at)",
];

/// Builds the connection pool without opening a connection.
///
/// Connections are established on first use, so an unreachable database
/// surfaces as request errors instead of a startup crash.
pub fn create_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_lazy(&config.database_url)
}

/// Ensures all tables exist.
///
/// Statements run one by one on a single connection. A failing statement
/// stops the run; the ones before it stay applied.
pub async fn setup_database(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await.map_err(|e| {
        tracing::error!("Could not connect to the database. Aborting setup: {}", e);
        e
    })?;

    for statement in SCHEMA {
        if let Err(e) = sqlx::query(statement).execute(&mut *conn).await {
            tracing::error!("Error during table creation: {}", e);
            return Err(e);
        }
    }

    tracing::info!("Tables created or already exist.");
    Ok(())
}

/// Creates the configured administrator account if it does not exist yet.
///
/// Safe to call repeatedly and concurrently. Login calls it again when the
/// startup attempt was skipped because the database was down.
pub async fn seed_admin(pool: &PgPool, config: &Config) -> Result<(), AppError> {
    let Some((phone, password)) = config.admin_credentials() else {
        return Ok(());
    };

    let exists: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE phone = $1")
        .bind(phone)
        .fetch_optional(pool)
        .await?;

    if exists.is_none() {
        tracing::info!("Seeding admin user: {}", phone);
        let hashed_password = hash_password(password)?;

        sqlx::query(
            "INSERT INTO users (name, phone, password_hash) VALUES ($1, $2, $3) ON CONFLICT (phone) DO NOTHING",
        )
        .bind("Administrator")
        .bind(phone)
        .bind(hashed_password)
        .execute(pool)
        .await?;
        tracing::info!("Admin user created successfully.");
    }

    Ok(())
}
