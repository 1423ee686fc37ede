// src/state.rs

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::config::Config;

/// Shared request state: the database pool and the validated startup configuration.
/// Nothing in here is mutated after startup; handlers pull the part they need via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        Self { pool, config }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
