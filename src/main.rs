// src/main.rs

use std::net::SocketAddr;
use std::time::Duration;

use mcq_exam::config::Config;
use mcq_exam::db;
use mcq_exam::routes;
use mcq_exam::state::AppState;
use sqlx::PgPool;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const SETUP_RETRIES: u32 = 5;

#[tokio::main]
async fn main() {
    // Load configuration from environment (and .env, if present)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let pool = match db::create_pool(&config) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Invalid DATABASE_URL: {}", e);
            std::process::exit(1);
        }
    };

    prepare_database(&pool, &config).await;

    let app = routes::create_router(AppState::new(pool.clone(), config.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on {}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    pool.close().await;
    tracing::info!("Server stopped");
}

/// Creates tables and seeds the admin account.
///
/// The database may still be starting, so the schema step is retried a few
/// times. If it never succeeds the server keeps running without guaranteed tables.
async fn prepare_database(pool: &PgPool, config: &Config) {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match db::setup_database(pool).await {
            Ok(()) => break,
            Err(_) if attempt < SETUP_RETRIES => {
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", attempt);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            Err(e) => {
                tracing::error!(
                    "Database setup failed after {} attempts, continuing without it: {}",
                    attempt,
                    e
                );
                return;
            }
        }
    }

    if let Err(e) = db::seed_admin(pool, config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
