// src/routes.rs

use axum::{
    Router,
    http::{Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{admin, auth, exam, home, leaderboard, profile},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public routes: root, signup/login, live exam, leaderboard.
/// * Bearer-protected routes: submission, history, profile.
/// * Admin routes: bearer + admin role.
/// * Applies global middleware (Trace, CORS) and injects `AppState`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let public_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/exams/live", get(exam::get_live_exam))
        .route("/leaderboard", get(leaderboard::get_leaderboard));

    let user_routes = Router::new()
        .route("/exams/submit", post(exam::submit_exam))
        .route("/my-results", get(profile::get_my_results))
        .route("/me", get(profile::get_me))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route(
            "/question-sets",
            get(admin::list_question_sets).post(admin::create_question_set),
        )
        .route(
            "/question-sets/{id}",
            get(admin::get_question_set)
                .put(admin::update_question_set)
                .delete(admin::delete_question_set),
        )
        .route("/questions", post(admin::add_question))
        .route(
            "/questions/{id}",
            put(admin::update_question).delete(admin::delete_question),
        )
        .route("/results", get(admin::list_results))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/", get(home::index))
        .nest("/api", public_routes.merge(user_routes))
        .nest("/api/admin", admin_routes)
        .fallback(home::not_found)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
