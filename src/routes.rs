// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, exam, results},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, student_middleware, super_admin_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, exams, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (database pool + config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new().route("/login", post(auth::login));

    // Student test-taking surface. The leaderboard is merged in
    // separately: it is readable by any authenticated role.
    let exam_routes = Router::new()
        .route("/active", get(exam::active_tests))
        .route("/scores", get(exam::my_scores))
        .route("/{id}", get(exam::get_exam))
        .route("/{id}/submit", post(exam::submit_exam))
        .route("/{id}/result", get(exam::my_result))
        .layer(middleware::from_fn(student_middleware))
        .merge(Router::new().route("/{id}/leaderboard", get(results::get_leaderboard)))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route(
            "/students",
            get(admin::list_students).post(admin::create_student),
        )
        .route("/tests", get(admin::list_tests).post(admin::create_test))
        .route("/tests/{id}", get(admin::get_test_detail))
        .route("/tests/{id}/absentees", get(results::get_absentees))
        .layer(middleware::from_fn(admin_middleware))
        // Creating admins is reserved for the super-admin.
        .merge(
            Router::new()
                .route("/admins", post(admin::create_admin))
                .layer(middleware::from_fn(super_admin_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/exams", exam_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
