//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Accounts
        .route("/accounts", post(handlers::register_account))
        .route("/account", get(handlers::get_account))
        .route("/account/program", put(handlers::select_program))
        // Choices
        .route(
            "/account/choice",
            post(handlers::add_choice).delete(handlers::remove_choice),
        )
        .route("/account/choices", get(handlers::get_choices))
        // Catalog
        .route("/programs", get(handlers::list_programs))
        .route("/programs/{code}/profiles", get(handlers::list_program_profiles))
        .route("/schedules/{schedule_id}", get(handlers::get_schedule))
        .route("/courses/{course_code}", get(handlers::get_course))
        .route(
            "/courses/{course_code}/extra-info",
            get(handlers::get_extra_course_info),
        )
        .route("/schedulers/{scheduler_id}", get(handlers::get_scheduler))
        .route(
            "/profiles/{profile}/semesters/{semester}/courses",
            get(handlers::get_term_courses),
        )
        .route("/catalog/load", post(handlers::load_catalog));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        // Catalog batches for a whole faculty run to a few MB.
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
