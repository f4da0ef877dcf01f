//! Neighborhood Library
//!
//! REST JSON API for a small lending library: book catalog, members,
//! borrowings with copy accounting, testimonials and due-date reminders.

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod api;
pub mod config;
pub mod error;
pub mod lending;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.allowed_origins);

    let api_routes = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/signup", post(api::auth::signup))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/signin", post(api::auth::signin))
        .route("/auth/me", get(api::auth::me))
        .route(
            "/profile",
            get(api::auth::get_profile).put(api::auth::update_profile),
        )
        // Books
        .route(
            "/books",
            get(api::books::list_books).post(api::books::create_book),
        )
        .route(
            "/books/:id",
            get(api::books::get_book)
                .put(api::books::update_book)
                .delete(api::books::delete_book),
        )
        // Members
        .route(
            "/members",
            get(api::members::list_members).post(api::members::create_member),
        )
        .route(
            "/members/:id",
            get(api::members::get_member)
                .put(api::members::update_member)
                .delete(api::members::delete_member),
        )
        .route("/members/:id/user", get(api::members::get_member_account))
        .route(
            "/members/:id/borrowings",
            get(api::members::get_member_borrowings),
        )
        // Borrowings
        .route(
            "/borrowings",
            get(api::borrowings::list_borrowings).post(api::borrowings::create_borrowing),
        )
        .route(
            "/borrowings/:id",
            get(api::borrowings::get_borrowing)
                .put(api::borrowings::update_borrowing)
                .delete(api::borrowings::delete_borrowing),
        )
        .route(
            "/borrowings/:id/return",
            put(api::borrowings::return_borrowing),
        )
        // Users
        .route("/users", get(api::users::list_users))
        .route(
            "/users/:id",
            get(api::users::get_user).put(api::users::update_user),
        )
        // Dashboard
        .route("/dashboard", get(api::dashboard::get_dashboard))
        .route("/stats", get(api::dashboard::get_stats))
        .route("/user/dashboard", get(api::dashboard::get_user_dashboard))
        // Testimonials
        .route(
            "/testimonials",
            get(api::testimonials::list_testimonials).post(api::testimonials::create_testimonial),
        )
        .route(
            "/testimonials/:id",
            get(api::testimonials::get_testimonial)
                .put(api::testimonials::update_testimonial)
                .delete(api::testimonials::delete_testimonial),
        )
        // Subscriptions
        .route(
            "/subscriptions",
            get(api::subscriptions::list_subscriptions).post(api::subscriptions::subscribe),
        )
        // Reminders
        .route("/reminders/run", post(api::reminders::run_reminders))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api", api_routes)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// CORS for the configured origins; any origin when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}
