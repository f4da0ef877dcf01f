//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    auth, books, borrowings, dashboard, health, members, reminders, subscriptions, testimonials,
    users,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Neighborhood Library API",
        version = "1.0.0",
        description = "Book lending REST API: catalog, members, borrowings and testimonials"
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::signup,
        auth::login,
        auth::signin,
        auth::me,
        auth::get_profile,
        auth::update_profile,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Members
        members::list_members,
        members::get_member,
        members::create_member,
        members::update_member,
        members::delete_member,
        members::get_member_account,
        members::get_member_borrowings,
        // Borrowings
        borrowings::list_borrowings,
        borrowings::get_borrowing,
        borrowings::create_borrowing,
        borrowings::return_borrowing,
        borrowings::update_borrowing,
        borrowings::delete_borrowing,
        // Users
        users::list_users,
        users::get_user,
        users::update_user,
        // Dashboard
        dashboard::get_dashboard,
        dashboard::get_stats,
        dashboard::get_user_dashboard,
        // Testimonials
        testimonials::list_testimonials,
        testimonials::get_testimonial,
        testimonials::create_testimonial,
        testimonials::update_testimonial,
        testimonials::delete_testimonial,
        // Subscriptions
        subscriptions::subscribe,
        subscriptions::list_subscriptions,
        // Reminders
        reminders::run_reminders,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::AuthResponse,
            auth::UserInfo,
            auth::ProfileResponse,
            crate::models::user::Signup,
            crate::models::user::UpdateProfile,
            // Books
            crate::models::book::Book,
            crate::models::book::BookShort,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Members
            crate::models::member::Member,
            crate::models::member::MemberShort,
            crate::models::member::CreateMember,
            crate::models::member::UpdateMember,
            crate::models::member::MemberAccount,
            // Borrowings
            crate::models::borrowing::BorrowingStatus,
            crate::models::borrowing::BorrowingDetails,
            crate::models::borrowing::CreateBorrowing,
            crate::models::borrowing::ReturnBorrowing,
            crate::models::borrowing::UpdateBorrowing,
            // Users
            crate::models::user::Role,
            crate::models::user::User,
            crate::models::user::UpdateUser,
            // Dashboard
            dashboard::LibraryStats,
            dashboard::DashboardResponse,
            dashboard::UserDashboardResponse,
            // Testimonials
            crate::models::testimonial::TestimonialDetails,
            crate::models::testimonial::CreateTestimonial,
            crate::models::testimonial::UpdateTestimonial,
            // Subscriptions
            crate::models::subscription::Subscription,
            crate::models::subscription::CreateSubscription,
            // Reminders
            crate::services::reminders::ReminderReport,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication and profile"),
        (name = "books", description = "Book catalog"),
        (name = "members", description = "Member management"),
        (name = "borrowings", description = "Borrowing lifecycle"),
        (name = "users", description = "User account administration"),
        (name = "dashboard", description = "Dashboard and statistics"),
        (name = "testimonials", description = "Reader testimonials"),
        (name = "subscriptions", description = "Newsletter subscriptions"),
        (name = "reminders", description = "Due-date reminders")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_lifecycle_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/borrowings"));
        assert!(doc.paths.paths.contains_key("/borrowings/{id}/return"));
        assert!(doc.paths.paths.contains_key("/members/{id}/borrowings"));
        assert!(doc.paths.paths.contains_key("/members/{id}/user"));
        assert!(doc.paths.paths.contains_key("/auth/signin"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
