//! Dashboard and statistics endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{book::Book, borrowing::BorrowingDetails, testimonial::TestimonialDetails},
    services::borrowings::BorrowingsService,
};

use super::AuthenticatedUser;

/// Library-wide counters
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct LibraryStats {
    pub total_books: i64,
    pub total_members: i64,
    pub total_borrowings: i64,
    /// Borrowings not yet returned
    pub active_borrowings: i64,
    /// Active borrowings past their due date
    pub overdue_books: i64,
    /// Copies on the shelf across all books
    pub available_books: i64,
}

/// Public dashboard
#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub stats: LibraryStats,
    pub recent_books: Vec<Book>,
    pub recent_testimonials: Vec<TestimonialDetails>,
}

/// Caller's dashboard
#[derive(Serialize, ToSchema)]
pub struct UserDashboardResponse {
    /// Books currently held, soonest due first
    pub active_borrowings: Vec<BorrowingDetails>,
    pub overdue_count: usize,
}

/// Public dashboard
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard", body = DashboardResponse)
    )
)]
pub async fn get_dashboard(State(state): State<crate::AppState>) -> AppResult<Json<DashboardResponse>> {
    let dashboard = state
        .services
        .dashboard
        .dashboard(BorrowingsService::today())
        .await?;
    Ok(Json(dashboard))
}

/// Library statistics
#[utoipa::path(
    get,
    path = "/stats",
    tag = "dashboard",
    responses(
        (status = 200, description = "Statistics", body = LibraryStats)
    )
)]
pub async fn get_stats(State(state): State<crate::AppState>) -> AppResult<Json<LibraryStats>> {
    let stats = state.services.dashboard.stats(BorrowingsService::today()).await?;
    Ok(Json(stats))
}

/// Caller's current borrowings
#[utoipa::path(
    get,
    path = "/user/dashboard",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User dashboard", body = UserDashboardResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_user_dashboard(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> AppResult<Json<UserDashboardResponse>> {
    let active_borrowings = state.services.borrowings.active_for_caller(&caller).await?;
    let overdue_count = active_borrowings.iter().filter(|b| b.is_overdue).count();

    Ok(Json(UserDashboardResponse {
        active_borrowings,
        overdue_count,
    }))
}
