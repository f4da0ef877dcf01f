//! Reminder endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    services::{borrowings::BorrowingsService, reminders::ReminderReport},
};

use super::AuthenticatedUser;

/// Send due-soon and overdue reminder emails now
#[utoipa::path(
    post,
    path = "/reminders/run",
    tag = "reminders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reminder pass finished", body = ReminderReport),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn run_reminders(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> AppResult<Json<ReminderReport>> {
    caller.require_admin()?;

    tracing::info!(user_id = caller.user_id, "Reminder pass requested");
    let report = state.services.reminders.run(BorrowingsService::today()).await?;
    Ok(Json(report))
}
