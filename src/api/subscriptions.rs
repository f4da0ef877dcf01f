//! Newsletter subscription endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::subscription::{CreateSubscription, Subscription, SubscriptionQuery},
};

use super::{AuthenticatedUser, OptionalUser, PaginatedResponse};

/// Subscribe an email to the newsletter
#[utoipa::path(
    post,
    path = "/subscriptions",
    tag = "subscriptions",
    request_body = CreateSubscription,
    responses(
        (status = 201, description = "Subscribed", body = Subscription),
        (status = 400, description = "Invalid email"),
        (status = 409, description = "Already subscribed")
    )
)]
pub async fn subscribe(
    State(state): State<crate::AppState>,
    OptionalUser(caller): OptionalUser,
    Json(request): Json<CreateSubscription>,
) -> AppResult<(StatusCode, Json<Subscription>)> {
    let subscription = state
        .services
        .subscriptions
        .subscribe(caller.as_ref(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// List subscriptions
#[utoipa::path(
    get,
    path = "/subscriptions",
    tag = "subscriptions",
    security(("bearer_auth" = [])),
    params(SubscriptionQuery),
    responses(
        (status = 200, description = "List of subscriptions", body = PaginatedResponse<Subscription>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_subscriptions(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<SubscriptionQuery>,
) -> AppResult<Json<PaginatedResponse<Subscription>>> {
    caller.require_admin()?;

    let (page, per_page, offset) = state.config.page_bounds(query.page, query.per_page);
    let (subscriptions, total) = state.services.subscriptions.list(per_page, offset).await?;

    Ok(Json(PaginatedResponse::new(subscriptions, total, page, per_page)))
}
