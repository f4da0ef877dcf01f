//! API handlers for the library REST endpoints

pub mod auth;
pub mod books;
pub mod borrowings;
pub mod dashboard;
pub mod health;
pub mod members;
pub mod openapi;
pub mod reminders;
pub mod subscriptions;
pub mod testimonials;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::user::{Caller, UserClaims},
    AppState,
};

/// Extractor for the authenticated caller.
/// The token is validated and the user is re-read from the database.
pub struct AuthenticatedUser(pub Caller);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let caller = caller_from_header(auth_header, state).await?;
        Ok(AuthenticatedUser(caller))
    }
}

/// Extractor for endpoints that are public but show more to signed-in callers.
/// A missing header is anonymous; a bad token is still rejected.
pub struct OptionalUser(pub Option<Caller>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match parts.headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()) {
            Some(auth_header) => Ok(OptionalUser(Some(caller_from_header(auth_header, state).await?))),
            None => Ok(OptionalUser(None)),
        }
    }
}

async fn caller_from_header(auth_header: &str, state: &AppState) -> Result<Caller, AppError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

    let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Authentication(e.to_string()))?;

    state.services.auth.resolve_caller(&claims).await
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Items of the requested page
    pub items: Vec<T>,
    /// Total number of matching items
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        Self {
            items,
            total,
            page,
            per_page,
        }
    }
}
