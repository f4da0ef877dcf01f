//! Borrowing lifecycle endpoints

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::borrowing::{
        BorrowingDetails, BorrowingQuery, CreateBorrowing, ReturnBorrowing, UpdateBorrowing,
    },
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List borrowings (members see only their own)
#[utoipa::path(
    get,
    path = "/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(BorrowingQuery),
    responses(
        (status = 200, description = "List of borrowings", body = PaginatedResponse<BorrowingDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_borrowings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<BorrowingQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowingDetails>>> {
    let (page, per_page, offset) = state.config.page_bounds(query.page, query.per_page);
    let (borrowings, total) = state
        .services
        .borrowings
        .list(&caller, &query, per_page, offset)
        .await?;

    Ok(Json(PaginatedResponse::new(borrowings, total, page, per_page)))
}

/// Get a borrowing
#[utoipa::path(
    get,
    path = "/borrowings/{id}",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Borrowing details", body = BorrowingDetails),
        (status = 403, description = "Borrowing of another member"),
        (status = 404, description = "Borrowing not found")
    )
)]
pub async fn get_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowingDetails>> {
    let borrowing = state.services.borrowings.get(&caller, id).await?;
    Ok(Json(borrowing))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowing,
    responses(
        (status = 201, description = "Book borrowed", body = BorrowingDetails),
        (status = 400, description = "Invalid due date or missing member"),
        (status = 404, description = "Book or member not found"),
        (status = 409, description = "No copy available or already borrowed by this member")
    )
)]
pub async fn create_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(request): Json<CreateBorrowing>,
) -> AppResult<(StatusCode, Json<BorrowingDetails>)> {
    let borrowing = state.services.borrowings.create(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(borrowing)))
}

/// Return a borrowed book
#[utoipa::path(
    put,
    path = "/borrowings/{id}/return",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    request_body(content = ReturnBorrowing, description = "Optional fine override (admin only)"),
    responses(
        (status = 200, description = "Book returned", body = BorrowingDetails),
        (status = 400, description = "Malformed request body"),
        (status = 403, description = "Borrowing of another member"),
        (status = 404, description = "Borrowing not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
    body: Bytes,
) -> AppResult<Json<BorrowingDetails>> {
    let request = parse_return_body(&body)?;

    let borrowing = state
        .services
        .borrowings
        .return_borrowing(&caller, id, request)
        .await?;
    Ok(Json(borrowing))
}

/// Change due date or fine of a borrowing
#[utoipa::path(
    put,
    path = "/borrowings/{id}",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    request_body = UpdateBorrowing,
    responses(
        (status = 200, description = "Borrowing updated", body = BorrowingDetails),
        (status = 400, description = "Invalid due date or fine"),
        (status = 404, description = "Borrowing not found")
    )
)]
pub async fn update_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateBorrowing>,
) -> AppResult<Json<BorrowingDetails>> {
    caller.require_admin()?;

    let borrowing = state.services.borrowings.update(id, request).await?;
    Ok(Json(borrowing))
}

/// Delete a borrowing record
#[utoipa::path(
    delete,
    path = "/borrowings/{id}",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 204, description = "Borrowing deleted"),
        (status = 404, description = "Borrowing not found")
    )
)]
pub async fn delete_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    caller.require_admin()?;

    state.services.borrowings.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The return body is optional; an empty body means no fine override
fn parse_return_body(body: &[u8]) -> AppResult<ReturnBorrowing> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ReturnBorrowing::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_empty_return_body_means_no_override() {
        assert_eq!(parse_return_body(b"").unwrap().fine_amount, None);
        assert_eq!(parse_return_body(b" \n").unwrap().fine_amount, None);
        assert_eq!(parse_return_body(b"{}").unwrap().fine_amount, None);
    }

    #[test]
    fn test_return_body_with_fine() {
        let request = parse_return_body(br#"{"fine_amount": "2.50"}"#).unwrap();
        assert_eq!(request.fine_amount, Some(Decimal::new(25, 1)));
    }

    #[test]
    fn test_malformed_return_body_rejected() {
        assert!(matches!(
            parse_return_body(br#"{"fine_amount": "abc"}"#),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(parse_return_body(b"not json"), Err(AppError::Validation(_))));
    }
}
