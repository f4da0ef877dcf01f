//! Member management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        borrowing::{BorrowingDetails, BorrowingQuery},
        member::{CreateMember, Member, MemberAccount, MemberQuery, UpdateMember},
    },
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List members with search and pagination
#[utoipa::path(
    get,
    path = "/members",
    tag = "members",
    security(("bearer_auth" = [])),
    params(MemberQuery),
    responses(
        (status = 200, description = "List of members", body = PaginatedResponse<Member>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_members(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<MemberQuery>,
) -> AppResult<Json<PaginatedResponse<Member>>> {
    caller.require_admin()?;

    let (page, per_page, offset) = state.config.page_bounds(query.page, query.per_page);
    let (members, total) = state.services.members.search(&query, per_page, offset).await?;

    Ok(Json(PaginatedResponse::new(members, total, page, per_page)))
}

/// Get member details by ID
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "members",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member details", body = Member),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Member>> {
    caller.require_admin()?;

    let member = state.services.members.get_by_id(id).await?;
    Ok(Json(member))
}

/// Register a member, optionally with a login
#[utoipa::path(
    post,
    path = "/members",
    tag = "members",
    security(("bearer_auth" = [])),
    request_body = CreateMember,
    responses(
        (status = 201, description = "Member created", body = Member),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn create_member(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(member): Json<CreateMember>,
) -> AppResult<(StatusCode, Json<Member>)> {
    caller.require_admin()?;

    let created = state.services.members.create(member).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a member
#[utoipa::path(
    put,
    path = "/members/{id}",
    tag = "members",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID")
    ),
    request_body = UpdateMember,
    responses(
        (status = 200, description = "Member updated", body = Member),
        (status = 404, description = "Member not found"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn update_member(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(member): Json<UpdateMember>,
) -> AppResult<Json<Member>> {
    caller.require_admin()?;

    let updated = state.services.members.update(&caller, id, member).await?;
    Ok(Json(updated))
}

/// Delete a member and its login
#[utoipa::path(
    delete,
    path = "/members/{id}",
    tag = "members",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 204, description = "Member deleted"),
        (status = 404, description = "Member not found"),
        (status = 409, description = "Member has active borrowings")
    )
)]
pub async fn delete_member(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    caller.require_admin()?;

    state.services.members.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Login account status of a member
#[utoipa::path(
    get,
    path = "/members/{id}/user",
    tag = "members",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Account status", body = MemberAccount),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member_account(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MemberAccount>> {
    caller.require_admin()?;

    let account = state.services.members.account(id).await?;
    Ok(Json(account))
}

/// Borrowing history of a member
#[utoipa::path(
    get,
    path = "/members/{id}/borrowings",
    tag = "members",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID"),
        BorrowingQuery
    ),
    responses(
        (status = 200, description = "Member's borrowings", body = PaginatedResponse<BorrowingDetails>),
        (status = 403, description = "Not this member"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member_borrowings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
    Query(query): Query<BorrowingQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowingDetails>>> {
    let (page, per_page, offset) = state.config.page_bounds(query.page, query.per_page);
    let (borrowings, total) = state
        .services
        .borrowings
        .list_for_member(&caller, id, &query, per_page, offset)
        .await?;

    Ok(Json(PaginatedResponse::new(borrowings, total, page, per_page)))
}
