//! Testimonial endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::testimonial::{CreateTestimonial, TestimonialDetails, TestimonialQuery, UpdateTestimonial},
};

use super::{AuthenticatedUser, OptionalUser, PaginatedResponse};

/// List testimonials (approved only, unless an admin asks otherwise)
#[utoipa::path(
    get,
    path = "/testimonials",
    tag = "testimonials",
    params(TestimonialQuery),
    responses(
        (status = 200, description = "List of testimonials", body = PaginatedResponse<TestimonialDetails>)
    )
)]
pub async fn list_testimonials(
    State(state): State<crate::AppState>,
    OptionalUser(caller): OptionalUser,
    Query(query): Query<TestimonialQuery>,
) -> AppResult<Json<PaginatedResponse<TestimonialDetails>>> {
    let (page, per_page, offset) = state.config.page_bounds(query.page, query.per_page);
    let (testimonials, total) = state
        .services
        .testimonials
        .list(caller.as_ref(), &query, per_page, offset)
        .await?;

    Ok(Json(PaginatedResponse::new(testimonials, total, page, per_page)))
}

/// Get a testimonial
#[utoipa::path(
    get,
    path = "/testimonials/{id}",
    tag = "testimonials",
    params(
        ("id" = i32, Path, description = "Testimonial ID")
    ),
    responses(
        (status = 200, description = "Testimonial", body = TestimonialDetails),
        (status = 404, description = "Testimonial not found")
    )
)]
pub async fn get_testimonial(
    State(state): State<crate::AppState>,
    OptionalUser(caller): OptionalUser,
    Path(id): Path<i32>,
) -> AppResult<Json<TestimonialDetails>> {
    let testimonial = state.services.testimonials.get(caller.as_ref(), id).await?;
    Ok(Json(testimonial))
}

/// Submit a testimonial
#[utoipa::path(
    post,
    path = "/testimonials",
    tag = "testimonials",
    security(("bearer_auth" = [])),
    request_body = CreateTestimonial,
    responses(
        (status = 201, description = "Testimonial submitted for approval", body = TestimonialDetails),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_testimonial(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(request): Json<CreateTestimonial>,
) -> AppResult<(StatusCode, Json<TestimonialDetails>)> {
    let testimonial = state.services.testimonials.create(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

/// Edit or approve a testimonial
#[utoipa::path(
    put,
    path = "/testimonials/{id}",
    tag = "testimonials",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Testimonial ID")
    ),
    request_body = UpdateTestimonial,
    responses(
        (status = 200, description = "Testimonial updated", body = TestimonialDetails),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Testimonial not found")
    )
)]
pub async fn update_testimonial(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateTestimonial>,
) -> AppResult<Json<TestimonialDetails>> {
    let testimonial = state.services.testimonials.update(&caller, id, request).await?;
    Ok(Json(testimonial))
}

/// Delete a testimonial
#[utoipa::path(
    delete,
    path = "/testimonials/{id}",
    tag = "testimonials",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Testimonial ID")
    ),
    responses(
        (status = 204, description = "Testimonial deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Testimonial not found")
    )
)]
pub async fn delete_testimonial(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.testimonials.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
