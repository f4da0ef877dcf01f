//! Reader testimonial model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::book::BookShort;

/// Testimonial row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Testimonial {
    pub id: i32,
    pub book_id: i32,
    pub member_id: Option<i32>,
    pub reader_name: String,
    pub rating: i32,
    pub comment: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Testimonial joined with its book
#[derive(Debug, Clone, FromRow)]
pub struct TestimonialRow {
    #[sqlx(flatten)]
    pub testimonial: Testimonial,
    pub book_title: String,
    pub book_author: String,
    pub book_isbn: Option<String>,
}

impl From<TestimonialRow> for TestimonialDetails {
    fn from(row: TestimonialRow) -> Self {
        let t = row.testimonial;
        TestimonialDetails {
            book: BookShort {
                id: t.book_id,
                title: row.book_title,
                author: row.book_author,
                isbn: row.book_isbn,
            },
            id: t.id,
            book_id: t.book_id,
            member_id: t.member_id,
            reader_name: t.reader_name,
            rating: t.rating,
            comment: t.comment,
            is_approved: t.is_approved,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Testimonial for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TestimonialDetails {
    pub id: i32,
    pub book_id: i32,
    pub member_id: Option<i32>,
    pub reader_name: String,
    pub rating: i32,
    pub comment: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub book: BookShort,
}

/// Testimonial query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct TestimonialQuery {
    pub book_id: Option<i32>,
    /// Defaults to true; only admins may list unapproved testimonials
    pub approved_only: Option<bool>,
    pub page: Option<i64>,
    #[serde(alias = "limit")]
    pub per_page: Option<i64>,
}

/// Create testimonial request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTestimonial {
    pub book_id: i32,
    #[validate(length(min = 1, max = 255, message = "Reader name must be 1-255 characters"), custom(function = "crate::models::not_blank"))]
    pub reader_name: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(min = 1, message = "Comment cannot be empty"), custom(function = "crate::models::not_blank"))]
    pub comment: String,
    /// Admins may attach the testimonial to any member
    pub member_id: Option<i32>,
}

/// Update testimonial request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTestimonial {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    #[validate(length(min = 1, message = "Comment cannot be empty"), custom(function = "crate::models::not_blank"))]
    pub comment: Option<String>,
    /// Admin only
    pub is_approved: Option<bool>,
}
