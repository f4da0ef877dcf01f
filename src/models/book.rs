//! Book (catalog title) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Book row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short book representation embedded in borrowings and testimonials
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
}

/// Book query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Case-insensitive search in title, author and ISBN
    pub search: Option<String>,
    /// Only books with at least one copy on the shelf
    pub available_only: Option<bool>,
    pub page: Option<i64>,
    #[serde(alias = "limit")]
    pub per_page: Option<i64>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_copies", skip_on_field_errors = true))]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"), custom(function = "crate::models::not_blank"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"), custom(function = "crate::models::not_blank"))]
    pub author: String,
    #[validate(length(max = 20, message = "ISBN must be at most 20 characters"))]
    pub isbn: Option<String>,
    #[validate(range(min = 1000, max = 2100, message = "Published year must be between 1000 and 2100"))]
    pub published_year: Option<i32>,
    #[serde(default = "default_copies")]
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub total_copies: i32,
    /// Defaults to `total_copies`
    #[validate(range(min = 0, message = "Available copies cannot be negative"))]
    pub available_copies: Option<i32>,
}

fn default_copies() -> i32 {
    1
}

fn validate_create_copies(book: &CreateBook) -> Result<(), ValidationError> {
    match book.available_copies {
        Some(available) if available > book.total_copies => {
            let mut err = ValidationError::new("available_copies");
            err.message = Some("available_copies cannot exceed total_copies".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Update book request. Available copies follow total copies and are not set directly.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"), custom(function = "crate::models::not_blank"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"), custom(function = "crate::models::not_blank"))]
    pub author: Option<String>,
    #[validate(length(max = 20, message = "ISBN must be at most 20 characters"))]
    pub isbn: Option<String>,
    #[validate(range(min = 1000, max = 2100, message = "Published year must be between 1000 and 2100"))]
    pub published_year: Option<i32>,
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub total_copies: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(total: i32, available: Option<i32>) -> CreateBook {
        CreateBook {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: None,
            published_year: Some(1965),
            total_copies: total,
            available_copies: available,
        }
    }

    #[test]
    fn test_create_book_copy_bounds() {
        assert!(book(2, None).validate().is_ok());
        assert!(book(2, Some(2)).validate().is_ok());
        assert!(book(2, Some(3)).validate().is_err());
        assert!(book(0, None).validate().is_err());
        assert!(book(2, Some(-1)).validate().is_err());
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut blank = book(1, None);
        blank.title = "   ".to_string();
        let errors = blank.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn test_total_copies_defaults_to_one() {
        let parsed: CreateBook =
            serde_json::from_str(r#"{"title":"Emma","author":"Jane Austen"}"#).unwrap();
        assert_eq!(parsed.total_copies, 1);
        assert_eq!(parsed.available_copies, None);
    }
}
