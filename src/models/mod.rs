//! Data models for the library

pub mod book;
pub mod borrowing;
pub mod member;
pub mod subscription;
pub mod testimonial;
pub mod user;

use validator::ValidationError;

/// Rejects strings that are empty once surrounding whitespace is trimmed
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

// Re-export commonly used types
pub use book::{Book, BookShort};
pub use borrowing::{Borrowing, BorrowingDetails, BorrowingStatus};
pub use member::{Member, MemberShort};
pub use subscription::Subscription;
pub use testimonial::{Testimonial, TestimonialDetails};
pub use user::{Caller, Role, User, UserClaims};
