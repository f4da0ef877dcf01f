//! Borrowing (loan of one copy) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::book::BookShort;
use super::member::MemberShort;
use crate::lending::overdue;

/// Status as exposed by the API. Only `borrowed` and `returned` are ever stored;
/// `overdue` is derived from the dates when the record is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowingStatus {
    Borrowed,
    Returned,
    Overdue,
}

/// Borrowing row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Borrowing {
    pub id: i32,
    pub book_id: i32,
    /// `None` once the member has been deleted
    pub member_id: Option<i32>,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub fine_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Borrowing {
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }
}

/// Borrowing joined with its book and member, as selected by the repository
#[derive(Debug, Clone, FromRow)]
pub struct BorrowingDetailsRow {
    pub id: i32,
    pub book_id: i32,
    pub member_id: Option<i32>,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub fine_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub book_title: String,
    pub book_author: String,
    pub book_isbn: Option<String>,
    pub member_name: Option<String>,
    pub member_email: Option<String>,
}

impl BorrowingDetailsRow {
    pub fn into_details(self, today: NaiveDate) -> BorrowingDetails {
        let status = overdue::status_of(self.return_date, self.due_date, today);
        let member = match (self.member_id, self.member_name, self.member_email) {
            (Some(id), Some(name), Some(email)) => Some(MemberShort { id, name, email }),
            _ => None,
        };

        BorrowingDetails {
            id: self.id,
            book_id: self.book_id,
            member_id: self.member_id,
            borrow_date: self.borrow_date,
            due_date: self.due_date,
            return_date: self.return_date,
            status,
            is_overdue: status == BorrowingStatus::Overdue,
            days_overdue: overdue::days_overdue(self.return_date, self.due_date, today),
            fine_amount: self.fine_amount,
            created_at: self.created_at,
            updated_at: self.updated_at,
            book: BookShort {
                id: self.book_id,
                title: self.book_title,
                author: self.book_author,
                isbn: self.book_isbn,
            },
            member,
        }
    }
}

/// Borrowing with full details for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowingDetails {
    pub id: i32,
    pub book_id: i32,
    pub member_id: Option<i32>,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: BorrowingStatus,
    pub is_overdue: bool,
    pub days_overdue: i64,
    #[schema(value_type = String)]
    pub fine_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub book: BookShort,
    pub member: Option<MemberShort>,
}

/// Borrowing query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BorrowingQuery {
    pub status: Option<BorrowingStatus>,
    pub member_id: Option<i32>,
    pub book_id: Option<i32>,
    pub page: Option<i64>,
    #[serde(alias = "limit")]
    pub per_page: Option<i64>,
}

/// Repository-level filter, with the member restriction already resolved
#[derive(Debug, Clone, Default)]
pub struct BorrowingFilter {
    pub status: Option<BorrowingStatus>,
    pub member_id: Option<i32>,
    pub book_id: Option<i32>,
}

/// Create borrowing request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBorrowing {
    pub book_id: i32,
    /// Required for admins; members always borrow for themselves
    pub member_id: Option<i32>,
    /// Defaults to today plus the configured loan period
    pub due_date: Option<NaiveDate>,
}

/// Borrowing to insert, once the target member and dates are resolved
#[derive(Debug, Clone)]
pub struct NewBorrowing {
    pub book_id: i32,
    pub member_id: i32,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// Return request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReturnBorrowing {
    /// Fine override (admin only); computed from the days late otherwise
    #[schema(value_type = Option<String>)]
    pub fine_amount: Option<Decimal>,
}

/// Update borrowing request (admin only)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBorrowing {
    pub due_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub fine_amount: Option<Decimal>,
}

/// Active borrowing due for a reminder email
#[derive(Debug, Clone, FromRow)]
pub struct DueReminder {
    pub id: i32,
    pub due_date: NaiveDate,
    pub book_title: String,
    pub member_name: String,
    pub member_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(member: Option<(i32, &str)>, return_date: Option<NaiveDate>) -> BorrowingDetailsRow {
        let now = Utc::now();
        BorrowingDetailsRow {
            id: 1,
            book_id: 2,
            member_id: member.map(|(id, _)| id),
            borrow_date: date(2024, 3, 1),
            due_date: date(2024, 3, 15),
            return_date,
            fine_amount: Decimal::ZERO,
            created_at: now,
            updated_at: now,
            book_title: "Dune".to_string(),
            book_author: "Frank Herbert".to_string(),
            book_isbn: None,
            member_name: member.map(|(_, name)| name.to_string()),
            member_email: member.map(|(_, name)| format!("{}@example.com", name)),
        }
    }

    #[test]
    fn test_details_derive_overdue() {
        let details = row(Some((4, "ada")), None).into_details(date(2024, 3, 20));
        assert_eq!(details.status, BorrowingStatus::Overdue);
        assert!(details.is_overdue);
        assert_eq!(details.days_overdue, 5);
        assert_eq!(details.member.unwrap().email, "ada@example.com");
    }

    #[test]
    fn test_details_returned_late_is_not_overdue() {
        let details = row(Some((4, "ada")), Some(date(2024, 3, 18))).into_details(date(2024, 4, 1));
        assert_eq!(details.status, BorrowingStatus::Returned);
        assert!(!details.is_overdue);
        assert_eq!(details.days_overdue, 0);
    }

    #[test]
    fn test_details_orphaned_member() {
        let details = row(None, Some(date(2024, 3, 10))).into_details(date(2024, 3, 20));
        assert!(details.member.is_none());
        assert_eq!(details.member_id, None);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&BorrowingStatus::Overdue).unwrap(), "\"overdue\"");
        let parsed: BorrowingStatus = serde_json::from_str("\"returned\"").unwrap();
        assert_eq!(parsed, BorrowingStatus::Returned);
    }
}
