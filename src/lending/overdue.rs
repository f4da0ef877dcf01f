//! Overdue classification
//!
//! A borrowing is overdue when it has no return date and its due date is
//! strictly before today. Nothing is stored; every reader derives it the same
//! way, including the SQL fragments below used for filtering and counting.

use chrono::NaiveDate;

use crate::models::borrowing::BorrowingStatus;

/// SQL predicate for an overdue borrowing. `$today` must be bound to the caller's date.
pub fn overdue_predicate(alias: &str, today_param: usize) -> String {
    format!(
        "({a}.return_date IS NULL AND {a}.due_date < ${p})",
        a = alias,
        p = today_param
    )
}

/// SQL predicate for an active borrowing that is not overdue yet
pub fn on_loan_predicate(alias: &str, today_param: usize) -> String {
    format!(
        "({a}.return_date IS NULL AND {a}.due_date >= ${p})",
        a = alias,
        p = today_param
    )
}

pub fn is_overdue(return_date: Option<NaiveDate>, due_date: NaiveDate, today: NaiveDate) -> bool {
    return_date.is_none() && due_date < today
}

pub fn status_of(
    return_date: Option<NaiveDate>,
    due_date: NaiveDate,
    today: NaiveDate,
) -> BorrowingStatus {
    if return_date.is_some() {
        BorrowingStatus::Returned
    } else if due_date < today {
        BorrowingStatus::Overdue
    } else {
        BorrowingStatus::Borrowed
    }
}

/// Whole days past the due date for an active borrowing, 0 otherwise
pub fn days_overdue(return_date: Option<NaiveDate>, due_date: NaiveDate, today: NaiveDate) -> i64 {
    if is_overdue(return_date, due_date, today) {
        (today - due_date).num_days()
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_due_today_is_not_overdue() {
        assert!(!is_overdue(None, date(10), date(10)));
        assert_eq!(status_of(None, date(10), date(10)), BorrowingStatus::Borrowed);
    }

    #[test]
    fn test_past_due_is_overdue() {
        assert!(is_overdue(None, date(10), date(11)));
        assert_eq!(status_of(None, date(10), date(11)), BorrowingStatus::Overdue);
        assert_eq!(days_overdue(None, date(10), date(13)), 3);
    }

    #[test]
    fn test_returned_is_never_overdue() {
        assert!(!is_overdue(Some(date(20)), date(10), date(25)));
        assert_eq!(status_of(Some(date(20)), date(10), date(25)), BorrowingStatus::Returned);
        assert_eq!(days_overdue(Some(date(20)), date(10), date(25)), 0);
    }

    #[test]
    fn test_sql_predicates() {
        assert_eq!(
            overdue_predicate("b", 1),
            "(b.return_date IS NULL AND b.due_date < $1)"
        );
        assert_eq!(
            on_loan_predicate("b", 3),
            "(b.return_date IS NULL AND b.due_date >= $3)"
        );
    }
}
