//! Late-return fines

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

/// Fine for a copy returned on `returned_on`: `per_day` for every day past `due_date`
pub fn late_fine(due_date: NaiveDate, returned_on: NaiveDate, per_day: Decimal) -> Decimal {
    let days_late = (returned_on - due_date).num_days();
    if days_late <= 0 {
        Decimal::ZERO
    } else {
        (per_day * Decimal::from(days_late)).round_dp(2)
    }
}

/// Validate an explicitly supplied fine
pub fn check_fine(amount: Decimal) -> AppResult<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::Validation("Fine amount cannot be negative".to_string()));
    }
    Ok(amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_on_time_return_has_no_fine() {
        assert_eq!(late_fine(date(10), date(10), Decimal::ONE), Decimal::ZERO);
        assert_eq!(late_fine(date(10), date(2), Decimal::ONE), Decimal::ZERO);
    }

    #[test]
    fn test_fine_per_day_late() {
        let per_day = Decimal::from_str("0.25").unwrap();
        assert_eq!(late_fine(date(10), date(14), per_day), Decimal::from_str("1.00").unwrap());
        assert_eq!(late_fine(date(1), date(4), Decimal::ONE), Decimal::from(3));
    }

    #[test]
    fn test_check_fine() {
        assert_eq!(check_fine(Decimal::from_str("2.499").unwrap()).unwrap(), Decimal::from_str("2.50").unwrap());
        assert!(check_fine(Decimal::from_str("-1").unwrap()).is_err());
        assert!(check_fine(Decimal::ZERO).is_ok());
    }
}
