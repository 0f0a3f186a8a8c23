//! Boundary checks shared by the services.

use std::str::FromStr;

use rust_decimal::Decimal;
use tally_domain::{Category, User, MAX_PERIOD_LEN};

use crate::CoreError;

/// Decimal places kept for every stored amount.
pub const AMOUNT_SCALE: u32 = 2;
/// Integer digits allowed before the decimal point (12 digits overall).
pub const AMOUNT_INTEGER_DIGITS: u32 = 10;

/// Parses user-entered text into an amount, accepting an optional `,`
/// thousands separator.
pub fn parse_amount(raw: &str) -> Result<Decimal, CoreError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err(CoreError::Validation("amount is required".into()));
    }
    let value = Decimal::from_str(&cleaned)
        .map_err(|_| CoreError::Validation(format!("`{}` is not a valid amount", raw.trim())))?;
    check_amount(value)
}

/// Rejects amounts with more than two decimals or twelve digits.
pub fn check_amount(value: Decimal) -> Result<Decimal, CoreError> {
    let normalized = value.normalize();
    if normalized.scale() > AMOUNT_SCALE {
        return Err(CoreError::Validation(format!(
            "amount {value} has more than {AMOUNT_SCALE} decimal places"
        )));
    }
    let limit = Decimal::from(10_i64.pow(AMOUNT_INTEGER_DIGITS));
    if normalized.abs() >= limit {
        return Err(CoreError::Validation(format!(
            "amount {value} exceeds {AMOUNT_INTEGER_DIGITS} integer digits"
        )));
    }
    let mut scaled = normalized;
    scaled.rescale(AMOUNT_SCALE);
    Ok(scaled)
}

pub fn parse_category(raw: &str) -> Result<Category, CoreError> {
    Category::from_key(raw)
        .ok_or_else(|| CoreError::Validation(format!("unknown category `{}`", raw.trim())))
}

/// Trims a period key and enforces its length limit.
pub fn normalize_period(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("period is required".into()));
    }
    if trimmed.chars().count() > MAX_PERIOD_LEN {
        return Err(CoreError::Validation(format!(
            "period `{trimmed}` is longer than {MAX_PERIOD_LEN} characters"
        )));
    }
    // Spreadsheets evaluate cells starting with these as formulas.
    if trimmed.starts_with(['=', '+', '-', '@']) {
        return Err(CoreError::Validation(format!(
            "period `{trimmed}` cannot start with `{}`",
            &trimmed[..1]
        )));
    }
    Ok(trimmed.to_string())
}

pub fn require_active(actor: &User) -> Result<(), CoreError> {
    if actor.active {
        Ok(())
    } else {
        Err(CoreError::PermissionDenied(format!(
            "user {} is inactive",
            actor.username
        )))
    }
}

pub fn require_admin(actor: &User) -> Result<(), CoreError> {
    require_active(actor)?;
    if actor.role.is_admin() {
        Ok(())
    } else {
        Err(CoreError::PermissionDenied(format!(
            "user {} is not an administrator",
            actor.username
        )))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parses_plain_and_grouped_amounts() {
        assert_eq!(parse_amount("100").unwrap(), dec!(100.00));
        assert_eq!(parse_amount(" 1,250.50 ").unwrap(), dec!(1250.50));
        assert_eq!(parse_amount("-30.1").unwrap(), dec!(-30.10));
    }

    #[test]
    fn rejects_malformed_amounts() {
        for raw in ["", "abc", "12.345", "10000000000", "1e3x"] {
            let err = parse_amount(raw).unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)), "{raw}");
        }
    }

    #[test]
    fn trailing_zeros_do_not_count_as_decimals() {
        assert_eq!(parse_amount("5.000").unwrap(), dec!(5));
    }

    #[test]
    fn period_keys_are_trimmed_and_bounded() {
        assert_eq!(normalize_period("  Jan-25 ").unwrap(), "Jan-25");
        assert!(normalize_period("   ").is_err());
        assert!(normalize_period("September-2025").is_err());
        assert!(normalize_period("=1+1").is_err());
        assert!(normalize_period(" @SUM(A1)").is_err());
        assert!(normalize_period("-Jan-25").is_err());
    }
}
