//! Period labels such as `Jan-25` and their calendar ordering.

use std::cmp::Ordering;

use chrono::NaiveDate;

/// Longest period key accepted for a ledger record.
pub const MAX_PERIOD_LEN: usize = 10;

/// Parses a `Mon-YY` label into the first day of that month.
///
/// Month abbreviations are English and case-insensitive. Returns `None` for
/// anything else, including full month names and four-digit years.
pub fn parse_period(label: &str) -> Option<NaiveDate> {
    let trimmed = label.trim();
    let (month, year) = trimmed.split_once('-')?;
    if month.len() != 3 || year.len() != 2 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(&format!("01-{month}-{year}"), "%d-%b-%y").ok()
}

/// Orders two labels chronologically. Unparsable labels sort after every
/// parsable one and keep their relative order under a stable sort.
pub fn compare_periods(a: &str, b: &str) -> Ordering {
    match (parse_period(a), parse_period(b)) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Formats a date back into its `Mon-YY` label.
pub fn period_label(date: NaiveDate) -> String {
    date.format("%b-%y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_abbreviated_month_and_two_digit_year() {
        assert_eq!(
            parse_period("Jan-25"),
            NaiveDate::from_ymd_opt(2025, 1, 1)
        );
        assert_eq!(
            parse_period(" dec-24 "),
            NaiveDate::from_ymd_opt(2024, 12, 1)
        );
    }

    #[test]
    fn rejects_other_shapes() {
        for label in ["January-25", "Jan-2025", "2025-01", "Jan25", "", "Foo-25"] {
            assert_eq!(parse_period(label), None, "{label}");
        }
    }

    #[test]
    fn unparsable_labels_sort_last() {
        let mut labels = vec!["Q1 extra", "Mar-25", "Jan-25", "???", "Dec-24"];
        labels.sort_by(|a, b| compare_periods(a, b));
        assert_eq!(labels, vec!["Dec-24", "Jan-25", "Mar-25", "Q1 extra", "???"]);
    }

    #[test]
    fn label_round_trips() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert_eq!(period_label(date), "Feb-25");
        assert_eq!(parse_period(&period_label(date)), Some(date));
    }
}
