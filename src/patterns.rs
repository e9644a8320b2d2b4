//! Compiled regex patterns shared across field detection.
//!
//! All patterns are compiled once at startup and reused by every analysis
//! call.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// ISO-8601 dates, optionally with a time part: `2024-03-01`,
/// `2024-03-01T09:30:00`.
pub static ISO_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2})?(?:Z|[+-]\d{2}:?\d{2})?)?\b")
        .expect("iso date regex")
});

/// Written month-first dates: `March 1, 2024`, `Mar 1 2024`, `Jan. 2nd, 2020`.
pub static WRITTEN_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}\b",
    )
    .expect("written date regex")
});

/// Written day-first dates: `1 March 2024`, `2nd Jan 2020`.
pub static DAY_FIRST_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b\d{1,2}(?:st|nd|rd|th)?\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{4}\b",
    )
    .expect("day-first date regex")
});

/// Numeric slash/dot dates: `03/01/2024`, `1.3.24`.
pub static NUMERIC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}[/.]\d{1,2}[/.]\d{2,4}\b").expect("numeric date regex"));

/// Relative-time phrases: `5 minutes ago`, `yesterday`, `just now`.
pub static RELATIVE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:\d+\s+(?:second|minute|hour|day|week|month|year)s?\s+ago|yesterday|today|just now)\b",
    )
    .expect("relative time regex")
});

/// Money amounts with a currency symbol or code on either side.
pub static MONEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:[$\u{20AC}\u{00A3}\u{00A5}]\s?\d[\d,]*(?:\.\d{1,2})?|\b\d[\d,]*(?:\.\d{1,2})?\s?(?:USD|EUR|GBP|JPY)\b)",
    )
    .expect("money regex")
});

/// A bare count, optionally with a points/votes unit: `128`, `42 points`.
pub static SCORE_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\d[\d,]*(?:\.\d+)?\s*(?:points?|pts|votes?|likes?|upvotes?|stars?)?$")
        .expect("score regex")
});

/// Leading byline: `by Jane Doe`, `By: J. Doe`.
pub static BYLINE_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:by|written by|posted by)\s*:?\s+(\S.{0,60})$").expect("byline regex")
});

/// True when any of the date patterns matches anywhere in `text`. ISO
/// matches are additionally checked as calendar dates, so `2024-99-99`
/// does not pass as one.
pub fn looks_like_date(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text.len() > 64 {
        return false;
    }
    if let Some(m) = ISO_DATE.find(text) {
        if NaiveDate::parse_from_str(&m.as_str()[..10], "%Y-%m-%d").is_ok() {
            return true;
        }
    }
    WRITTEN_DATE.is_match(text)
        || DAY_FIRST_DATE.is_match(text)
        || NUMERIC_DATE.is_match(text)
        || RELATIVE_TIME.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_common_date_shapes() {
        assert!(looks_like_date("2024-03-01"));
        assert!(looks_like_date("2024-03-01T09:30:00Z"));
        assert!(looks_like_date("March 1, 2024"));
        assert!(looks_like_date("1 March 2024"));
        assert!(looks_like_date("03/01/2024"));
        assert!(looks_like_date("5 minutes ago"));
        assert!(looks_like_date("yesterday"));
    }

    #[test]
    fn rejects_non_dates() {
        assert!(!looks_like_date(""));
        assert!(!looks_like_date("hello world"));
        assert!(!looks_like_date("version 1.2"));
        assert!(!looks_like_date("2024-99-99"));
    }

    #[test]
    fn money_and_score_shapes() {
        assert!(MONEY.is_match("$29.99"));
        assert!(MONEY.is_match("1,299 USD"));
        assert!(!MONEY.is_match("29 things"));
        assert!(SCORE_TEXT.is_match("128 points"));
        assert!(SCORE_TEXT.is_match("42"));
        assert!(!SCORE_TEXT.is_match("read more"));
    }

    #[test]
    fn byline_captures_the_name() {
        let caps = BYLINE_TEXT.captures("by Jane Doe").unwrap();
        assert_eq!(&caps[1], "Jane Doe");
        assert!(BYLINE_TEXT.captures("nearby store").is_none());
    }
}
