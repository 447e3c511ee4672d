// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Free-text exam date normalization.
//!
//! Exam dates arrive from operator forms and spreadsheet uploads in many
//! layouts. This module maps them onto a `time::Date` by trying an ordered
//! list of candidate patterns, first match wins, and falls back to a
//! permissive day-first reading when no explicit pattern matches.
//!
//! Only years in `[2000, 2099]` are accepted. Two-digit years are read as
//! `20YY`.

use crate::error::DomainError;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::parsing::Parsed;
use time::{Date, Month};

/// Earliest accepted exam year.
pub const MIN_EXAM_YEAR: i32 = 2000;

/// Latest accepted exam year.
pub const MAX_EXAM_YEAR: i32 = 2099;

/// Values that mean "no date" and are never reported as parse failures.
const NULL_SENTINELS: &[&str] = &["none", "nan", "nat", "null"];

/// Canonical output layout (`DD-MM-YYYY`).
const CANONICAL_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day]-[month]-[year]");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YearDigits {
    Four,
    Two,
}

/// A single candidate layout.
struct CandidatePattern {
    items: &'static [BorrowedFormatItem<'static>],
    year_digits: YearDigits,
}

/// Candidate layouts in priority order.
///
/// Day-first layouts come before month-first ones, so an ambiguous value
/// such as `05-06-2025` reads as 5 June.
const CANDIDATE_PATTERNS: &[CandidatePattern] = &[
    // DD-MM-YYYY
    CandidatePattern {
        items: format_description!("[day padding:none]-[month padding:none]-[year]"),
        year_digits: YearDigits::Four,
    },
    // DD/MM/YYYY
    CandidatePattern {
        items: format_description!("[day padding:none]/[month padding:none]/[year]"),
        year_digits: YearDigits::Four,
    },
    // DD-MM-YY
    CandidatePattern {
        items: format_description!(
            "[day padding:none]-[month padding:none]-[year repr:last_two]"
        ),
        year_digits: YearDigits::Two,
    },
    // MM-DD-YYYY
    CandidatePattern {
        items: format_description!("[month padding:none]-[day padding:none]-[year]"),
        year_digits: YearDigits::Four,
    },
    // MM/DD/YYYY
    CandidatePattern {
        items: format_description!("[month padding:none]/[day padding:none]/[year]"),
        year_digits: YearDigits::Four,
    },
    // YYYY-MM-DD
    CandidatePattern {
        items: format_description!("[year]-[month padding:none]-[day padding:none]"),
        year_digits: YearDigits::Four,
    },
    // DD.MM.YYYY
    CandidatePattern {
        items: format_description!("[day padding:none].[month padding:none].[year]"),
        year_digits: YearDigits::Four,
    },
    // DD Mon YYYY
    CandidatePattern {
        items: format_description!(
            "[day padding:none] [month repr:short case_sensitive:false] [year]"
        ),
        year_digits: YearDigits::Four,
    },
    // DD Month YYYY
    CandidatePattern {
        items: format_description!(
            "[day padding:none] [month repr:long case_sensitive:false] [year]"
        ),
        year_digits: YearDigits::Four,
    },
];

/// Returns whether a raw cell means "no date".
///
/// Blank cells and the textual null markers emitted by spreadsheet and
/// database exports count as absent, never as parse failures.
#[must_use]
pub fn is_null_sentinel(raw: &str) -> bool {
    let trimmed: &str = raw.trim();
    trimmed.is_empty()
        || NULL_SENTINELS
            .iter()
            .any(|sentinel| trimmed.eq_ignore_ascii_case(sentinel))
}

/// Normalizes a free-text date.
///
/// # Arguments
///
/// * `raw` - The date as entered or uploaded
///
/// # Returns
///
/// * `Ok(Some(date))` if a candidate pattern or the fallback matched
/// * `Ok(None)` if the value is blank, a null sentinel, or a readable date
///   whose year falls outside `[2000, 2099]`
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if no layout matches.
pub fn normalize_date(raw: &str) -> Result<Option<Date>, DomainError> {
    if is_null_sentinel(raw) {
        return Ok(None);
    }

    let input: &str = raw.trim();

    let explicit: Option<Date> = CANDIDATE_PATTERNS
        .iter()
        .filter_map(|pattern| parse_with_pattern(input, pattern))
        .find(|date| is_accepted_year(date.year()));

    if let Some(date) = explicit {
        return Ok(Some(date));
    }

    match parse_permissive(input) {
        Some(date) if is_accepted_year(date.year()) => Ok(Some(date)),
        Some(_) => Ok(None),
        None => Err(DomainError::DateParseError {
            date_string: raw.to_string(),
            error: String::from("no supported date format matched"),
        }),
    }
}

/// Normalizes a free-text date into its canonical `DD-MM-YYYY` text.
///
/// # Errors
///
/// Returns an error under the same conditions as [`normalize_date`].
pub fn normalize_date_string(raw: &str) -> Result<Option<String>, DomainError> {
    normalize_date(raw)?.map(format_canonical).transpose()
}

/// Formats a date as canonical `DD-MM-YYYY` text.
///
/// # Errors
///
/// Returns an error if the date cannot be formatted.
pub fn format_canonical(date: Date) -> Result<String, DomainError> {
    date.format(CANONICAL_FORMAT)
        .map_err(|e| DomainError::DateParseError {
            date_string: date.to_string(),
            error: e.to_string(),
        })
}

const fn is_accepted_year(year: i32) -> bool {
    year >= MIN_EXAM_YEAR && year <= MAX_EXAM_YEAR
}

fn parse_with_pattern(input: &str, pattern: &CandidatePattern) -> Option<Date> {
    let mut parsed: Parsed = Parsed::new();
    let remaining: &[u8] = parsed.parse_items(input.as_bytes(), pattern.items).ok()?;
    if !remaining.is_empty() {
        return None;
    }

    let year: i32 = match pattern.year_digits {
        YearDigits::Four => parsed.year()?,
        YearDigits::Two => MIN_EXAM_YEAR + i32::from(parsed.year_last_two()?),
    };

    Date::from_calendar_date(year, parsed.month()?, parsed.day()?.get()).ok()
}

/// Day-first reading of anything the explicit patterns missed.
///
/// Handles date-times (`2025-05-19T00:00:00+00:00`, `19/05/2025 10:30`),
/// arbitrary separators, month names in any position and compact
/// `YYYYMMDD` values.
fn parse_permissive(input: &str) -> Option<Date> {
    let date_part: &str = strip_time_of_day(input);
    let tokens: Vec<&str> = date_part
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();

    match tokens.as_slice() {
        [compact] if compact.len() == 8 && is_digits(compact) => {
            let year: i32 = compact.get(0..4)?.parse().ok()?;
            let month: u8 = compact.get(4..6)?.parse().ok()?;
            let day: u8 = compact.get(6..8)?.parse().ok()?;
            build_date(year, month_from_number(month)?, day)
        }
        [first, second, third] => {
            if first.len() == 4 && is_digits(first) {
                // Y M D
                let year: i32 = first.parse().ok()?;
                build_date(year, parse_month_token(second)?, third.parse().ok()?)
            } else if let Some(month) = month_from_name(first) {
                // Month D, Y
                build_date(parse_year_token(third)?, month, second.parse().ok()?)
            } else {
                parse_day_first(first, second, third)
            }
        }
        _ => None,
    }
}

fn parse_day_first(day_token: &str, month_token: &str, year_token: &str) -> Option<Date> {
    let year: i32 = parse_year_token(year_token)?;

    if let Some(month) = month_from_name(month_token) {
        return build_date(year, month, day_token.parse().ok()?);
    }

    let day: u8 = day_token.parse().ok()?;
    let month: u8 = month_token.parse().ok()?;

    // A month above 12 only makes sense if the value was month-first.
    if month > 12 && day <= 12 {
        return build_date(year, month_from_number(day)?, month);
    }

    build_date(year, month_from_number(month)?, day)
}

fn strip_time_of_day(input: &str) -> &str {
    input.find(':').map_or(input, |colon| {
        input[..colon]
            .trim_end_matches(|c: char| c.is_ascii_digit())
            .trim_end_matches(['T', 't', ' '])
    })
}

fn parse_year_token(token: &str) -> Option<i32> {
    if !is_digits(token) {
        return None;
    }
    let value: i32 = token.parse().ok()?;
    match token.len() {
        2 => Some(MIN_EXAM_YEAR + value),
        4 => Some(value),
        _ => None,
    }
}

fn parse_month_token(token: &str) -> Option<Month> {
    month_from_name(token).or_else(|| month_from_number(token.parse().ok()?))
}

fn month_from_number(value: u8) -> Option<Month> {
    Month::try_from(value).ok()
}

/// Matches a full month name or its three-letter abbreviation.
fn month_from_name(token: &str) -> Option<Month> {
    if token.len() < 3 || !token.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut month: Month = Month::January;
    for _ in 0..12 {
        let name: String = month.to_string();
        let matches_full: bool = name.eq_ignore_ascii_case(token);
        let matches_short: bool = token.len() == 3
            && name
                .get(0..3)
                .is_some_and(|short| short.eq_ignore_ascii_case(token));
        if matches_full || matches_short {
            return Some(month);
        }
        month = month.next();
    }

    None
}

fn build_date(year: i32, month: Month, day: u8) -> Option<Date> {
    Date::from_calendar_date(year, month, day).ok()
}

fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn date(year: i32, month: Month, day: u8) -> Date {
        Date::from_calendar_date(year, month, day).unwrap()
    }

    #[test]
    fn test_common_layouts_normalize_to_the_same_date() {
        let expected: Option<Date> = Some(date(2025, Month::May, 19));

        for raw in [
            "19-05-2025",
            "19/05/2025",
            "2025-05-19",
            "19 May 2025",
            "19 may 2025",
            "19 MAY 2025",
            "19.05.2025",
            "19 May, 2025",
            "May 19, 2025",
            "05/19/2025",
            "05-19-2025",
        ] {
            assert_eq!(normalize_date(raw).unwrap(), expected, "input {raw}");
        }
    }

    #[test]
    fn test_full_month_name() {
        assert_eq!(
            normalize_date("3 September 2025").unwrap(),
            Some(date(2025, Month::September, 3))
        );
    }

    #[test]
    fn test_single_digit_day_and_month() {
        assert_eq!(
            normalize_date("5-6-2025").unwrap(),
            Some(date(2025, Month::June, 5))
        );
    }

    #[test]
    fn test_ambiguous_value_reads_day_first() {
        assert_eq!(
            normalize_date("05-06-2025").unwrap(),
            Some(date(2025, Month::June, 5))
        );
    }

    #[test]
    fn test_two_digit_year_maps_into_2000s() {
        assert_eq!(
            normalize_date("19-05-25").unwrap(),
            Some(date(2025, Month::May, 19))
        );
        assert_eq!(
            normalize_date("01/02/07").unwrap(),
            Some(date(2007, Month::February, 1))
        );
    }

    #[test]
    fn test_years_outside_range_are_absent() {
        assert_eq!(normalize_date("19-05-1999").unwrap(), None);
        assert_eq!(normalize_date("19-05-2150").unwrap(), None);
        assert_eq!(normalize_date("1999-05-19").unwrap(), None);
    }

    #[test]
    fn test_iso_datetime_from_document_store() {
        assert_eq!(
            normalize_date("2025-06-10T00:00:00.000+00:00").unwrap(),
            Some(date(2025, Month::June, 10))
        );
        assert_eq!(
            normalize_date("2025-06-10 00:00:00").unwrap(),
            Some(date(2025, Month::June, 10))
        );
    }

    #[test]
    fn test_compact_layout() {
        assert_eq!(
            normalize_date("20250610").unwrap(),
            Some(date(2025, Month::June, 10))
        );
    }

    #[test]
    fn test_null_sentinels_are_absent_not_errors() {
        for raw in ["", "   ", "None", "nan", "NaT", "null", "NULL"] {
            assert_eq!(normalize_date(raw).unwrap(), None, "input {raw:?}");
        }
    }

    #[test]
    fn test_garbage_reports_the_raw_value() {
        match normalize_date("next tuesday") {
            Err(DomainError::DateParseError { date_string, .. }) => {
                assert_eq!(date_string, "next tuesday");
            }
            other => panic!("Expected DateParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_impossible_calendar_date_is_rejected() {
        assert!(normalize_date("31-02-2025").is_err());
        assert!(normalize_date("29-02-2025").is_err());
        assert_eq!(
            normalize_date("29-02-2024").unwrap(),
            Some(date(2024, Month::February, 29))
        );
    }

    #[test]
    fn test_canonical_string() {
        assert_eq!(
            normalize_date_string("2025-5-9").unwrap(),
            Some(String::from("09-05-2025"))
        );
        assert_eq!(normalize_date_string("None").unwrap(), None);
    }
}
