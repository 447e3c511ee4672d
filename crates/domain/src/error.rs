// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::AcademicYear;

/// Errors that can occur during domain validation and aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Institute name is empty or invalid.
    InvalidInstituteName(String),
    /// Institute code is empty or invalid.
    InvalidInstituteCode(String),
    /// Student count could not be interpreted as a non-negative integer.
    InvalidStudentCount(String),
    /// An institute code is already in use.
    DuplicateInstituteCode(String),
    /// Failed to parse date from string.
    DateParseError {
        /// The invalid date string.
        date_string: String,
        /// The parsing error message.
        error: String,
    },
    /// An exam period ends before it starts.
    InvalidExamPeriod {
        /// The academic year the period belongs to.
        academic_year: AcademicYear,
        /// The period start date.
        start: time::Date,
        /// The period end date.
        end: time::Date,
    },
    /// A selected date range ends before it starts.
    InvalidDateRange {
        /// The range start date.
        start: time::Date,
        /// The range end date.
        end: time::Date,
    },
    /// The calendar year cannot be represented.
    InvalidYear(i32),
    /// Date arithmetic overflow.
    DateArithmeticOverflow {
        /// Description of the operation that failed.
        operation: String,
    },
    /// The record snapshot contained no institutes at all.
    EmptySnapshot,
    /// Every institute in the snapshot was filtered out.
    NoValidInstitutes {
        /// How many records were excluded.
        filtered_out: usize,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInstituteName(msg) => write!(f, "Invalid institute name: {msg}"),
            Self::InvalidInstituteCode(msg) => write!(f, "Invalid institute code: {msg}"),
            Self::InvalidStudentCount(msg) => write!(f, "Invalid student count: {msg}"),
            Self::DuplicateInstituteCode(code) => {
                write!(f, "Institute with code '{code}' already exists")
            }
            Self::DateParseError { date_string, error } => {
                write!(f, "Failed to parse date '{date_string}': {error}")
            }
            Self::InvalidExamPeriod {
                academic_year,
                start,
                end,
            } => {
                write!(
                    f,
                    "Invalid {academic_year} exam period: start {start} is after end {end}"
                )
            }
            Self::InvalidDateRange { start, end } => {
                write!(
                    f,
                    "Start date must be before or equal to end date ({start} > {end})"
                )
            }
            Self::InvalidYear(year) => write!(f, "Invalid calendar year: {year}"),
            Self::DateArithmeticOverflow { operation } => {
                write!(f, "Date arithmetic overflow while {operation}")
            }
            Self::EmptySnapshot => write!(f, "No institute records found in the record store"),
            Self::NoValidInstitutes { filtered_out } => {
                write!(
                    f,
                    "No valid institutes found with student counts ({filtered_out} filtered out)"
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}
