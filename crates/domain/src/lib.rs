// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod availability;
mod date_normalization;
mod error;
mod range;
mod snapshot;
mod types;

#[cfg(test)]
mod tests;

pub use availability::{
    DailyAvailability, StudentCounting, YearAvailability, compute_daily_availability,
    compute_daily_availability_with,
};
pub use date_normalization::{
    MAX_EXAM_YEAR, MIN_EXAM_YEAR, format_canonical, is_null_sentinel, normalize_date,
    normalize_date_string,
};
pub use range::{
    AcademicYearExams, DateRange, RangeExamReport, RangeSummary, exams_in_range, summarize_range,
};
pub use snapshot::{
    DuplicateCode, DuplicatePolicy, FilterReason, FilteredInstitute, PreparedSnapshot,
    prepare_snapshot, title_case,
};

// Re-export public types
pub use error::DomainError;
pub use types::{AcademicYear, ExamPeriod, InstituteId, InstituteRecord};
