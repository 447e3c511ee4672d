// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Date range selection and exam overlap queries.

use crate::availability::{DailyAvailability, YearAvailability};
use crate::error::DomainError;
use crate::types::{AcademicYear, InstituteRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::Date;

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    /// Creates a new `DateRange`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDateRange` if `start > end`.
    pub fn new(start: Date, end: Date) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns the first day of the range.
    #[must_use]
    pub const fn start(&self) -> Date {
        self.start
    }

    /// Returns the last day of the range.
    #[must_use]
    pub const fn end(&self) -> Date {
        self.end
    }

    /// Returns whether `date` lies within the range.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// Returns whether the inclusive span `[start, end]` shares at least one
    /// day with this range.
    #[must_use]
    pub fn overlaps(&self, start: Date, end: Date) -> bool {
        start <= self.end && end >= self.start
    }
}

/// Institutes with an exam for one academic year inside a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicYearExams {
    /// The academic year.
    pub academic_year: AcademicYear,
    /// Sorted, de-duplicated institute names.
    pub institutes: Vec<String>,
}

/// Institutes with at least one exam period overlapping a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeExamReport {
    /// The queried range.
    pub range: DateRange,
    /// Sorted, de-duplicated names of every institute with an overlapping exam.
    pub institutes: Vec<String>,
    /// The same names broken down by academic year, in year order.
    pub by_academic_year: Vec<AcademicYearExams>,
}

impl RangeExamReport {
    /// Returns whether no institute has an exam in the range.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.institutes.is_empty()
    }
}

/// Averaged availability over the days of a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSummary {
    /// Number of days of the range that fall within the computed year.
    pub days: usize,
    /// Mean institutes available per day, truncated.
    pub average_institutes_available: u32,
    /// Mean institutes busy per day (`total - average available`).
    pub average_institutes_busy: u32,
    /// Mean students available per day, truncated.
    pub average_students_available: u64,
    /// Mean students busy per day (`total - average available`).
    pub average_students_busy: u64,
    /// Mean institute availability percentage.
    pub average_institute_percentage: f64,
    /// `100 - average_institute_percentage`.
    pub busy_institute_percentage: f64,
    /// Mean student availability percentage.
    pub average_student_percentage: f64,
    /// `100 - average_student_percentage`.
    pub busy_student_percentage: f64,
}

/// Lists the institutes with an exam overlapping `range`.
///
/// A scheduled period `[s, e]` overlaps when `s <= range.end` and
/// `e >= range.start`, so partially covered periods count.
#[must_use]
pub fn exams_in_range(records: &[InstituteRecord], range: &DateRange) -> RangeExamReport {
    let mut all: BTreeSet<&str> = BTreeSet::new();
    let mut by_year: [BTreeSet<&str>; 4] = Default::default();

    for record in records {
        for (academic_year, start, end) in record.scheduled_periods() {
            if range.overlaps(start, end) {
                all.insert(record.name.as_str());
                by_year[academic_year.index()].insert(record.name.as_str());
            }
        }
    }

    RangeExamReport {
        range: *range,
        institutes: all.into_iter().map(String::from).collect(),
        by_academic_year: AcademicYear::ALL
            .into_iter()
            .map(|academic_year| AcademicYearExams {
                academic_year,
                institutes: by_year[academic_year.index()]
                    .iter()
                    .map(|name| (*name).to_string())
                    .collect(),
            })
            .collect(),
    }
}

/// Averages the availability figures over the days of `range`.
///
/// Returns `None` if the range does not intersect the computed year.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn summarize_range(availability: &YearAvailability, range: &DateRange) -> Option<RangeSummary> {
    let days: &[DailyAvailability] = availability.range(range);
    if days.is_empty() {
        return None;
    }

    let count: f64 = days.len() as f64;
    let institutes_sum: u64 = days
        .iter()
        .map(|day| u64::from(day.institutes_available))
        .sum();
    let students_sum: u64 = days.iter().map(|day| day.students_available).sum();
    let institute_percentage: f64 =
        days.iter().map(|day| day.institute_percentage).sum::<f64>() / count;
    let student_percentage: f64 =
        days.iter().map(|day| day.student_percentage).sum::<f64>() / count;

    let len: u64 = days.len() as u64;
    let average_institutes_available: u32 =
        u32::try_from(institutes_sum / len).unwrap_or(u32::MAX);
    let average_students_available: u64 = students_sum / len;

    Some(RangeSummary {
        days: days.len(),
        average_institutes_available,
        average_institutes_busy: availability
            .total_institutes()
            .saturating_sub(average_institutes_available),
        average_students_available,
        average_students_busy: availability
            .total_students()
            .saturating_sub(average_students_available),
        average_institute_percentage: institute_percentage,
        busy_institute_percentage: 100.0 - institute_percentage,
        average_student_percentage: student_percentage,
        busy_student_percentage: 100.0 - student_percentage,
    })
}
