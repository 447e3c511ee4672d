// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Daily availability aggregation.
//!
//! For every day of a calendar year this module computes how many
//! institutes, and how many of their students, are *not* sitting an exam.
//! The computation is a difference-array sweep over the exam periods, so it
//! runs in time proportional to the number of periods plus the number of
//! days in the year.

use crate::error::DomainError;
use crate::range::DateRange;
use crate::types::InstituteRecord;
use serde::{Deserialize, Serialize};
use time::{Date, Month};

/// How student counts are subtracted when one institute has several exam
/// periods covering the same day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentCounting {
    /// Each covering period subtracts the institute's full student count.
    ///
    /// Overlapping periods of one institute subtract the count more than
    /// once. The result saturates at zero.
    #[default]
    PerPeriod,
    /// An institute subtracts its student count at most once per day.
    PerInstitute,
}

/// Availability figures for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAvailability {
    /// The calendar day.
    pub date: Date,
    /// Institutes with no exam on this day.
    pub institutes_available: u32,
    /// Students whose institute has no exam on this day.
    pub students_available: u64,
    /// `institutes_available` as a percentage of all institutes.
    pub institute_percentage: f64,
    /// `students_available` as a percentage of all students.
    pub student_percentage: f64,
    /// Share of institutes that are busy, in `[0, 1]`.
    pub intensity: f64,
}

/// Availability for every day of one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearAvailability {
    year: i32,
    total_institutes: u32,
    total_students: u64,
    days: Vec<DailyAvailability>,
}

impl YearAvailability {
    /// Returns the calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Returns the number of institutes in the snapshot.
    #[must_use]
    pub const fn total_institutes(&self) -> u32 {
        self.total_institutes
    }

    /// Returns the number of students across all institutes.
    #[must_use]
    pub const fn total_students(&self) -> u64 {
        self.total_students
    }

    /// Returns every day of the year in ascending order.
    #[must_use]
    pub fn days(&self) -> &[DailyAvailability] {
        &self.days
    }

    /// Returns the figures for a single day, if it falls in this year.
    #[must_use]
    pub fn day(&self, date: Date) -> Option<&DailyAvailability> {
        if date.year() != self.year {
            return None;
        }
        self.days.get(usize::from(date.ordinal()) - 1)
    }

    /// Returns the days of one month.
    #[must_use]
    pub fn month(&self, month: Month) -> &[DailyAvailability] {
        let target: u8 = u8::from(month);
        let start: usize = self
            .days
            .partition_point(|day| u8::from(day.date.month()) < target);
        let end: usize = self
            .days
            .partition_point(|day| u8::from(day.date.month()) <= target);
        &self.days[start..end]
    }

    /// Returns the days of this year that fall within `range`.
    ///
    /// The slice is empty if the range does not intersect the year.
    #[must_use]
    pub fn range(&self, range: &DateRange) -> &[DailyAvailability] {
        let start: usize = self.days.partition_point(|day| day.date < range.start());
        let end: usize = self.days.partition_point(|day| day.date <= range.end());
        self.days.get(start..end).unwrap_or_default()
    }
}

/// Computes daily availability for `year` using the default student
/// counting policy.
///
/// # Arguments
///
/// * `records` - Validated institute records
/// * `year` - The calendar year to compute
///
/// # Errors
///
/// Returns `DomainError::InvalidYear` if the year cannot be represented.
pub fn compute_daily_availability(
    records: &[InstituteRecord],
    year: i32,
) -> Result<YearAvailability, DomainError> {
    compute_daily_availability_with(records, year, StudentCounting::default())
}

/// Computes daily availability for `year`.
///
/// Each day starts at the snapshot totals. Every scheduled exam period,
/// clipped to the year, subtracts its institute once per covered day and
/// subtracts students according to `counting`.
///
/// # Arguments
///
/// * `records` - Validated institute records
/// * `year` - The calendar year to compute
/// * `counting` - How overlapping periods of one institute affect students
///
/// # Errors
///
/// Returns `DomainError::InvalidYear` if the year cannot be represented.
pub fn compute_daily_availability_with(
    records: &[InstituteRecord],
    year: i32,
    counting: StudentCounting,
) -> Result<YearAvailability, DomainError> {
    let first_day: Date = Date::from_calendar_date(year, Month::January, 1)
        .map_err(|_| DomainError::InvalidYear(year))?;
    let last_day: Date = Date::from_calendar_date(year, Month::December, 31)
        .map_err(|_| DomainError::InvalidYear(year))?;
    let day_count: usize = usize::from(last_day.ordinal());

    let total_institutes: u32 =
        u32::try_from(records.len()).map_err(|_| DomainError::DateArithmeticOverflow {
            operation: String::from("counting institutes"),
        })?;
    let total_students: u64 = records
        .iter()
        .map(|record| u64::from(record.total_students))
        .sum();

    // One extra slot so an interval ending on Dec 31 can close.
    let mut institute_delta: Vec<i64> = vec![0; day_count + 1];
    let mut student_delta: Vec<i64> = vec![0; day_count + 1];

    for record in records {
        let clipped: Vec<(usize, usize)> = clip_periods(record, first_day, last_day);
        let merged: Vec<(usize, usize)> = merge_intervals(&clipped);
        let students: i64 = i64::from(record.total_students);

        for &(start, end) in &merged {
            institute_delta[start] += 1;
            institute_delta[end + 1] -= 1;
        }

        let student_intervals: &[(usize, usize)] = match counting {
            StudentCounting::PerPeriod => &clipped,
            StudentCounting::PerInstitute => &merged,
        };
        for &(start, end) in student_intervals {
            student_delta[start] += students;
            student_delta[end + 1] -= students;
        }
    }

    let mut days: Vec<DailyAvailability> = Vec::with_capacity(day_count);
    let mut busy_institutes: i64 = 0;
    let mut busy_students: i64 = 0;

    for offset in 0..day_count {
        busy_institutes += institute_delta[offset];
        busy_students += student_delta[offset];

        let ordinal: u16 =
            u16::try_from(offset + 1).map_err(|_| DomainError::DateArithmeticOverflow {
                operation: String::from("indexing days of the year"),
            })?;
        let date: Date =
            Date::from_ordinal_date(year, ordinal).map_err(|_| DomainError::InvalidYear(year))?;

        let institutes_available: u32 = u32::try_from(
            i64::from(total_institutes)
                .saturating_sub(busy_institutes)
                .max(0),
        )
        .unwrap_or(0);
        let students_available: u64 = u64::try_from(
            i64::try_from(total_students)
                .unwrap_or(i64::MAX)
                .saturating_sub(busy_students)
                .max(0),
        )
        .unwrap_or(0);

        let institute_share: f64 =
            ratio(u64::from(institutes_available), u64::from(total_institutes));
        let student_share: f64 = ratio(students_available, total_students);
        let intensity: f64 = if total_institutes == 0 {
            0.0
        } else {
            1.0 - institute_share
        };

        days.push(DailyAvailability {
            date,
            institutes_available,
            students_available,
            institute_percentage: institute_share * 100.0,
            student_percentage: student_share * 100.0,
            intensity,
        });
    }

    Ok(YearAvailability {
        year,
        total_institutes,
        total_students,
        days,
    })
}

/// Returns `part / whole`, or 0 when `whole` is zero.
#[allow(clippy::cast_precision_loss)]
fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64
}

/// Clips a record's scheduled periods to the year as zero-based day offsets.
fn clip_periods(record: &InstituteRecord, first_day: Date, last_day: Date) -> Vec<(usize, usize)> {
    record
        .scheduled_periods()
        .filter(|&(_, start, end)| start <= last_day && end >= first_day)
        .map(|(_, start, end)| {
            let start: Date = start.max(first_day);
            let end: Date = end.min(last_day);
            (
                usize::from(start.ordinal()) - 1,
                usize::from(end.ordinal()) - 1,
            )
        })
        .collect()
}

/// Merges overlapping or adjacent inclusive intervals.
fn merge_intervals(intervals: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut sorted: Vec<(usize, usize)> = intervals.to_vec();
    sorted.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(sorted.len());
    for (start, end) in sorted {
        match merged.last_mut() {
            Some(last) if start <= last.1 + 1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}
