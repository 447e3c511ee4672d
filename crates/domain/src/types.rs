// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use time::Date;

/// The academic year an exam period belongs to.
///
/// Every institute carries exactly one exam period slot per academic year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AcademicYear {
    /// First year students.
    First,
    /// Second year students.
    Second,
    /// Third year students.
    Third,
    /// Fourth year students.
    Fourth,
}

impl AcademicYear {
    /// All academic years in display order.
    pub const ALL: [Self; 4] = [Self::First, Self::Second, Self::Third, Self::Fourth];

    /// Returns the display label (e.g. "I year").
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::First => "I year",
            Self::Second => "II year",
            Self::Third => "III year",
            Self::Fourth => "IV year",
        }
    }

    /// Returns the zero-based slot index of this academic year.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
            Self::Third => 2,
            Self::Fourth => 3,
        }
    }

    /// Returns the record-store column holding this year's exam start date.
    ///
    /// The column names are historical and not uniformly numbered.
    #[must_use]
    pub const fn start_column(&self) -> &'static str {
        match self {
            Self::First => "exam_start",
            Self::Second => "exam_start_1",
            Self::Third => "exam_start_2",
            Self::Fourth => "exam_start_3",
        }
    }

    /// Returns the record-store column holding this year's exam end date.
    #[must_use]
    pub const fn end_column(&self) -> &'static str {
        match self {
            Self::First => "exams_end",
            Self::Second => "exam_end",
            Self::Third => "exam_end_1",
            Self::Fourth => "exam_end_2",
        }
    }
}

impl std::fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Opaque identifier of an institute, assigned by the record store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstituteId(String);

impl InstituteId {
    /// Creates a new `InstituteId`.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    /// Returns the identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstituteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single exam period for one academic year.
///
/// Either date may be absent, meaning no exam is scheduled for that year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamPeriod {
    /// First exam day (inclusive).
    pub start: Option<Date>,
    /// Last exam day (inclusive).
    pub end: Option<Date>,
}

impl ExamPeriod {
    /// Creates a new `ExamPeriod`.
    #[must_use]
    pub const fn new(start: Option<Date>, end: Option<Date>) -> Self {
        Self { start, end }
    }

    /// Creates a period with both dates present.
    #[must_use]
    pub const fn between(start: Date, end: Date) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Creates a period with no exam scheduled.
    #[must_use]
    pub const fn unscheduled() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Returns the inclusive span of this period if it is usable.
    ///
    /// A period with a missing date or with `start > end` is treated as absent.
    #[must_use]
    pub fn scheduled_span(&self) -> Option<(Date, Date)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start <= end => Some((start, end)),
            _ => None,
        }
    }

    /// Returns whether this period carries a usable span.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.scheduled_span().is_some()
    }
}

/// An institute and its exam schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstituteRecord {
    /// The store-assigned identifier.
    pub id: InstituteId,
    /// Free-text display name.
    pub name: String,
    /// Short identifier, intended to be unique.
    pub code: String,
    /// Number of enrolled students.
    pub total_students: u32,
    /// Exam periods indexed by `AcademicYear::index`.
    pub exam_periods: [ExamPeriod; 4],
}

impl InstituteRecord {
    /// Creates a new `InstituteRecord` with no exams scheduled.
    ///
    /// # Arguments
    ///
    /// * `id` - The store-assigned identifier
    /// * `name` - The display name
    /// * `code` - The institute code
    /// * `total_students` - Number of enrolled students
    #[must_use]
    pub fn new(id: InstituteId, name: &str, code: &str, total_students: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            code: code.to_string(),
            total_students,
            exam_periods: [ExamPeriod::unscheduled(); 4],
        }
    }

    /// Returns this record with the period for `academic_year` replaced.
    #[must_use]
    pub fn with_exam_period(mut self, academic_year: AcademicYear, period: ExamPeriod) -> Self {
        self.exam_periods[academic_year.index()] = period;
        self
    }

    /// Returns the exam period for an academic year.
    #[must_use]
    pub const fn exam_period(&self, academic_year: AcademicYear) -> &ExamPeriod {
        &self.exam_periods[academic_year.index()]
    }

    /// Iterates over the usable exam periods with their academic year.
    pub fn scheduled_periods(&self) -> impl Iterator<Item = (AcademicYear, Date, Date)> + '_ {
        AcademicYear::ALL.into_iter().filter_map(|academic_year| {
            self.exam_period(academic_year)
                .scheduled_span()
                .map(|(start, end)| (academic_year, start, end))
        })
    }
}
