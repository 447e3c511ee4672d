// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use examcal_domain::AcademicYear;
use serde::{Deserialize, Serialize};

/// Raw exam date cells for one academic year, as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamDateCells {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl ExamDateCells {
    /// Creates a pair of cells.
    #[must_use]
    pub const fn new(start: Option<String>, end: Option<String>) -> Self {
        Self { start, end }
    }
}

/// Writable fields of an institute row.
///
/// `exam_dates` is indexed by `AcademicYear::index`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstituteFields {
    pub institute_name: String,
    pub institute_code: String,
    pub total_students: i64,
    pub exam_dates: [ExamDateCells; 4],
}

impl InstituteFields {
    /// Creates fields with no exam dates.
    #[must_use]
    pub fn new(institute_name: &str, institute_code: &str, total_students: i64) -> Self {
        Self {
            institute_name: institute_name.to_string(),
            institute_code: institute_code.to_string(),
            total_students,
            exam_dates: Default::default(),
        }
    }

    /// Returns these fields with the cells for `academic_year` replaced.
    #[must_use]
    pub fn with_exam_dates(mut self, academic_year: AcademicYear, cells: ExamDateCells) -> Self {
        self.exam_dates[academic_year.index()] = cells;
        self
    }
}

/// A stored institute row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstituteData {
    pub institute_id: i64,
    pub institute_name: String,
    pub institute_code: String,
    pub total_students: i64,
    pub exam_dates: [ExamDateCells; 4],
    pub created_at: String,
    pub updated_at: String,
}

impl InstituteData {
    /// Returns the stored cells for an academic year.
    #[must_use]
    pub const fn exam_cells(&self, academic_year: AcademicYear) -> &ExamDateCells {
        &self.exam_dates[academic_year.index()]
    }
}
