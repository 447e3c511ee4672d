// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

mod range;
mod types;

use crate::{AcademicYear, ExamPeriod, InstituteId, InstituteRecord};
use time::Date;

/// Builds a record with a single I year exam period.
fn institute_with_exam(
    id: &str,
    name: &str,
    total_students: u32,
    start: Date,
    end: Date,
) -> InstituteRecord {
    InstituteRecord::new(InstituteId::new(id), name, id, total_students)
        .with_exam_period(AcademicYear::First, ExamPeriod::between(start, end))
}
