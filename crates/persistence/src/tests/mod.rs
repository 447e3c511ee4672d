// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.


use crate::{ExamDateCells, InstituteFields};
use examcal_domain::AcademicYear;

pub fn create_test_fields(code: &str) -> InstituteFields {
    InstituteFields::new(&format!("Institute {code}"), code, 120).with_exam_dates(
        AcademicYear::First,
        ExamDateCells::new(
            Some(String::from("10-06-2025")),
            Some(String::from("12-06-2025")),
        ),
    )
}
