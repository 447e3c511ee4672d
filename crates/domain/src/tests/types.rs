// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{AcademicYear, ExamPeriod, InstituteId, InstituteRecord};
use time::macros::date;

#[test]
fn test_academic_year_columns() {
    assert_eq!(AcademicYear::First.start_column(), "exam_start");
    assert_eq!(AcademicYear::First.end_column(), "exams_end");
    assert_eq!(AcademicYear::Second.start_column(), "exam_start_1");
    assert_eq!(AcademicYear::Second.end_column(), "exam_end");
    assert_eq!(AcademicYear::Third.start_column(), "exam_start_2");
    assert_eq!(AcademicYear::Third.end_column(), "exam_end_1");
    assert_eq!(AcademicYear::Fourth.start_column(), "exam_start_3");
    assert_eq!(AcademicYear::Fourth.end_column(), "exam_end_2");
}

#[test]
fn test_exam_period_with_missing_date_is_unscheduled() {
    let period: ExamPeriod = ExamPeriod::new(Some(date!(2025 - 06 - 10)), None);
    assert!(!period.is_scheduled());
    assert_eq!(period.scheduled_span(), None);
}

#[test]
fn test_exam_period_with_reversed_dates_is_unscheduled() {
    let period: ExamPeriod = ExamPeriod::between(date!(2025 - 06 - 12), date!(2025 - 06 - 10));
    assert!(!period.is_scheduled());
}

#[test]
fn test_single_day_exam_period_is_scheduled() {
    let period: ExamPeriod = ExamPeriod::between(date!(2025 - 06 - 10), date!(2025 - 06 - 10));
    assert_eq!(
        period.scheduled_span(),
        Some((date!(2025 - 06 - 10), date!(2025 - 06 - 10)))
    );
}

#[test]
fn test_record_scheduled_periods_skip_absent_slots() {
    let record: InstituteRecord = InstituteRecord::new(InstituteId::new("1"), "Alpha", "A1", 10)
        .with_exam_period(
            AcademicYear::Second,
            ExamPeriod::between(date!(2025 - 03 - 01), date!(2025 - 03 - 05)),
        )
        .with_exam_period(
            AcademicYear::Fourth,
            ExamPeriod::between(date!(2025 - 04 - 01), date!(2025 - 04 - 02)),
        );

    let periods: Vec<(AcademicYear, time::Date, time::Date)> =
        record.scheduled_periods().collect();
    assert_eq!(
        periods,
        vec![
            (
                AcademicYear::Second,
                date!(2025 - 03 - 01),
                date!(2025 - 03 - 05)
            ),
            (
                AcademicYear::Fourth,
                date!(2025 - 04 - 01),
                date!(2025 - 04 - 02)
            ),
        ]
    );
    assert!(!record.exam_period(AcademicYear::First).is_scheduled());
}
