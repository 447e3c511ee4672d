// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::institute_with_exam;
use crate::{
    AcademicYear, DateRange, ExamPeriod, InstituteId, InstituteRecord, RangeExamReport,
    RangeSummary, YearAvailability, compute_daily_availability, exams_in_range, summarize_range,
};
use time::macros::date;

fn june_2025() -> DateRange {
    DateRange::new(date!(2025 - 06 - 01), date!(2025 - 06 - 30)).unwrap()
}

#[test]
fn test_partial_overlap_is_included() {
    let records: Vec<InstituteRecord> = vec![
        institute_with_exam("A", "Alpha", 10, date!(2025 - 05 - 30), date!(2025 - 06 - 02)),
        institute_with_exam("B", "Beta", 10, date!(2025 - 07 - 01), date!(2025 - 07 - 05)),
    ];

    let report: RangeExamReport = exams_in_range(&records, &june_2025());

    assert_eq!(report.institutes, vec![String::from("Alpha")]);
    assert!(!report.is_empty());
}

#[test]
fn test_names_are_sorted_and_deduplicated() {
    let shared_name: InstituteRecord = InstituteRecord::new(InstituteId::new("3"), "Alpha", "A2", 5)
        .with_exam_period(
            AcademicYear::Second,
            ExamPeriod::between(date!(2025 - 06 - 03), date!(2025 - 06 - 04)),
        )
        .with_exam_period(
            AcademicYear::Third,
            ExamPeriod::between(date!(2025 - 06 - 20), date!(2025 - 06 - 21)),
        );
    let records: Vec<InstituteRecord> = vec![
        institute_with_exam("Z", "Zeta", 10, date!(2025 - 06 - 10), date!(2025 - 06 - 12)),
        institute_with_exam("A", "Alpha", 10, date!(2025 - 06 - 10), date!(2025 - 06 - 12)),
        shared_name,
    ];

    let report: RangeExamReport = exams_in_range(&records, &june_2025());

    assert_eq!(
        report.institutes,
        vec![String::from("Alpha"), String::from("Zeta")]
    );
    assert_eq!(report.by_academic_year.len(), 4);
    assert_eq!(
        report.by_academic_year[0].institutes,
        vec![String::from("Alpha"), String::from("Zeta")]
    );
    assert_eq!(report.by_academic_year[1].academic_year, AcademicYear::Second);
    assert_eq!(
        report.by_academic_year[1].institutes,
        vec![String::from("Alpha")]
    );
    assert_eq!(
        report.by_academic_year[2].institutes,
        vec![String::from("Alpha")]
    );
    assert!(report.by_academic_year[3].institutes.is_empty());
}

#[test]
fn test_unscheduled_periods_never_overlap() {
    let record: InstituteRecord = InstituteRecord::new(InstituteId::new("1"), "Alpha", "A", 5)
        .with_exam_period(
            AcademicYear::First,
            ExamPeriod::new(Some(date!(2025 - 06 - 10)), None),
        );

    let report: RangeExamReport = exams_in_range(&[record], &june_2025());

    assert!(report.is_empty());
}

#[test]
fn test_summary_averages_are_truncated() {
    let records: Vec<InstituteRecord> = vec![
        institute_with_exam("A", "Alpha", 200, date!(2025 - 06 - 10), date!(2025 - 06 - 12)),
        institute_with_exam("B", "Beta", 50, date!(2025 - 06 - 11), date!(2025 - 06 - 15)),
    ];
    let availability: YearAvailability = compute_daily_availability(&records, 2025).unwrap();
    let range: DateRange = DateRange::new(date!(2025 - 06 - 10), date!(2025 - 06 - 12)).unwrap();

    let summary: RangeSummary = summarize_range(&availability, &range).unwrap();

    // Daily institutes available: 1, 0, 0. Students: 50, 0, 0.
    assert_eq!(summary.days, 3);
    assert_eq!(summary.average_institutes_available, 0);
    assert_eq!(summary.average_institutes_busy, 2);
    assert_eq!(summary.average_students_available, 16);
    assert_eq!(summary.average_students_busy, 234);
    assert!((summary.average_institute_percentage - 50.0 / 3.0).abs() < 1e-9);
    assert!((summary.busy_institute_percentage - (100.0 - 50.0 / 3.0)).abs() < 1e-9);
    assert!((summary.average_student_percentage - 20.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_summary_outside_year_is_none() {
    let availability: YearAvailability = compute_daily_availability(&[], 2025).unwrap();
    let range: DateRange = DateRange::new(date!(2026 - 06 - 01), date!(2026 - 06 - 30)).unwrap();

    assert!(summarize_range(&availability, &range).is_none());
}
