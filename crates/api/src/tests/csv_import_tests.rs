// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use examcal_domain::AcademicYear;
use examcal_persistence::{InstituteData, InstituteStore, Persistence};

use crate::tests::helpers::{
    create_operator_session, create_test_persistence, create_viewer_session, store_institute,
};
use crate::{
    ApiError, ColumnMapping, ColumnMappingSuggestion, CsvImportResult, CsvPreviewResult,
    CsvRowAction, CsvRowStatus, import_csv_institutes, normalize_header, preview_csv_institutes,
    suggest_column_mapping,
};

const CANONICAL_CSV: &str = "\
Institute Name,Institute Code,Total Students,Exam Start,Exams End
Alpha College,A1,120,02-06-2025,05-06-2025
Beta College,B1,80,,
";

impl ColumnMapping {
    fn with(mut self, canonical: &str, header: &str) -> Self {
        self.insert(canonical, header);
        self
    }
}

fn canonical_mapping() -> ColumnMapping {
    ColumnMapping::new()
        .with("institute_name", "Institute Name")
        .with("institute_code", "Institute Code")
        .with("total_students", "Total Students")
        .with("exam_start", "Exam Start")
        .with("exams_end", "Exams End")
}

#[test]
fn test_normalize_header() {
    assert_eq!(normalize_header("  Institute   Name "), "institute_name");
    assert_eq!(normalize_header("EXAM_START_1"), "exam_start_1");
}

#[test]
fn test_suggestion_matches_canonical_headers() {
    let suggestion: ColumnMappingSuggestion = suggest_column_mapping(CANONICAL_CSV).unwrap();

    assert!(!suggestion.confirmed);
    assert_eq!(suggestion.mapping, canonical_mapping());
    assert!(suggestion.unmapped_required.is_empty());
    assert!(suggestion.unmapped_optional.contains(&String::from("exam_start_1")));
}

#[test]
fn test_suggestion_guesses_from_keywords() {
    let csv: &str = "College,College Code,Student Strength,Notes\nAlpha,A,10,x\n";

    let suggestion: ColumnMappingSuggestion = suggest_column_mapping(csv).unwrap();

    assert_eq!(suggestion.mapping.header_for("institute_code"), Some("College Code"));
    assert_eq!(suggestion.mapping.header_for("institute_name"), Some("College"));
    assert_eq!(
        suggestion.mapping.header_for("total_students"),
        Some("Student Strength")
    );
    assert!(!suggestion.confirmed);
}

#[test]
fn test_suggestion_reports_unmapped_required_columns() {
    let suggestion: ColumnMappingSuggestion =
        suggest_column_mapping("Foo,Bar\n1,2\n").unwrap();

    assert_eq!(suggestion.unmapped_required.len(), 3);
}

#[test]
fn test_mapping_must_cover_required_columns() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    let mapping: ColumnMapping = ColumnMapping::new()
        .with("institute_name", "Institute Name")
        .with("institute_code", "Institute Code");

    let result = preview_csv_institutes(&mut persistence, &session, CANONICAL_CSV, &mapping);

    assert!(matches!(result, Err(ApiError::InvalidCsvFormat { .. })));
}

#[test]
fn test_mapping_must_name_present_headers() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    let mapping: ColumnMapping = canonical_mapping().with("exam_start_1", "Second Year Start");

    let result = preview_csv_institutes(&mut persistence, &session, CANONICAL_CSV, &mapping);

    assert!(matches!(result, Err(ApiError::InvalidCsvFormat { .. })));
}

#[test]
fn test_empty_mapping_is_rejected() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    let mapping: ColumnMapping = ColumnMapping::new();
    assert!(mapping.is_empty());

    let result = preview_csv_institutes(&mut persistence, &session, CANONICAL_CSV, &mapping);

    assert!(matches!(
        result,
        Err(ApiError::InvalidCsvFormat { reason }) if reason.contains("No columns are mapped")
    ));
    assert_eq!(canonical_mapping().len(), 5);
}

#[test]
fn test_mapping_rejects_unknown_canonical_column() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    let mapping: ColumnMapping = canonical_mapping().with("campus", "Institute Name");

    let result = preview_csv_institutes(&mut persistence, &session, CANONICAL_CSV, &mapping);

    assert!(matches!(result, Err(ApiError::InvalidCsvFormat { .. })));
}

#[test]
fn test_viewer_cannot_preview_or_import() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_viewer_session();

    let preview =
        preview_csv_institutes(&mut persistence, &session, CANONICAL_CSV, &canonical_mapping());
    let import =
        import_csv_institutes(&mut persistence, &session, CANONICAL_CSV, &canonical_mapping());

    assert!(matches!(preview, Err(ApiError::Unauthorized { .. })));
    assert!(matches!(import, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_preview_validates_without_writing() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    store_institute(&mut persistence, "Old Beta", "B1", 10, None);
    let csv: &str = "\
Institute Name,Institute Code,Total Students,Exam Start,Exams End
Alpha College,A1,120,02-06-2025,05-06-2025
Beta College,B1,80,,
,C1,abc,,
Alpha Again,A1,50,,
Delta,D1,30,someday,
";

    let preview: CsvPreviewResult =
        preview_csv_institutes(&mut persistence, &session, csv, &canonical_mapping()).unwrap();

    assert_eq!(preview.total_rows, 5);
    assert_eq!(preview.valid_count, 3);
    assert_eq!(preview.invalid_count, 2);

    assert_eq!(preview.rows[0].action, CsvRowAction::Create);
    assert_eq!(preview.rows[1].action, CsvRowAction::Update);

    assert_eq!(preview.rows[2].status, CsvRowStatus::Invalid);
    assert_eq!(preview.rows[2].errors.len(), 2);

    assert_eq!(preview.rows[3].status, CsvRowStatus::Invalid);
    assert!(preview.rows[3].errors[0].contains("duplicate within CSV"));

    assert_eq!(preview.rows[4].status, CsvRowStatus::Valid);
    assert_eq!(preview.rows[4].date_warnings.len(), 1);
    assert!(preview.rows[4].date_warnings[0].starts_with("exam_start"));

    assert_eq!(persistence.fetch_all_institutes().unwrap().len(), 1);
}

#[test]
fn test_preview_blanks_out_of_range_year() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    let csv: &str = "\
Institute Name,Institute Code,Total Students,Exam Start,Exams End
Alpha College,A1,120,19-05-1999,05-06-2025
";

    let preview: CsvPreviewResult =
        preview_csv_institutes(&mut persistence, &session, csv, &canonical_mapping()).unwrap();

    assert_eq!(preview.valid_count, 1);
    assert_eq!(preview.rows[0].status, CsvRowStatus::Valid);
    assert_eq!(preview.rows[0].date_warnings.len(), 1);
    assert!(preview.rows[0].date_warnings[0].contains("outside 2000-2099"));
}

#[test]
fn test_import_upserts_by_code() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    let existing: i64 = store_institute(&mut persistence, "Old Beta", "B1", 10, None);
    let csv: &str = "\
Institute Name,Institute Code,Total Students,Exam Start,Exams End
Alpha College,A1,120,2025-06-02,5 Jun 2025
Beta College,B1,80,,
Broken,,12,,
";

    let result: CsvImportResult =
        import_csv_institutes(&mut persistence, &session, csv, &canonical_mapping()).unwrap();

    assert_eq!(result.created, 1);
    assert_eq!(result.updated, 1);
    assert_eq!(result.skipped, 1);
    assert_eq!(result.rows[1].institute_id, Some(existing));
    assert_eq!(result.rows[2].action, CsvRowAction::Skip);

    let stored: Vec<InstituteData> = persistence.fetch_all_institutes().unwrap();
    assert_eq!(stored.len(), 2);

    let beta: &InstituteData = stored
        .iter()
        .find(|row| row.institute_code == "B1")
        .unwrap();
    assert_eq!(beta.institute_name, "Beta College");
    assert_eq!(beta.total_students, 80);

    let alpha: &InstituteData = stored
        .iter()
        .find(|row| row.institute_code == "A1")
        .unwrap();
    let cells = alpha.exam_cells(AcademicYear::First);
    assert_eq!(cells.start.as_deref(), Some("02-06-2025"));
    assert_eq!(cells.end.as_deref(), Some("05-06-2025"));
}

#[test]
fn test_import_skips_blank_lines() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    let csv: &str = "Institute Name,Institute Code,Total Students\nAlpha,A,10\n,,\nBeta,B,20\n";
    let mapping: ColumnMapping = ColumnMapping::new()
        .with("institute_name", "Institute Name")
        .with("institute_code", "Institute Code")
        .with("total_students", "Total Students");

    let result: CsvImportResult =
        import_csv_institutes(&mut persistence, &session, csv, &mapping).unwrap();

    assert_eq!(result.created, 2);
    assert_eq!(result.skipped, 0);
}
