// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use examcal_domain::AcademicYear;
use examcal_persistence::{InstituteData, InstituteStore, Persistence};

use crate::tests::helpers::{
    create_operator_session, create_test_persistence, create_test_request, create_viewer_session,
    store_institute,
};
use crate::{
    ApiError, InstituteInfo, InstituteMutationResponse, InstituteRequest, ListInstitutesRequest,
    ListInstitutesResponse, StudentCountInput, create_institute, delete_institute, get_institute,
    list_institutes, parse_student_count, update_institute, validate_institute_request,
};

#[test]
fn test_create_stores_canonical_dates() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    let mut request: InstituteRequest = create_test_request("  Alpha College ", " A1 ", 120);
    request.exam_start = Some(String::from("2025/06/02"));
    request.exams_end = Some(String::from("5 Jun 2025"));

    let response: InstituteMutationResponse =
        create_institute(&mut persistence, &session, &request).expect("create succeeds");

    assert!(response.message.contains("Refresh"));
    let stored: InstituteData = persistence
        .get_institute(response.institute_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.institute_name, "Alpha College");
    assert_eq!(stored.institute_code, "A1");
    assert_eq!(stored.total_students, 120);
    let cells = stored.exam_cells(AcademicYear::First);
    assert_eq!(cells.start.as_deref(), Some("02-06-2025"));
    assert_eq!(cells.end.as_deref(), Some("05-06-2025"));
    assert!(stored.exam_cells(AcademicYear::Second).start.is_none());
}

#[test]
fn test_viewer_cannot_create() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_viewer_session();

    let result = create_institute(
        &mut persistence,
        &session,
        &create_test_request("Alpha", "A", 10),
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    assert!(persistence.fetch_all_institutes().unwrap().is_empty());
}

#[test]
fn test_create_rejects_existing_code() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    store_institute(&mut persistence, "Alpha", "A", 10, None);

    let result = create_institute(
        &mut persistence,
        &session,
        &create_test_request("Another Alpha", "A", 20),
    );

    assert!(matches!(result, Err(ApiError::DomainRuleViolation { .. })));
}

#[test]
fn test_validation_reports_every_problem() {
    let mut request: InstituteRequest = create_test_request(" ", "", -3);
    request.exam_start_1 = Some(String::from("not a date"));

    let errors: Vec<ApiError> = validate_institute_request(&request).unwrap_err();

    assert_eq!(errors.len(), 4);
    assert!(errors.iter().all(|e| matches!(e, ApiError::InvalidInput { .. })));
    assert!(matches!(
        &errors[3],
        ApiError::InvalidInput { field, .. } if field == "exam_start_1"
    ));
}

#[test]
fn test_create_reports_every_invalid_field() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    let mut request: InstituteRequest = create_test_request(" ", "", 10);
    request.exam_start_1 = Some(String::from("not a date"));

    let result = create_institute(&mut persistence, &session, &request);

    match result {
        Err(ApiError::InvalidInput { field, message }) => {
            assert_eq!(field, "institute_name, institute_code, exam_start_1");
            assert_eq!(message.split("; ").count(), 3);
        }
        other => panic!("expected combined InvalidInput, got {other:?}"),
    }
    assert!(persistence.fetch_all_institutes().unwrap().is_empty());
}

#[test]
fn test_update_with_single_problem_keeps_its_kind() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    let id: i64 = store_institute(&mut persistence, "Alpha", "A", 10, None);
    let mut request: InstituteRequest = create_test_request("Alpha", "A", 10);
    request.exam_start = Some(String::from("10-06-2025"));
    request.exams_end = Some(String::from("01-06-2025"));

    let result = update_institute(&mut persistence, &session, id, &request);

    assert!(matches!(result, Err(ApiError::DomainRuleViolation { .. })));
}

#[test]
fn test_validation_rejects_out_of_range_year() {
    let mut request: InstituteRequest = create_test_request("Alpha", "A", 10);
    request.exam_start = Some(String::from("19-05-1999"));
    request.exams_end = Some(String::from("None"));

    let errors: Vec<ApiError> = validate_institute_request(&request).unwrap_err();

    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        ApiError::InvalidInput { field, .. } if field == "exam_start"
    ));
}

#[test]
fn test_validation_rejects_reversed_period() {
    let mut request: InstituteRequest = create_test_request("Alpha", "A", 10);
    request.exam_start_3 = Some(String::from("10-06-2025"));
    request.exam_end_2 = Some(String::from("01-06-2025"));

    let errors: Vec<ApiError> = validate_institute_request(&request).unwrap_err();

    assert!(matches!(errors[0], ApiError::DomainRuleViolation { .. }));
}

#[test]
fn test_validation_treats_sentinels_as_blank() {
    let mut request: InstituteRequest = create_test_request("Alpha", "A", 10);
    request.exam_start = Some(String::from("NaT"));
    request.exams_end = Some(String::new());

    let fields = validate_institute_request(&request).expect("valid request");

    assert!(fields.exam_dates[0].start.is_none());
    assert!(fields.exam_dates[0].end.is_none());
}

#[test]
fn test_parse_student_count() {
    assert_eq!(parse_student_count(&StudentCountInput::Number(12)).unwrap(), 12);
    assert_eq!(
        parse_student_count(&StudentCountInput::Text(String::from(" 340 "))).unwrap(),
        340
    );
    assert_eq!(
        parse_student_count(&StudentCountInput::Text(String::from("120.0"))).unwrap(),
        120
    );
    assert_eq!(parse_student_count(&StudentCountInput::Number(0)).unwrap(), 0);

    for bad in ["", "12.5", "lots", "-1"] {
        assert!(
            parse_student_count(&StudentCountInput::Text(String::from(bad))).is_err(),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn test_update_replaces_fields() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    let id: i64 = store_institute(&mut persistence, "Alpha", "A", 10, None);

    update_institute(
        &mut persistence,
        &session,
        id,
        &create_test_request("Alpha Renamed", "A2", 15),
    )
    .expect("update succeeds");

    let info: InstituteInfo = get_institute(&mut persistence, &session, id).unwrap();
    assert_eq!(info.institute_name, "Alpha Renamed");
    assert_eq!(info.institute_code, "A2");
    assert_eq!(info.total_students, 15);
    assert_eq!(info.exam_dates.len(), 4);
    assert_eq!(info.exam_dates[3].academic_year, "IV year");
}

#[test]
fn test_update_and_delete_unknown_institute() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();

    let updated = update_institute(
        &mut persistence,
        &session,
        404,
        &create_test_request("Ghost", "G", 1),
    );
    let deleted = delete_institute(&mut persistence, &session, 404);
    let fetched = get_institute(&mut persistence, &session, 404);

    assert!(matches!(updated, Err(ApiError::ResourceNotFound { .. })));
    assert!(matches!(deleted, Err(ApiError::ResourceNotFound { .. })));
    assert!(matches!(fetched, Err(ApiError::ResourceNotFound { .. })));
}

#[test]
fn test_delete_removes_institute() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    let id: i64 = store_institute(&mut persistence, "Alpha", "A", 10, None);

    delete_institute(&mut persistence, &session, id).expect("delete succeeds");

    assert!(persistence.get_institute(id).unwrap().is_none());
}

#[test]
fn test_list_pages_and_limits() {
    let mut persistence: Persistence = create_test_persistence();
    let session = create_operator_session();
    for n in 0..5 {
        store_institute(&mut persistence, &format!("College {n}"), &format!("C{n}"), 10, None);
    }

    let first: ListInstitutesResponse = list_institutes(
        &mut persistence,
        &session,
        &ListInstitutesRequest {
            limit: Some(3),
            offset: None,
        },
    )
    .unwrap();
    assert_eq!(first.institutes.len(), 3);
    assert!(first.has_more);
    assert_eq!(first.institutes[0].institute_code, "C0");

    let second: ListInstitutesResponse = list_institutes(
        &mut persistence,
        &session,
        &ListInstitutesRequest {
            limit: Some(3),
            offset: Some(3),
        },
    )
    .unwrap();
    assert_eq!(second.institutes.len(), 2);
    assert!(!second.has_more);

    let too_big = list_institutes(
        &mut persistence,
        &session,
        &ListInstitutesRequest {
            limit: Some(101),
            offset: None,
        },
    );
    assert!(matches!(too_big, Err(ApiError::InvalidInput { .. })));
}
