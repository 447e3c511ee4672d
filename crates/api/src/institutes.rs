// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator management of institute records.
//!
//! Every operation checks that the session belongs to a logged-in operator
//! before touching the store. Input is validated and exam dates are stored
//! in canonical `DD-MM-YYYY` form. Nothing is cached: callers re-fetch the
//! heatmap to see a change.

use examcal_domain::{
    AcademicYear, DomainError, MAX_EXAM_YEAR, MIN_EXAM_YEAR, format_canonical, is_null_sentinel,
    normalize_date,
};
use examcal_persistence::{
    ExamDateCells, InstituteData, InstituteFields, InstituteStore, PAGE_SIZE,
};
use time::Date;
use tracing::info;

use crate::auth::{AuthenticatedOperator, AuthorizationService};
use crate::error::{ApiError, translate_domain_error};
use crate::request_response::{
    InstituteInfo, InstituteMutationResponse, InstituteRequest, ListInstitutesRequest,
    ListInstitutesResponse, StudentCountInput,
};
use crate::session::DashboardSession;

const REFRESH_HINT: &str = "Refresh the heatmap to see the change.";

/// Validates an institute request and converts it into storable fields.
///
/// Names and codes are trimmed. Date cells may be blank or in any
/// supported format and are stored canonically.
///
/// # Errors
///
/// Returns every problem found, in field order.
pub fn validate_institute_request(
    request: &InstituteRequest,
) -> Result<InstituteFields, Vec<ApiError>> {
    let mut errors: Vec<ApiError> = Vec::new();

    let institute_name: &str = request.institute_name.trim();
    if institute_name.is_empty() {
        errors.push(translate_domain_error(DomainError::InvalidInstituteName(
            String::from("Institute name cannot be empty"),
        )));
    }

    let institute_code: &str = request.institute_code.trim();
    if institute_code.is_empty() {
        errors.push(translate_domain_error(DomainError::InvalidInstituteCode(
            String::from("Institute code cannot be empty"),
        )));
    }

    let total_students: i64 = parse_student_count(&request.total_students).unwrap_or_else(|e| {
        errors.push(e);
        0
    });

    let mut fields: InstituteFields =
        InstituteFields::new(institute_name, institute_code, total_students);

    for academic_year in AcademicYear::ALL {
        let (raw_start, raw_end): (Option<&str>, Option<&str>) =
            request.exam_cells(academic_year);
        let start: Option<Date> =
            parse_date_cell(academic_year.start_column(), raw_start, &mut errors);
        let end: Option<Date> = parse_date_cell(academic_year.end_column(), raw_end, &mut errors);

        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            errors.push(translate_domain_error(DomainError::InvalidExamPeriod {
                academic_year,
                start,
                end,
            }));
        }

        let cells: ExamDateCells = ExamDateCells::new(
            canonical_cell(start, &mut errors),
            canonical_cell(end, &mut errors),
        );
        fields = fields.with_exam_dates(academic_year, cells);
    }

    if errors.is_empty() {
        Ok(fields)
    } else {
        Err(errors)
    }
}

/// Parses a student count.
///
/// Whole numbers written with a zero fraction (`"120.0"`, as spreadsheets
/// export them) are accepted.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` for blank, negative, fractional or
/// non-numeric input.
pub fn parse_student_count(input: &StudentCountInput) -> Result<i64, ApiError> {
    let invalid = |message: String| translate_domain_error(DomainError::InvalidStudentCount(message));

    let value: i64 = match input {
        StudentCountInput::Number(value) => *value,
        StudentCountInput::Text(text) => {
            let text: &str = text.trim();
            if text.is_empty() {
                return Err(invalid(String::from("Student count is required")));
            }
            match text.parse::<i64>() {
                Ok(value) => value,
                Err(_) => parse_whole_decimal(text).ok_or_else(|| {
                    invalid(format!("'{text}' is not a whole number"))
                })?,
            }
        }
    };

    if value < 0 {
        return Err(invalid(format!("Student count cannot be negative, got {value}")));
    }
    Ok(value)
}

/// Lists one page of stored institutes.
///
/// # Errors
///
/// * `ApiError::Unauthorized` for viewer sessions
/// * `ApiError::InvalidInput` for a page size outside `1..=PAGE_SIZE` or a
///   negative offset
pub fn list_institutes<S: InstituteStore>(
    store: &mut S,
    session: &DashboardSession,
    request: &ListInstitutesRequest,
) -> Result<ListInstitutesResponse, ApiError> {
    AuthorizationService::authorize_manage_institutes(session)?;

    let limit: i64 = request.limit.unwrap_or(PAGE_SIZE);
    let offset: i64 = request.offset.unwrap_or(0);
    if !(1..=PAGE_SIZE).contains(&limit) {
        return Err(ApiError::InvalidInput {
            field: String::from("limit"),
            message: format!("Page size must be between 1 and {PAGE_SIZE}"),
        });
    }
    if offset < 0 {
        return Err(ApiError::InvalidInput {
            field: String::from("offset"),
            message: String::from("Offset cannot be negative"),
        });
    }

    let page: Vec<InstituteData> =
        store
            .list_institutes_page(limit, offset)
            .map_err(|e| ApiError::Internal {
                message: format!("Failed to list institutes: {e}"),
            })?;

    let has_more: bool = i64::try_from(page.len()).is_ok_and(|len| len == limit);

    Ok(ListInstitutesResponse {
        institutes: page.into_iter().map(InstituteInfo::from).collect(),
        limit,
        offset,
        has_more,
    })
}

/// Retrieves one stored institute.
///
/// # Errors
///
/// * `ApiError::Unauthorized` for viewer sessions
/// * `ApiError::ResourceNotFound` for an unknown ID
pub fn get_institute<S: InstituteStore>(
    store: &mut S,
    session: &DashboardSession,
    institute_id: i64,
) -> Result<InstituteInfo, ApiError> {
    AuthorizationService::authorize_manage_institutes(session)?;

    store
        .get_institute(institute_id)
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to read institute: {e}"),
        })?
        .map(InstituteInfo::from)
        .ok_or_else(|| ApiError::ResourceNotFound {
            resource_type: String::from("Institute"),
            message: format!("Institute {institute_id} does not exist"),
        })
}

/// Adds an institute.
///
/// The code must not already be stored. The check and the insert are two
/// separate store calls.
///
/// # Errors
///
/// * `ApiError::Unauthorized` for viewer sessions
/// * `ApiError::InvalidInput` or `ApiError::DomainRuleViolation` for
///   invalid input
/// * `ApiError::DomainRuleViolation` if the code is taken
/// * `ApiError::Internal` if the store rejects the write
pub fn create_institute<S: InstituteStore>(
    store: &mut S,
    session: &DashboardSession,
    request: &InstituteRequest,
) -> Result<InstituteMutationResponse, ApiError> {
    let operator: &AuthenticatedOperator =
        AuthorizationService::authorize_manage_institutes(session)?;
    let fields: InstituteFields = validate_institute_request(request).map_err(combine_errors)?;

    let existing: Vec<InstituteData> = store
        .find_institutes_by_code(&fields.institute_code)
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to check institute code: {e}"),
        })?;
    if !existing.is_empty() {
        return Err(translate_domain_error(DomainError::DuplicateInstituteCode(
            fields.institute_code,
        )));
    }

    let institute_id: i64 = store
        .create_institute(&fields)
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to create institute: {e}"),
        })?;

    info!(
        operator = %operator.login_name,
        institute_id,
        institute_code = %fields.institute_code,
        "Created institute"
    );

    Ok(InstituteMutationResponse {
        institute_id,
        message: format!("Institute '{}' added. {REFRESH_HINT}", fields.institute_name),
    })
}

/// Replaces the fields of a stored institute.
///
/// # Errors
///
/// * `ApiError::Unauthorized` for viewer sessions
/// * `ApiError::InvalidInput` or `ApiError::DomainRuleViolation` for
///   invalid input
/// * `ApiError::ResourceNotFound` for an unknown ID
pub fn update_institute<S: InstituteStore>(
    store: &mut S,
    session: &DashboardSession,
    institute_id: i64,
    request: &InstituteRequest,
) -> Result<InstituteMutationResponse, ApiError> {
    let operator: &AuthenticatedOperator =
        AuthorizationService::authorize_manage_institutes(session)?;
    let fields: InstituteFields = validate_institute_request(request).map_err(combine_errors)?;

    store.update_institute(institute_id, &fields)?;

    info!(
        operator = %operator.login_name,
        institute_id,
        institute_code = %fields.institute_code,
        "Updated institute"
    );

    Ok(InstituteMutationResponse {
        institute_id,
        message: format!("Institute '{}' updated. {REFRESH_HINT}", fields.institute_name),
    })
}

/// Deletes a stored institute.
///
/// # Errors
///
/// * `ApiError::Unauthorized` for viewer sessions
/// * `ApiError::ResourceNotFound` for an unknown ID
pub fn delete_institute<S: InstituteStore>(
    store: &mut S,
    session: &DashboardSession,
    institute_id: i64,
) -> Result<InstituteMutationResponse, ApiError> {
    let operator: &AuthenticatedOperator =
        AuthorizationService::authorize_manage_institutes(session)?;

    store.delete_institute(institute_id)?;

    info!(operator = %operator.login_name, institute_id, "Deleted institute");

    Ok(InstituteMutationResponse {
        institute_id,
        message: format!("Institute {institute_id} deleted. {REFRESH_HINT}"),
    })
}

/// Folds validation problems into one error.
///
/// A single problem is returned as is. Several become one `InvalidInput`
/// naming every offending field and carrying every message.
fn combine_errors(errors: Vec<ApiError>) -> ApiError {
    if errors.len() <= 1 {
        return errors.into_iter().next().unwrap_or_else(|| ApiError::Internal {
            message: String::from("Validation failed without a reason"),
        });
    }

    let (fields, messages): (Vec<String>, Vec<String>) = errors
        .into_iter()
        .map(|error| match error {
            ApiError::InvalidInput { field, message } => (field, message),
            ApiError::DomainRuleViolation { rule, message } => (rule, message),
            other => (String::from("request"), other.to_string()),
        })
        .unzip();

    ApiError::InvalidInput {
        field: fields.join(", "),
        message: messages.join("; "),
    }
}

fn parse_whole_decimal(text: &str) -> Option<i64> {
    let (whole, fraction): (&str, &str) = text.split_once('.')?;
    if fraction.is_empty() || !fraction.bytes().all(|b| b == b'0') {
        return None;
    }
    whole.parse::<i64>().ok()
}

fn parse_date_cell(column: &str, raw: Option<&str>, errors: &mut Vec<ApiError>) -> Option<Date> {
    let raw: &str = raw?;
    match normalize_date(raw) {
        Ok(None) if !is_null_sentinel(raw) => {
            errors.push(ApiError::InvalidInput {
                field: column.to_string(),
                message: format!(
                    "Date '{}' must fall between {MIN_EXAM_YEAR} and {MAX_EXAM_YEAR}",
                    raw.trim()
                ),
            });
            None
        }
        Ok(date) => date,
        Err(e) => {
            errors.push(ApiError::InvalidInput {
                field: column.to_string(),
                message: e.to_string(),
            });
            None
        }
    }
}

fn canonical_cell(date: Option<Date>, errors: &mut Vec<ApiError>) -> Option<String> {
    match date.map(format_canonical).transpose() {
        Ok(text) => text,
        Err(e) => {
            errors.push(translate_domain_error(e));
            None
        }
    }
}
