// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! CSV bulk import of institutes.
//!
//! Uploads are read in three steps:
//!
//! 1. `suggest_column_mapping` reads the header row and proposes which
//!    upload column feeds each canonical field. The proposal is never
//!    applied on its own.
//! 2. `preview_csv_institutes` validates every row against a mapping the
//!    operator has confirmed, without writing anything.
//! 3. `import_csv_institutes` upserts the valid rows keyed by
//!    `institute_code`.

use csv::StringRecord;
use examcal_domain::{AcademicYear, MAX_EXAM_YEAR, MIN_EXAM_YEAR, is_null_sentinel, normalize_date};
use examcal_persistence::{InstituteData, InstituteFields, InstituteStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::auth::{AuthenticatedOperator, AuthorizationService};
use crate::error::ApiError;
use crate::institutes::validate_institute_request;
use crate::request_response::{InstituteRequest, StudentCountInput};
use crate::session::DashboardSession;

/// Canonical institute columns, in storage order.
pub const CANONICAL_COLUMNS: [&str; 11] = [
    "institute_name",
    "institute_code",
    "total_students",
    "exam_start",
    "exams_end",
    "exam_start_1",
    "exam_end",
    "exam_start_2",
    "exam_end_1",
    "exam_start_3",
    "exam_end_2",
];

/// Canonical columns every mapping must cover.
pub const REQUIRED_COLUMNS: [&str; 3] = ["institute_name", "institute_code", "total_students"];

/// Which upload header feeds each canonical column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    columns: BTreeMap<String, String>,
}

impl ColumnMapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds `canonical` from `header`, replacing any earlier choice.
    pub fn insert(&mut self, canonical: &str, header: &str) {
        self.columns
            .insert(canonical.to_string(), header.to_string());
    }

    /// Returns the header feeding `canonical`.
    #[must_use]
    pub fn header_for(&self, canonical: &str) -> Option<&str> {
        self.columns.get(canonical).map(String::as_str)
    }

    /// Returns the number of mapped columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns whether nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A proposed mapping awaiting operator confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMappingSuggestion {
    /// Headers found in the upload, as written.
    pub headers: Vec<String>,
    /// The proposed mapping.
    pub mapping: ColumnMapping,
    /// Always `false`: a suggestion must be confirmed before use.
    pub confirmed: bool,
    /// Required columns the suggestion could not fill.
    pub unmapped_required: Vec<String>,
    /// Date columns the suggestion could not fill.
    pub unmapped_optional: Vec<String>,
}

/// Status of a CSV row validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvRowStatus {
    /// Row is valid and can be imported.
    Valid,
    /// Row has validation errors and cannot be imported.
    Invalid,
}

/// What importing a row does, or did, to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvRowAction {
    /// A new institute is created.
    Create,
    /// The first institute with the same code is replaced.
    Update,
    /// The row is not written.
    Skip,
}

/// A single row result from CSV validation or import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRowResult {
    /// The row number (1-based, excluding header).
    pub row_number: usize,
    /// The trimmed institute name, if present.
    pub institute_name: Option<String>,
    /// The trimmed institute code, if present.
    pub institute_code: Option<String>,
    /// The parsed student count, if valid.
    pub total_students: Option<i64>,
    /// The row status.
    pub status: CsvRowStatus,
    /// What importing the row does.
    pub action: CsvRowAction,
    /// The stored institute, once imported.
    pub institute_id: Option<i64>,
    /// Zero or more validation errors.
    pub errors: Vec<String>,
    /// Date cells that could not be read and will be left blank.
    pub date_warnings: Vec<String>,
}

/// Result of CSV preview validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvPreviewResult {
    /// Per-row validation results.
    pub rows: Vec<CsvRowResult>,
    /// Total number of rows.
    pub total_rows: usize,
    /// Number of valid rows.
    pub valid_count: usize,
    /// Number of invalid rows.
    pub invalid_count: usize,
}

/// Result of a CSV import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvImportResult {
    /// Per-row outcomes.
    pub rows: Vec<CsvRowResult>,
    /// Institutes created.
    pub created: usize,
    /// Institutes replaced.
    pub updated: usize,
    /// Rows not written.
    pub skipped: usize,
    /// A message for the operator.
    pub message: String,
}

/// Normalizes a CSV header string for case-insensitive, whitespace-tolerant matching.
#[must_use]
pub fn normalize_header(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("_")
        .to_lowercase()
}

/// Proposes a column mapping for an upload.
///
/// Headers that normalize to a canonical name map to it directly. The
/// remaining name, code and student columns are guessed from keywords.
/// The result is a suggestion only.
///
/// # Errors
///
/// Returns `ApiError::InvalidCsvFormat` if the header row cannot be read.
pub fn suggest_column_mapping(csv_content: &str) -> Result<ColumnMappingSuggestion, ApiError> {
    let headers: Vec<String> = read_headers(csv_content)?.iter().map(String::from).collect();

    let mut mapping: ColumnMapping = ColumnMapping::new();
    let mut used: HashSet<usize> = HashSet::new();

    for canonical in CANONICAL_COLUMNS {
        if let Some(idx) = headers
            .iter()
            .position(|header| normalize_header(header) == canonical)
        {
            mapping.insert(canonical, &headers[idx]);
            used.insert(idx);
        }
    }

    for (canonical, keywords) in KEYWORD_HINTS {
        if mapping.header_for(canonical).is_some() {
            continue;
        }
        let guess: Option<usize> = headers.iter().enumerate().position(|(idx, header)| {
            let normalized: String = normalize_header(header);
            !used.contains(&idx) && keywords.iter().any(|keyword| normalized.contains(keyword))
        });
        if let Some(idx) = guess {
            debug!(canonical, header = %headers[idx], "Guessed column from keywords");
            mapping.insert(canonical, &headers[idx]);
            used.insert(idx);
        }
    }

    let unmapped = |columns: &[&str]| -> Vec<String> {
        columns
            .iter()
            .filter(|canonical| mapping.header_for(canonical).is_none())
            .map(|canonical| (*canonical).to_string())
            .collect()
    };
    let unmapped_required: Vec<String> = unmapped(&REQUIRED_COLUMNS);
    let unmapped_optional: Vec<String> = unmapped(&CANONICAL_COLUMNS[REQUIRED_COLUMNS.len()..]);

    Ok(ColumnMappingSuggestion {
        headers,
        mapping,
        confirmed: false,
        unmapped_required,
        unmapped_optional,
    })
}

/// Previews and validates CSV institute data without writing it.
///
/// # Arguments
///
/// * `store` - The record store, read to decide create or update
/// * `session` - The operator session
/// * `csv_content` - The raw CSV content
/// * `mapping` - The confirmed column mapping
///
/// # Errors
///
/// * `ApiError::Unauthorized` for viewer sessions
/// * `ApiError::InvalidCsvFormat` if the file or mapping cannot be used
pub fn preview_csv_institutes<S: InstituteStore>(
    store: &mut S,
    session: &DashboardSession,
    csv_content: &str,
    mapping: &ColumnMapping,
) -> Result<CsvPreviewResult, ApiError> {
    AuthorizationService::authorize_manage_institutes(session)?;

    let rows: Vec<ParsedRow> = parse_rows(csv_content, mapping)?;
    let mut results: Vec<CsvRowResult> = Vec::with_capacity(rows.len());

    for row in rows {
        let action: CsvRowAction = match &row.fields {
            Some(fields) => {
                if find_existing(store, &fields.institute_code)?.is_some() {
                    CsvRowAction::Update
                } else {
                    CsvRowAction::Create
                }
            }
            None => CsvRowAction::Skip,
        };
        results.push(row.into_result(action, None));
    }

    let valid_count: usize = results
        .iter()
        .filter(|row| row.status == CsvRowStatus::Valid)
        .count();

    Ok(CsvPreviewResult {
        total_rows: results.len(),
        invalid_count: results.len() - valid_count,
        valid_count,
        rows: results,
    })
}

/// Imports valid CSV rows, upserting by `institute_code`.
///
/// A row whose code is already stored replaces the first stored match;
/// other valid rows create institutes. Invalid rows and rows the store
/// rejects are skipped.
///
/// # Errors
///
/// * `ApiError::Unauthorized` for viewer sessions
/// * `ApiError::InvalidCsvFormat` if the file or mapping cannot be used
pub fn import_csv_institutes<S: InstituteStore>(
    store: &mut S,
    session: &DashboardSession,
    csv_content: &str,
    mapping: &ColumnMapping,
) -> Result<CsvImportResult, ApiError> {
    let operator: &AuthenticatedOperator =
        AuthorizationService::authorize_manage_institutes(session)?;

    let rows: Vec<ParsedRow> = parse_rows(csv_content, mapping)?;
    let mut results: Vec<CsvRowResult> = Vec::with_capacity(rows.len());
    let mut created: usize = 0;
    let mut updated: usize = 0;
    let mut skipped: usize = 0;

    for mut row in rows {
        let Some(fields) = row.fields.take() else {
            skipped += 1;
            results.push(row.into_result(CsvRowAction::Skip, None));
            continue;
        };

        match upsert(store, &fields) {
            Ok((CsvRowAction::Update, institute_id)) => {
                updated += 1;
                results.push(row.into_result(CsvRowAction::Update, Some(institute_id)));
            }
            Ok((action, institute_id)) => {
                created += 1;
                results.push(row.into_result(action, Some(institute_id)));
            }
            Err(e) => {
                warn!(row = row.row_number, error = %e, "Failed to store CSV row");
                skipped += 1;
                row.errors.push(e.to_string());
                let mut result: CsvRowResult = row.into_result(CsvRowAction::Skip, None);
                result.status = CsvRowStatus::Invalid;
                results.push(result);
            }
        }
    }

    info!(
        operator = %operator.login_name,
        created,
        updated,
        skipped,
        "Imported institutes from CSV"
    );

    Ok(CsvImportResult {
        rows: results,
        created,
        updated,
        skipped,
        message: format!(
            "Imported {} institutes ({created} added, {updated} updated, {skipped} skipped). \
             Refresh the heatmap to see the changes.",
            created + updated
        ),
    })
}

/// Keywords used to guess the required columns.
const KEYWORD_HINTS: [(&str, &[&str]); 3] = [
    ("institute_code", &["code"]),
    ("institute_name", &["name", "institute", "college"]),
    (
        "total_students",
        &["student", "strength", "enrol", "intake", "count"],
    ),
];

/// A CSV row after mapping and validation.
struct ParsedRow {
    row_number: usize,
    institute_name: Option<String>,
    institute_code: Option<String>,
    total_students: Option<i64>,
    fields: Option<InstituteFields>,
    errors: Vec<String>,
    date_warnings: Vec<String>,
}

impl ParsedRow {
    fn into_result(self, action: CsvRowAction, institute_id: Option<i64>) -> CsvRowResult {
        let status: CsvRowStatus = if self.errors.is_empty() {
            CsvRowStatus::Valid
        } else {
            CsvRowStatus::Invalid
        };
        CsvRowResult {
            row_number: self.row_number,
            institute_name: self.institute_name,
            institute_code: self.institute_code,
            total_students: self.total_students,
            status,
            action,
            institute_id,
            errors: self.errors,
            date_warnings: self.date_warnings,
        }
    }
}

fn read_headers(csv_content: &str) -> Result<StringRecord, ApiError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(csv_content.as_bytes());

    let headers: StringRecord = reader
        .headers()
        .map_err(|e| ApiError::InvalidCsvFormat {
            reason: format!("Failed to read CSV headers: {e}"),
        })?
        .clone();

    if headers.iter().all(|header| header.trim().is_empty()) {
        return Err(ApiError::InvalidCsvFormat {
            reason: String::from("CSV file has no header row"),
        });
    }
    Ok(headers)
}

/// Resolves a confirmed mapping against the upload's header row.
fn resolve_mapping(
    headers: &StringRecord,
    mapping: &ColumnMapping,
) -> Result<HashMap<&'static str, usize>, ApiError> {
    if mapping.is_empty() {
        return Err(ApiError::InvalidCsvFormat {
            reason: String::from("No columns are mapped; confirm a column mapping first"),
        });
    }

    for canonical in mapping.columns.keys() {
        if !CANONICAL_COLUMNS.contains(&canonical.as_str()) {
            return Err(ApiError::InvalidCsvFormat {
                reason: format!("Unknown column '{canonical}' in mapping"),
            });
        }
    }

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|canonical| mapping.header_for(canonical).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::InvalidCsvFormat {
            reason: format!("Mapping leaves required columns unmapped: {}", missing.join(", ")),
        });
    }

    let mut resolved: HashMap<&'static str, usize> = HashMap::new();
    for canonical in CANONICAL_COLUMNS {
        let Some(header) = mapping.header_for(canonical) else {
            continue;
        };
        let wanted: String = normalize_header(header);
        let idx: usize = headers
            .iter()
            .position(|candidate| normalize_header(candidate) == wanted)
            .ok_or_else(|| ApiError::InvalidCsvFormat {
                reason: format!("Mapped header '{header}' for '{canonical}' is not in the file"),
            })?;
        resolved.insert(canonical, idx);
    }

    debug!(mapped = mapping.len(), "Resolved column mapping");
    Ok(resolved)
}

fn parse_rows(csv_content: &str, mapping: &ColumnMapping) -> Result<Vec<ParsedRow>, ApiError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(csv_content.as_bytes());

    let headers: StringRecord = reader
        .headers()
        .map_err(|e| ApiError::InvalidCsvFormat {
            reason: format!("Failed to read CSV headers: {e}"),
        })?
        .clone();
    let columns: HashMap<&'static str, usize> = resolve_mapping(&headers, mapping)?;

    let mut rows: Vec<ParsedRow> = Vec::new();
    let mut seen_codes: HashSet<String> = HashSet::new();

    for (idx, result) in reader.records().enumerate() {
        let row_number: usize = idx + 1;

        let record: StringRecord = match result {
            Ok(rec) => rec,
            Err(e) => {
                rows.push(ParsedRow {
                    row_number,
                    institute_name: None,
                    institute_code: None,
                    total_students: None,
                    fields: None,
                    errors: vec![format!("CSV parse error: {e}")],
                    date_warnings: Vec::new(),
                });
                continue;
            }
        };

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut row: ParsedRow = parse_row(row_number, &record, &columns);

        if let Some(code) = &row.institute_code
            && !seen_codes.insert(code.clone())
        {
            row.errors.push(format!(
                "institute_code: duplicate within CSV - '{code}' appears on an earlier row"
            ));
            row.fields = None;
        }

        rows.push(row);
    }

    debug!(rows = rows.len(), "Parsed CSV rows");
    Ok(rows)
}

fn parse_row(
    row_number: usize,
    record: &StringRecord,
    columns: &HashMap<&'static str, usize>,
) -> ParsedRow {
    let get_field = |name: &str| -> Option<String> {
        columns
            .get(name)
            .and_then(|&idx| record.get(idx))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let mut request: InstituteRequest = InstituteRequest {
        institute_name: get_field("institute_name").unwrap_or_default(),
        institute_code: get_field("institute_code").unwrap_or_default(),
        total_students: StudentCountInput::Text(get_field("total_students").unwrap_or_default()),
        ..InstituteRequest::default()
    };

    let mut date_warnings: Vec<String> = Vec::new();
    for academic_year in AcademicYear::ALL {
        let start: Option<String> =
            readable_date_cell(academic_year.start_column(), &get_field, &mut date_warnings);
        let end: Option<String> =
            readable_date_cell(academic_year.end_column(), &get_field, &mut date_warnings);
        request.set_exam_cells(academic_year, start, end);
    }

    let institute_name: Option<String> = get_field("institute_name");
    let institute_code: Option<String> = get_field("institute_code");

    match validate_institute_request(&request) {
        Ok(fields) => ParsedRow {
            row_number,
            institute_name,
            institute_code,
            total_students: Some(fields.total_students),
            fields: Some(fields),
            errors: Vec::new(),
            date_warnings,
        },
        Err(errors) => ParsedRow {
            row_number,
            institute_name,
            institute_code,
            total_students: None,
            fields: None,
            errors: errors.iter().map(ToString::to_string).collect(),
            date_warnings,
        },
    }
}

/// Returns a date cell if it can be read, recording a warning otherwise.
fn readable_date_cell(
    column: &str,
    get_field: &impl Fn(&str) -> Option<String>,
    warnings: &mut Vec<String>,
) -> Option<String> {
    let raw: String = get_field(column)?;
    match normalize_date(&raw) {
        Ok(None) if !is_null_sentinel(&raw) => {
            warnings.push(format!(
                "{column}: year of '{raw}' is outside {MIN_EXAM_YEAR}-{MAX_EXAM_YEAR}; left blank"
            ));
            None
        }
        Ok(_) => Some(raw),
        Err(e) => {
            warnings.push(format!("{column}: {e}; left blank"));
            None
        }
    }
}

fn find_existing<S: InstituteStore>(
    store: &mut S,
    institute_code: &str,
) -> Result<Option<InstituteData>, ApiError> {
    store
        .find_institutes_by_code(institute_code)
        .map(|matches| matches.into_iter().next())
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to look up institute code: {e}"),
        })
}

fn upsert<S: InstituteStore>(
    store: &mut S,
    fields: &InstituteFields,
) -> Result<(CsvRowAction, i64), ApiError> {
    match find_existing(store, &fields.institute_code)? {
        Some(existing) => {
            store.update_institute(existing.institute_id, fields)?;
            Ok((CsvRowAction::Update, existing.institute_id))
        }
        None => {
            let institute_id: i64 = store.create_institute(fields)?;
            Ok((CsvRowAction::Create, institute_id))
        }
    }
}
