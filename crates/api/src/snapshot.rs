// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Loading a validated snapshot from the record store.

use examcal_domain::{
    AcademicYear, DuplicatePolicy, ExamPeriod, InstituteId, InstituteRecord, PreparedSnapshot,
    normalize_date, prepare_snapshot,
};
use examcal_persistence::{ExamDateCells, InstituteData, InstituteStore};
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::{debug, info, warn};

use crate::error::ApiError;

/// Options controlling snapshot preparation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// How duplicate institute codes are handled.
    pub duplicate_policy: DuplicatePolicy,
}

/// A stored date cell that could not be read as a date.
///
/// The cell is treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWarning {
    /// Code of the institute the cell belongs to.
    pub institute_code: String,
    /// Name of the column holding the cell.
    pub column: String,
    /// The raw cell text.
    pub raw: String,
}

/// A validated snapshot plus the advisories raised while reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSnapshot {
    /// The validated records and the filter and duplicate reports.
    pub prepared: PreparedSnapshot,
    /// Stored date cells that could not be parsed.
    pub date_warnings: Vec<DateWarning>,
}

/// Reads every stored institute and prepares it for aggregation.
///
/// # Arguments
///
/// * `store` - The record store
/// * `options` - Snapshot preparation options
///
/// # Errors
///
/// * `ApiError::EmptySnapshot` if the store is empty or every record is
///   filtered out
/// * `ApiError::Internal` if the store cannot be read
pub fn load_snapshot<S: InstituteStore>(
    store: &mut S,
    options: &SnapshotOptions,
) -> Result<LoadedSnapshot, ApiError> {
    let rows: Vec<InstituteData> = store.fetch_all_institutes().map_err(|e| ApiError::Internal {
        message: format!("Failed to read institutes: {e}"),
    })?;

    let mut date_warnings: Vec<DateWarning> = Vec::new();
    let records: Vec<InstituteRecord> = rows
        .iter()
        .map(|row| to_institute_record(row, &mut date_warnings))
        .collect();

    if !date_warnings.is_empty() {
        warn!(count = date_warnings.len(), "Unparseable exam dates treated as absent");
    }

    let prepared: PreparedSnapshot = prepare_snapshot(records, options.duplicate_policy)?;

    info!(
        rows = rows.len(),
        institutes = prepared.records.len(),
        filtered_out = prepared.filtered_out.len(),
        duplicate_codes = prepared.duplicates.len(),
        "Loaded snapshot"
    );

    Ok(LoadedSnapshot {
        prepared,
        date_warnings,
    })
}

/// Converts a stored row into a domain record.
///
/// Negative student counts become zero so the row is filtered out;
/// counts too large for `u32` saturate. Unreadable date cells are recorded
/// in `warnings` and treated as absent.
pub fn to_institute_record(row: &InstituteData, warnings: &mut Vec<DateWarning>) -> InstituteRecord {
    let total_students: u32 = u32::try_from(row.total_students.max(0)).unwrap_or(u32::MAX);

    let mut record: InstituteRecord = InstituteRecord::new(
        InstituteId::new(&row.institute_id.to_string()),
        &row.institute_name,
        &row.institute_code,
        total_students,
    );

    for academic_year in AcademicYear::ALL {
        let cells: &ExamDateCells = row.exam_cells(academic_year);
        let start: Option<Date> = read_date_cell(
            row,
            academic_year.start_column(),
            cells.start.as_deref(),
            warnings,
        );
        let end: Option<Date> = read_date_cell(
            row,
            academic_year.end_column(),
            cells.end.as_deref(),
            warnings,
        );
        record = record.with_exam_period(academic_year, ExamPeriod::new(start, end));
    }

    record
}

fn read_date_cell(
    row: &InstituteData,
    column: &str,
    raw: Option<&str>,
    warnings: &mut Vec<DateWarning>,
) -> Option<Date> {
    let raw: &str = raw?;
    match normalize_date(raw) {
        Ok(date) => date,
        Err(e) => {
            debug!(
                institute_code = %row.institute_code,
                column,
                error = %e,
                "Unparseable exam date"
            );
            warnings.push(DateWarning {
                institute_code: row.institute_code.trim().to_string(),
                column: column.to_string(),
                raw: raw.to_string(),
            });
            None
        }
    }
}
