// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Institute queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use crate::data_models::{ExamDateCells, InstituteData};
use crate::diesel_schema::institutes;
use crate::error::PersistenceError;

/// Diesel Queryable struct for institute rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = institutes)]
struct InstituteRow {
    institute_id: i64,
    institute_name: String,
    institute_code: String,
    total_students: i64,
    exam_start: Option<String>,
    exams_end: Option<String>,
    exam_start_1: Option<String>,
    exam_end: Option<String>,
    exam_start_2: Option<String>,
    exam_end_1: Option<String>,
    exam_start_3: Option<String>,
    exam_end_2: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<InstituteRow> for InstituteData {
    fn from(row: InstituteRow) -> Self {
        Self {
            institute_id: row.institute_id,
            institute_name: row.institute_name,
            institute_code: row.institute_code,
            total_students: row.total_students,
            exam_dates: [
                ExamDateCells::new(row.exam_start, row.exams_end),
                ExamDateCells::new(row.exam_start_1, row.exam_end),
                ExamDateCells::new(row.exam_start_2, row.exam_end_1),
                ExamDateCells::new(row.exam_start_3, row.exam_end_2),
            ],
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Retrieves one page of institutes ordered by ID.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `limit` - Maximum number of rows to return
/// * `offset` - Number of rows to skip
///
/// # Errors
///
/// Returns an error if the arguments are negative or the query fails.
pub fn list_institutes_page(
    conn: &mut SqliteConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<InstituteData>, PersistenceError> {
    if limit < 0 || offset < 0 {
        return Err(PersistenceError::InvalidPagination { limit, offset });
    }

    debug!(limit, offset, "Listing institutes page");

    let rows: Vec<InstituteRow> = institutes::table
        .order(institutes::institute_id.asc())
        .limit(limit)
        .offset(offset)
        .select(InstituteRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(InstituteData::from).collect())
}

/// Retrieves an institute by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the institute is not found.
pub fn get_institute(
    conn: &mut SqliteConnection,
    institute_id: i64,
) -> Result<Option<InstituteData>, PersistenceError> {
    debug!(institute_id, "Looking up institute");

    let row: Option<InstituteRow> = institutes::table
        .filter(institutes::institute_id.eq(institute_id))
        .select(InstituteRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(InstituteData::from))
}

/// Retrieves every institute carrying exactly `institute_code`, oldest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_institutes_by_code(
    conn: &mut SqliteConnection,
    institute_code: &str,
) -> Result<Vec<InstituteData>, PersistenceError> {
    debug!(institute_code, "Looking up institutes by code");

    let rows: Vec<InstituteRow> = institutes::table
        .filter(institutes::institute_code.eq(institute_code))
        .order(institutes::institute_id.asc())
        .select(InstituteRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(InstituteData::from).collect())
}

/// Counts stored institutes.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_institutes(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(institutes::table.count().get_result(conn)?)
}
