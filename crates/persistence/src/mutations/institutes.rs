// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Institute mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::{debug, info};

use crate::data_models::InstituteFields;
use crate::diesel_schema::institutes;
use crate::error::PersistenceError;

/// Inserts a new institute.
///
/// # Returns
///
/// The store-assigned institute ID.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_institute(
    conn: &mut SqliteConnection,
    fields: &InstituteFields,
) -> Result<i64, PersistenceError> {
    info!(
        institute_code = %fields.institute_code,
        institute_name = %fields.institute_name,
        "Creating institute"
    );

    let [first, second, third, fourth] = &fields.exam_dates;

    let institute_id: i64 = diesel::insert_into(institutes::table)
        .values((
            institutes::institute_name.eq(&fields.institute_name),
            institutes::institute_code.eq(&fields.institute_code),
            institutes::total_students.eq(fields.total_students),
            institutes::exam_start.eq(first.start.as_deref()),
            institutes::exams_end.eq(first.end.as_deref()),
            institutes::exam_start_1.eq(second.start.as_deref()),
            institutes::exam_end.eq(second.end.as_deref()),
            institutes::exam_start_2.eq(third.start.as_deref()),
            institutes::exam_end_1.eq(third.end.as_deref()),
            institutes::exam_start_3.eq(fourth.start.as_deref()),
            institutes::exam_end_2.eq(fourth.end.as_deref()),
        ))
        .returning(institutes::institute_id)
        .get_result(conn)?;

    info!(institute_id, "Institute created");
    Ok(institute_id)
}

/// Replaces every writable field of an institute.
///
/// # Errors
///
/// Returns `PersistenceError::InstituteNotFound` if no row has the ID, or
/// an error if the update fails.
pub fn update_institute(
    conn: &mut SqliteConnection,
    institute_id: i64,
    fields: &InstituteFields,
) -> Result<(), PersistenceError> {
    debug!(institute_id, "Updating institute");

    let [first, second, third, fourth] = &fields.exam_dates;

    let updated: usize = diesel::update(institutes::table)
        .filter(institutes::institute_id.eq(institute_id))
        .set((
            institutes::institute_name.eq(&fields.institute_name),
            institutes::institute_code.eq(&fields.institute_code),
            institutes::total_students.eq(fields.total_students),
            institutes::exam_start.eq(first.start.as_deref()),
            institutes::exams_end.eq(first.end.as_deref()),
            institutes::exam_start_1.eq(second.start.as_deref()),
            institutes::exam_end.eq(second.end.as_deref()),
            institutes::exam_start_2.eq(third.start.as_deref()),
            institutes::exam_end_1.eq(third.end.as_deref()),
            institutes::exam_start_3.eq(fourth.start.as_deref()),
            institutes::exam_end_2.eq(fourth.end.as_deref()),
            institutes::updated_at.eq(diesel::dsl::sql::<diesel::sql_types::Text>(
                "CURRENT_TIMESTAMP",
            )),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::InstituteNotFound(institute_id));
    }

    info!(institute_id, "Institute updated");
    Ok(())
}

/// Deletes an institute.
///
/// # Errors
///
/// Returns `PersistenceError::InstituteNotFound` if no row has the ID, or
/// an error if the delete fails.
pub fn delete_institute(
    conn: &mut SqliteConnection,
    institute_id: i64,
) -> Result<(), PersistenceError> {
    let deleted: usize =
        diesel::delete(institutes::table.filter(institutes::institute_id.eq(institute_id)))
            .execute(conn)?;

    if deleted == 0 {
        return Err(PersistenceError::InstituteNotFound(institute_id));
    }

    info!(institute_id, "Institute deleted");
    Ok(())
}
