// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Institute record store for the exam availability calendar.
//!
//! Records live in a single `institutes` table in `SQLite`, accessed
//! through Diesel. The schema is created by embedded migrations when a
//! connection is opened.
//!
//! ## Access Pattern
//!
//! Every heatmap render re-reads the full record set. Reads are paged
//! (`PAGE_SIZE` rows at a time) until a short page comes back, so callers
//! never need to know how many records exist up front.
//!
//! ## Testing
//!
//! `Persistence::new_in_memory()` gives each caller its own shared-cache
//! in-memory database, so tests never observe each other's rows.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use data_models::{ExamDateCells, InstituteData, InstituteFields};
pub use error::PersistenceError;

/// Number of rows fetched per page when reading the full record set.
pub const PAGE_SIZE: i64 = 100;

/// Atomic counter for generating unique in-memory database names.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Access to stored institute records.
///
/// `Persistence` is the production implementation. The trait exists so the
/// API layer can be exercised against any store that honours these
/// operations.
pub trait InstituteStore {
    /// Retrieves one page of institutes ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn list_institutes_page(
        &mut self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InstituteData>, PersistenceError>;

    /// Retrieves an institute by ID, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn get_institute(&mut self, institute_id: i64)
    -> Result<Option<InstituteData>, PersistenceError>;

    /// Retrieves every institute carrying exactly `institute_code`.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn find_institutes_by_code(
        &mut self,
        institute_code: &str,
    ) -> Result<Vec<InstituteData>, PersistenceError>;

    /// Creates an institute and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn create_institute(&mut self, fields: &InstituteFields) -> Result<i64, PersistenceError>;

    /// Replaces the fields of an existing institute.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::InstituteNotFound` for an unknown ID.
    fn update_institute(
        &mut self,
        institute_id: i64,
        fields: &InstituteFields,
    ) -> Result<(), PersistenceError>;

    /// Deletes an institute.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::InstituteNotFound` for an unknown ID.
    fn delete_institute(&mut self, institute_id: i64) -> Result<(), PersistenceError>;

    /// Reads every stored institute, `PAGE_SIZE` rows at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if any page read fails.
    fn fetch_all_institutes(&mut self) -> Result<Vec<InstituteData>, PersistenceError> {
        let mut all: Vec<InstituteData> = Vec::new();
        let mut offset: i64 = 0;

        loop {
            let page: Vec<InstituteData> = self.list_institutes_page(PAGE_SIZE, offset)?;
            let page_len: usize = page.len();
            all.extend(page);

            if !matches!(i64::try_from(page_len), Ok(len) if len >= PAGE_SIZE) {
                break;
            }
            offset += PAGE_SIZE;
        }

        debug!(count = all.len(), "Fetched all institutes");
        Ok(all)
    }
}

/// `SQLite`-backed institute store.
pub struct Persistence {
    conn: SqliteConnection,
}

impl Persistence {
    /// Creates a store backed by a fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String =
            format!("file:examcal_memdb_{db_id}?mode=memory&cache=shared");

        let conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;

        Ok(Self { conn })
    }

    /// Creates a store backed by a database file, creating it if needed.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;

        Ok(Self { conn })
    }

    /// Counts stored institutes.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub fn count_institutes(&mut self) -> Result<i64, PersistenceError> {
        queries::institutes::count_institutes(&mut self.conn)
    }
}

impl InstituteStore for Persistence {
    fn list_institutes_page(
        &mut self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InstituteData>, PersistenceError> {
        queries::institutes::list_institutes_page(&mut self.conn, limit, offset)
    }

    fn get_institute(
        &mut self,
        institute_id: i64,
    ) -> Result<Option<InstituteData>, PersistenceError> {
        queries::institutes::get_institute(&mut self.conn, institute_id)
    }

    fn find_institutes_by_code(
        &mut self,
        institute_code: &str,
    ) -> Result<Vec<InstituteData>, PersistenceError> {
        queries::institutes::find_institutes_by_code(&mut self.conn, institute_code)
    }

    fn create_institute(&mut self, fields: &InstituteFields) -> Result<i64, PersistenceError> {
        mutations::institutes::create_institute(&mut self.conn, fields)
    }

    fn update_institute(
        &mut self,
        institute_id: i64,
        fields: &InstituteFields,
    ) -> Result<(), PersistenceError> {
        mutations::institutes::update_institute(&mut self.conn, institute_id, fields)
    }

    fn delete_institute(&mut self, institute_id: i64) -> Result<(), PersistenceError> {
        mutations::institutes::delete_institute(&mut self.conn, institute_id)
    }
}
