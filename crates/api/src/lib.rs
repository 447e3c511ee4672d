// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary of the exam availability calendar.
//!
//! This crate sits between the HTTP server and the domain and persistence
//! layers. It owns operator authentication, per-visitor session state,
//! snapshot loading, the heatmap render model, institute management and
//! CSV import. Domain and persistence errors are translated into
//! `ApiError` before they leave the crate.

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

mod auth;
mod csv_import;
mod error;
mod heatmap;
mod institutes;
mod request_response;
mod session;
mod snapshot;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedOperator, AuthorizationService, OperatorCredentials, Role};
pub use csv_import::{
    CANONICAL_COLUMNS, ColumnMapping, ColumnMappingSuggestion, CsvImportResult, CsvPreviewResult,
    CsvRowAction, CsvRowResult, CsvRowStatus, REQUIRED_COLUMNS, import_csv_institutes,
    normalize_header, preview_csv_institutes, suggest_column_mapping,
};
pub use error::{ApiError, AuthError, translate_domain_error, translate_persistence_error};
pub use heatmap::{
    AcademicYearExamsInfo, DEFAULT_DISPLAY_TIMEZONE, DiscardedInstitute, HIGH_AVAILABILITY_COLOR,
    HeatmapCell, HeatmapReport, LOW_AVAILABILITY_COLOR, Legend, MAX_HEATMAP_YEAR,
    MIN_HEATMAP_YEAR, MonthGrid, RangeDetails, WEEKDAY_LABELS, build_heatmap_report, cell_color,
    fetched_caption, format_iso_date, parse_iso_date, validate_year,
};
pub use institutes::{
    create_institute, delete_institute, get_institute, list_institutes, parse_student_count,
    update_institute, validate_institute_request,
};
pub use request_response::{
    CsvImportRequest, CsvUploadRequest, ExamDatesInfo, InstituteInfo, InstituteMutationResponse,
    InstituteRequest, ListInstitutesRequest, ListInstitutesResponse, LoginRequest, RangeSelection,
    SessionInfo, StudentCountInput, UpdateSessionRequest,
};
pub use session::{DashboardSession, SessionStore, SessionUpdate};
pub use snapshot::{DateWarning, LoadedSnapshot, SnapshotOptions, load_snapshot, to_institute_record};
