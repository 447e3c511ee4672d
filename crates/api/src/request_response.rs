// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.

use examcal_domain::{AcademicYear, DateRange};
use examcal_persistence::{ExamDateCells, InstituteData};
use time::Date;
use time::format_description::well_known::Rfc3339;

use crate::error::ApiError;
use crate::heatmap::{format_iso_date, parse_iso_date};
use crate::session::{DashboardSession, SessionUpdate};

/// A date range as sent by clients, both ends `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RangeSelection {
    /// First day of the range.
    pub start: String,
    /// Last day of the range.
    pub end: String,
}

impl RangeSelection {
    /// Parses the selection into a validated range.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if either end is not a date or the
    /// start falls after the end.
    pub fn to_date_range(&self) -> Result<DateRange, ApiError> {
        let start: Date = parse_iso_date("start", &self.start)?;
        let end: Date = parse_iso_date("end", &self.end)?;
        Ok(DateRange::new(start, end)?)
    }

    /// Renders a validated range back into client form.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Internal` if a date cannot be formatted.
    pub fn from_date_range(range: &DateRange) -> Result<Self, ApiError> {
        Ok(Self {
            start: format_iso_date(range.start())?,
            end: format_iso_date(range.end())?,
        })
    }
}

/// API request to log in.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoginRequest {
    /// The operator login name.
    pub login_name: String,
    /// The operator password.
    pub password: String,
}

/// API request to change session state.
///
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UpdateSessionRequest {
    /// New year to view.
    #[serde(default)]
    pub year: Option<i32>,
    /// New range selection.
    #[serde(default)]
    pub selected_range: Option<RangeSelection>,
    /// Clears the range selection.
    #[serde(default)]
    pub clear_selected_range: bool,
    /// New duplicate toggle.
    #[serde(default)]
    pub remove_duplicates: Option<bool>,
    /// Institute to edit.
    #[serde(default)]
    pub edit_target: Option<i64>,
    /// Clears the edit target.
    #[serde(default)]
    pub clear_edit_target: bool,
}

impl UpdateSessionRequest {
    /// Converts the request into a session update.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for an unparseable range, or when a
    /// field is both set and cleared.
    pub fn into_update(self) -> Result<SessionUpdate, ApiError> {
        if self.clear_selected_range && self.selected_range.is_some() {
            return Err(ApiError::InvalidInput {
                field: String::from("selected_range"),
                message: String::from("Cannot set and clear the range in one request"),
            });
        }
        if self.clear_edit_target && self.edit_target.is_some() {
            return Err(ApiError::InvalidInput {
                field: String::from("edit_target"),
                message: String::from("Cannot set and clear the edit target in one request"),
            });
        }

        let selected_range: Option<Option<DateRange>> = if self.clear_selected_range {
            Some(None)
        } else {
            self.selected_range
                .as_ref()
                .map(RangeSelection::to_date_range)
                .transpose()?
                .map(Some)
        };

        let edit_target: Option<Option<i64>> = if self.clear_edit_target {
            Some(None)
        } else {
            self.edit_target.map(Some)
        };

        Ok(SessionUpdate {
            year: self.year,
            selected_range,
            remove_duplicates: self.remove_duplicates,
            edit_target,
        })
    }
}

/// API response describing a session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionInfo {
    /// The session token, sent back in the `Authorization` header.
    pub token: String,
    /// `"Viewer"` or `"Operator"`.
    pub role: String,
    /// The logged-in operator, if any.
    pub operator: Option<String>,
    /// The year being viewed.
    pub year: i32,
    /// The selected range, if any.
    pub selected_range: Option<RangeSelection>,
    /// The institute picked for editing, if any.
    pub edit_target: Option<i64>,
    /// Whether duplicate codes are collapsed.
    pub remove_duplicates: bool,
    /// Expiry as an RFC 3339 timestamp.
    pub expires_at: String,
}

impl SessionInfo {
    /// Builds the response for a session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Internal` if a timestamp or date cannot be formatted.
    pub fn from_session(session: &DashboardSession) -> Result<Self, ApiError> {
        Ok(Self {
            token: session.token.clone(),
            role: session.role().as_str().to_string(),
            operator: session
                .operator
                .as_ref()
                .map(|operator| operator.login_name.clone()),
            year: session.year,
            selected_range: session
                .selected_range
                .as_ref()
                .map(RangeSelection::from_date_range)
                .transpose()?,
            edit_target: session.edit_target,
            remove_duplicates: session.remove_duplicates,
            expires_at: session
                .expires_at
                .format(&Rfc3339)
                .map_err(|e| ApiError::Internal {
                    message: format!("Failed to format session expiry: {e}"),
                })?,
        })
    }
}

/// A student count as sent by clients: a JSON number or text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum StudentCountInput {
    /// A JSON number.
    Number(i64),
    /// Text, as typed into a form or read from a CSV cell.
    Text(String),
}

impl Default for StudentCountInput {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// API request to create or replace an institute.
///
/// Date cells use the stored column names and accept any supported date
/// format; blank cells mean "no date".
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InstituteRequest {
    /// The institute name.
    pub institute_name: String,
    /// The institute code.
    pub institute_code: String,
    /// Enrolled students.
    pub total_students: StudentCountInput,
    /// I year exam start.
    #[serde(default)]
    pub exam_start: Option<String>,
    /// I year exam end.
    #[serde(default)]
    pub exams_end: Option<String>,
    /// II year exam start.
    #[serde(default)]
    pub exam_start_1: Option<String>,
    /// II year exam end.
    #[serde(default)]
    pub exam_end: Option<String>,
    /// III year exam start.
    #[serde(default)]
    pub exam_start_2: Option<String>,
    /// III year exam end.
    #[serde(default)]
    pub exam_end_1: Option<String>,
    /// IV year exam start.
    #[serde(default)]
    pub exam_start_3: Option<String>,
    /// IV year exam end.
    #[serde(default)]
    pub exam_end_2: Option<String>,
}

impl InstituteRequest {
    /// Returns the raw start and end cells for an academic year.
    #[must_use]
    pub fn exam_cells(&self, academic_year: AcademicYear) -> (Option<&str>, Option<&str>) {
        let (start, end): (&Option<String>, &Option<String>) = match academic_year {
            AcademicYear::First => (&self.exam_start, &self.exams_end),
            AcademicYear::Second => (&self.exam_start_1, &self.exam_end),
            AcademicYear::Third => (&self.exam_start_2, &self.exam_end_1),
            AcademicYear::Fourth => (&self.exam_start_3, &self.exam_end_2),
        };
        (start.as_deref(), end.as_deref())
    }

    /// Sets the raw start and end cells for an academic year.
    pub fn set_exam_cells(
        &mut self,
        academic_year: AcademicYear,
        start: Option<String>,
        end: Option<String>,
    ) {
        let (start_slot, end_slot): (&mut Option<String>, &mut Option<String>) =
            match academic_year {
                AcademicYear::First => (&mut self.exam_start, &mut self.exams_end),
                AcademicYear::Second => (&mut self.exam_start_1, &mut self.exam_end),
                AcademicYear::Third => (&mut self.exam_start_2, &mut self.exam_end_1),
                AcademicYear::Fourth => (&mut self.exam_start_3, &mut self.exam_end_2),
            };
        *start_slot = start;
        *end_slot = end;
    }
}

/// API request to list institutes one page at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListInstitutesRequest {
    /// Page size, at most `PAGE_SIZE`.
    #[serde(default)]
    pub limit: Option<i64>,
    /// Rows to skip.
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Stored exam dates for one academic year.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExamDatesInfo {
    /// The academic year label, e.g. `"I year"`.
    pub academic_year: String,
    /// Stored start cell.
    pub start: Option<String>,
    /// Stored end cell.
    pub end: Option<String>,
}

/// A stored institute as returned to operators.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InstituteInfo {
    /// The institute identifier.
    pub institute_id: i64,
    /// The institute name.
    pub institute_name: String,
    /// The institute code.
    pub institute_code: String,
    /// Enrolled students.
    pub total_students: i64,
    /// Exam dates in academic year order.
    pub exam_dates: Vec<ExamDatesInfo>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl From<InstituteData> for InstituteInfo {
    fn from(data: InstituteData) -> Self {
        let exam_dates: Vec<ExamDatesInfo> = AcademicYear::ALL
            .into_iter()
            .map(|academic_year| {
                let cells: &ExamDateCells = data.exam_cells(academic_year);
                ExamDatesInfo {
                    academic_year: academic_year.label().to_string(),
                    start: cells.start.clone(),
                    end: cells.end.clone(),
                }
            })
            .collect();

        Self {
            institute_id: data.institute_id,
            institute_name: data.institute_name,
            institute_code: data.institute_code,
            total_students: data.total_students,
            exam_dates,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }
}

/// API response for one page of institutes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListInstitutesResponse {
    /// The institutes on this page, ordered by ID.
    pub institutes: Vec<InstituteInfo>,
    /// The page size used.
    pub limit: i64,
    /// The offset used.
    pub offset: i64,
    /// Whether another page may follow.
    pub has_more: bool,
}

/// API response for a successful create, update or delete.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InstituteMutationResponse {
    /// The affected institute.
    pub institute_id: i64,
    /// A success message.
    pub message: String,
}

/// API request carrying an uploaded CSV file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CsvUploadRequest {
    /// The raw CSV text.
    pub csv_content: String,
}

/// API request carrying a CSV file and the confirmed column mapping.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CsvImportRequest {
    /// The raw CSV text.
    pub csv_content: String,
    /// Canonical column to upload header.
    pub mapping: crate::csv_import::ColumnMapping,
}
