// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Heatmap render model.
//!
//! `build_heatmap_report` turns a loaded snapshot into everything a
//! front-end needs to draw the availability calendar: twelve month grids
//! of coloured day cells, a legend, advisories, the "last fetched"
//! caption and, when a range is selected, the range statistics.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use examcal_domain::{
    DailyAvailability, DateRange, DuplicateCode, FilteredInstitute, InstituteRecord,
    RangeExamReport, RangeSummary, YearAvailability, compute_daily_availability, exams_in_range,
    summarize_range,
};
use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Month};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::snapshot::{DateWarning, LoadedSnapshot};

/// Earliest year the dashboard renders.
pub const MIN_HEATMAP_YEAR: i32 = 2000;
/// Latest year the dashboard renders.
pub const MAX_HEATMAP_YEAR: i32 = 2100;
/// Time zone of the "last fetched" caption unless configured otherwise.
pub const DEFAULT_DISPLAY_TIMEZONE: &str = "Asia/Kolkata";

/// Column headers of a month grid, Sunday first.
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Colour of a day on which every institute is available.
pub const HIGH_AVAILABILITY_COLOR: &str = "rgb(255, 255, 220)";
/// Colour of a day on which no institute is available.
pub const LOW_AVAILABILITY_COLOR: &str = "rgb(255, 0, 0)";

const MAX_WEEKS_PER_MONTH: usize = 6;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const LONG_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:long] [day], [year]");

const NO_EXAM_DATES_ADVISORY: &str = "No valid exam dates found in the database. The heatmap \
     will show full availability. Please verify that your exam dates are in a supported format \
     (e.g., DD-MM-YYYY).";

/// One day of a month grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    /// Day of the month.
    pub day: u8,
    /// The date as `YYYY-MM-DD`.
    pub date: String,
    /// Institutes with no exam on this day.
    pub institutes_available: u32,
    /// Students whose institute has no exam on this day.
    pub students_available: u64,
    /// Institute availability percentage.
    pub institute_percentage: f64,
    /// Student availability percentage.
    pub student_percentage: f64,
    /// Share of institutes that are busy, in `[0, 1]`.
    pub intensity: f64,
    /// CSS background colour.
    pub color: String,
}

/// A month laid out as Sunday-first weeks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthGrid {
    /// Month number, 1 to 12.
    pub month: u8,
    /// Upper-case month name.
    pub name: String,
    /// Up to six weeks of seven slots; `None` pads days outside the month.
    pub weeks: Vec<Vec<Option<HeatmapCell>>>,
}

/// Colour legend for the heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legend {
    /// Colour at the high-availability end of the gradient.
    pub high_availability_color: String,
    /// Label at the high-availability end.
    pub high_availability_label: String,
    /// Colour at the low-availability end of the gradient.
    pub low_availability_color: String,
    /// Label at the low-availability end.
    pub low_availability_label: String,
}

/// Institutes with exams in the selected range for one academic year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicYearExamsInfo {
    /// The academic year label, e.g. `"II year"`.
    pub academic_year: String,
    /// Sorted institute names.
    pub institutes: Vec<String>,
}

/// Statistics for the selected date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeDetails {
    /// First day as `YYYY-MM-DD`.
    pub start: String,
    /// Last day as `YYYY-MM-DD`.
    pub end: String,
    /// First day as e.g. `June 01, 2025`.
    pub start_label: String,
    /// Last day as e.g. `June 30, 2025`.
    pub end_label: String,
    /// Averages over the days of the range inside the viewed year.
    pub summary: Option<RangeSummary>,
    /// Sorted names of every institute with an exam in the range.
    pub institutes_with_exams: Vec<String>,
    /// The same names per academic year.
    pub by_academic_year: Vec<AcademicYearExamsInfo>,
    /// Shown when no institute has an exam in the range.
    pub no_exams_message: Option<String>,
}

/// A record dropped because an earlier record carried the same code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardedInstitute {
    /// Store ID of the dropped record.
    pub institute_id: String,
    /// The trimmed institute name.
    pub name: String,
    /// The shared code.
    pub code: String,
}

impl From<&InstituteRecord> for DiscardedInstitute {
    fn from(record: &InstituteRecord) -> Self {
        Self {
            institute_id: record.id.value().to_string(),
            name: record.name.clone(),
            code: record.code.clone(),
        }
    }
}

/// Everything needed to render the availability calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapReport {
    /// The year shown.
    pub year: i32,
    /// Institutes in the snapshot.
    pub total_institutes: u32,
    /// Students across all institutes.
    pub total_students: u64,
    /// Weekday column headers.
    pub weekday_labels: Vec<String>,
    /// January to December.
    pub months: Vec<MonthGrid>,
    /// The colour legend.
    pub legend: Legend,
    /// Shown when no institute has any exam dates.
    pub no_exam_dates_advisory: Option<String>,
    /// When the data was read, in the display time zone.
    pub fetched_caption: String,
    /// Present when a range is selected.
    pub range: Option<RangeDetails>,
    /// Records excluded from the snapshot.
    pub filtered_out: Vec<FilteredInstitute>,
    /// Codes shared by several records.
    pub duplicates: Vec<DuplicateCode>,
    /// Records dropped by duplicate removal, empty when duplicates are kept.
    pub discarded_duplicates: Vec<DiscardedInstitute>,
    /// Stored date cells that could not be parsed.
    pub date_warnings: Vec<DateWarning>,
}

/// Builds the heatmap for one year.
///
/// # Arguments
///
/// * `snapshot` - The loaded snapshot
/// * `year` - The year to render, within `[MIN_HEATMAP_YEAR, MAX_HEATMAP_YEAR]`
/// * `selected_range` - Optional range for detailed statistics
/// * `display_tz` - Time zone of the "last fetched" caption
/// * `fetched_at` - When the snapshot was read
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` for a year outside the supported range.
pub fn build_heatmap_report(
    snapshot: &LoadedSnapshot,
    year: i32,
    selected_range: Option<&DateRange>,
    display_tz: Tz,
    fetched_at: DateTime<Utc>,
) -> Result<HeatmapReport, ApiError> {
    validate_year(year)?;

    let availability: YearAvailability =
        compute_daily_availability(&snapshot.prepared.records, year)?;

    let months: Vec<MonthGrid> = month_grids(&availability);

    let no_exam_dates_advisory: Option<String> = if snapshot.prepared.has_exam_dates() {
        None
    } else {
        debug!(year, "No institute has exam dates");
        Some(String::from(NO_EXAM_DATES_ADVISORY))
    };

    let range: Option<RangeDetails> = selected_range
        .map(|range| range_details(snapshot, &availability, range))
        .transpose()?;

    info!(
        year,
        institutes = availability.total_institutes(),
        range_selected = range.is_some(),
        "Built heatmap report"
    );

    Ok(HeatmapReport {
        year,
        total_institutes: availability.total_institutes(),
        total_students: availability.total_students(),
        weekday_labels: WEEKDAY_LABELS.iter().map(|label| (*label).to_string()).collect(),
        months,
        legend: legend(availability.total_institutes()),
        no_exam_dates_advisory,
        fetched_caption: fetched_caption(fetched_at, display_tz),
        range,
        filtered_out: snapshot.prepared.filtered_out.clone(),
        duplicates: snapshot.prepared.duplicates.clone(),
        discarded_duplicates: snapshot
            .prepared
            .discarded_duplicates
            .iter()
            .map(DiscardedInstitute::from)
            .collect(),
        date_warnings: snapshot.date_warnings.clone(),
    })
}

/// Checks that a year can be rendered.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` outside `[MIN_HEATMAP_YEAR, MAX_HEATMAP_YEAR]`.
pub fn validate_year(year: i32) -> Result<(), ApiError> {
    if (MIN_HEATMAP_YEAR..=MAX_HEATMAP_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(ApiError::InvalidInput {
            field: String::from("year"),
            message: format!(
                "Year must be between {MIN_HEATMAP_YEAR} and {MAX_HEATMAP_YEAR}, got {year}"
            ),
        })
    }
}

/// Returns the CSS colour of a day with the given intensity.
///
/// Channels saturate at zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn cell_color(intensity: f64) -> String {
    let red: u32 = ((255.0 * intensity.clamp(0.0, 1.0)) as u32).min(255);
    format!(
        "rgb(255, {}, {})",
        255_u32.saturating_sub(red),
        220_u32.saturating_sub(red)
    )
}

/// Renders the "last fetched" caption in `display_tz`.
#[must_use]
pub fn fetched_caption(fetched_at: DateTime<Utc>, display_tz: Tz) -> String {
    format!(
        "Data last fetched on: {}",
        fetched_at
            .with_timezone(&display_tz)
            .format("%B %d, %Y %I:%M %p %Z")
    )
}

/// Formats a date as `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns `ApiError::Internal` if formatting fails.
pub fn format_iso_date(date: Date) -> Result<String, ApiError> {
    date.format(ISO_DATE).map_err(|e| ApiError::Internal {
        message: format!("Failed to format date: {e}"),
    })
}

/// Parses a `YYYY-MM-DD` date supplied by a client.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` naming `field` if the text is not a date.
pub fn parse_iso_date(field: &str, value: &str) -> Result<Date, ApiError> {
    Date::parse(value.trim(), ISO_DATE).map_err(|e| ApiError::InvalidInput {
        field: field.to_string(),
        message: format!("Expected a date as YYYY-MM-DD, got '{value}': {e}"),
    })
}

fn format_long_date(date: Date) -> Result<String, ApiError> {
    date.format(LONG_DATE).map_err(|e| ApiError::Internal {
        message: format!("Failed to format date: {e}"),
    })
}

fn legend(total_institutes: u32) -> Legend {
    Legend {
        high_availability_color: String::from(HIGH_AVAILABILITY_COLOR),
        high_availability_label: format!("{total_institutes} institutes (High Availability)"),
        low_availability_color: String::from(LOW_AVAILABILITY_COLOR),
        low_availability_label: String::from("0 institutes (Low Availability)"),
    }
}

fn month_grids(availability: &YearAvailability) -> Vec<MonthGrid> {
    let mut months: Vec<MonthGrid> = Vec::with_capacity(12);
    let mut month: Month = Month::January;
    for _ in 0..12 {
        months.push(month_grid(month, availability.month(month)));
        month = month.next();
    }
    months
}

fn month_grid(month: Month, days: &[DailyAvailability]) -> MonthGrid {
    let name: String = month.to_string().to_uppercase();
    let Some(first) = days.first() else {
        return MonthGrid {
            month: u8::from(month),
            name,
            weeks: Vec::new(),
        };
    };

    let first_weekday: usize = usize::from(first.date.weekday().number_days_from_sunday());
    let days_in_month: usize = days.len();

    let mut weeks: Vec<Vec<Option<HeatmapCell>>> = Vec::with_capacity(MAX_WEEKS_PER_MONTH);
    for week in 0..MAX_WEEKS_PER_MONTH {
        let row: Vec<Option<HeatmapCell>> = (0..7)
            .map(|weekday| {
                (week * 7 + weekday)
                    .checked_sub(first_weekday)
                    .and_then(|index| days.get(index))
                    .map(heatmap_cell)
            })
            .collect();
        weeks.push(row);

        if (week + 1) * 7 >= days_in_month + first_weekday {
            break;
        }
    }

    MonthGrid {
        month: u8::from(month),
        name,
        weeks,
    }
}

fn heatmap_cell(day: &DailyAvailability) -> HeatmapCell {
    HeatmapCell {
        day: day.date.day(),
        date: format!(
            "{:04}-{:02}-{:02}",
            day.date.year(),
            u8::from(day.date.month()),
            day.date.day()
        ),
        institutes_available: day.institutes_available,
        students_available: day.students_available,
        institute_percentage: day.institute_percentage,
        student_percentage: day.student_percentage,
        intensity: day.intensity,
        color: cell_color(day.intensity),
    }
}

fn range_details(
    snapshot: &LoadedSnapshot,
    availability: &YearAvailability,
    range: &DateRange,
) -> Result<RangeDetails, ApiError> {
    let report: RangeExamReport = exams_in_range(&snapshot.prepared.records, range);
    let summary: Option<RangeSummary> = summarize_range(availability, range);

    let start_label: String = format_long_date(range.start())?;
    let end_label: String = format_long_date(range.end())?;

    let no_exams_message: Option<String> = report.is_empty().then(|| {
        format!(
            "No colleges have exams between {start_label} and {end_label}. Please verify that \
             your database includes exam dates covering this range in a supported format \
             (e.g., DD-MM-YYYY, DD/MM/YYYY, YYYY-MM-DD, DD Mon YYYY)."
        )
    });

    debug!(
        institutes_with_exams = report.institutes.len(),
        days_in_year = summary.as_ref().map_or(0, |summary| summary.days),
        "Computed range details"
    );

    Ok(RangeDetails {
        start: format_iso_date(range.start())?,
        end: format_iso_date(range.end())?,
        start_label,
        end_label,
        summary,
        institutes_with_exams: report.institutes,
        by_academic_year: report
            .by_academic_year
            .into_iter()
            .map(|entry| AcademicYearExamsInfo {
                academic_year: entry.academic_year.label().to_string(),
                institutes: entry.institutes,
            })
            .collect(),
        no_exams_message,
    })
}
