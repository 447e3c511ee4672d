// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Snapshot preparation.
//!
//! Turns the raw record set read from the store into the validated input of
//! the availability aggregator: names and codes trimmed, duplicate codes
//! reported (and optionally collapsed), zero-student and summary rows
//! excluded, names title-cased for display.

use crate::error::DomainError;
use crate::types::InstituteRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How duplicate institute codes are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Keep the first record seen for each code and discard the rest.
    #[default]
    KeepFirst,
    /// Keep every record, even when codes repeat.
    KeepAll,
}

impl DuplicatePolicy {
    /// Maps the dashboard's "remove duplicates" toggle onto a policy.
    #[must_use]
    pub const fn from_remove_duplicates(remove_duplicates: bool) -> Self {
        if remove_duplicates {
            Self::KeepFirst
        } else {
            Self::KeepAll
        }
    }
}

/// Why a record was excluded from the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterReason {
    /// The record has no enrolled students.
    ZeroStudents,
    /// The record looks like a spreadsheet totals row.
    SummaryRow,
}

impl std::fmt::Display for FilterReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroStudents => write!(f, "Zero students"),
            Self::SummaryRow => write!(f, "Summary row"),
        }
    }
}

/// A record excluded from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredInstitute {
    /// The trimmed institute name.
    pub name: String,
    /// The trimmed institute code.
    pub code: String,
    /// The student count as stored.
    pub total_students: u32,
    /// Why the record was excluded.
    pub reason: FilterReason,
}

/// A code shared by more than one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCode {
    /// The shared code.
    pub code: String,
    /// Names of every record carrying the code, in input order.
    pub names: Vec<String>,
}

/// The validated snapshot handed to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedSnapshot {
    /// Records that survived validation, with title-cased names.
    pub records: Vec<InstituteRecord>,
    /// Records excluded by validation.
    pub filtered_out: Vec<FilteredInstitute>,
    /// Every code seen on more than one record.
    pub duplicates: Vec<DuplicateCode>,
    /// Records dropped because an earlier record had the same code.
    pub discarded_duplicates: Vec<InstituteRecord>,
}

impl PreparedSnapshot {
    /// Returns the sum of student counts across the surviving records.
    #[must_use]
    pub fn total_students(&self) -> u64 {
        self.records
            .iter()
            .map(|record| u64::from(record.total_students))
            .sum()
    }

    /// Returns whether any surviving record has a scheduled exam period.
    #[must_use]
    pub fn has_exam_dates(&self) -> bool {
        self.records
            .iter()
            .any(|record| record.scheduled_periods().next().is_some())
    }
}

/// Validates a raw record set.
///
/// # Arguments
///
/// * `records` - Records as read from the store
/// * `policy` - How duplicate codes are handled
///
/// # Errors
///
/// * `DomainError::EmptySnapshot` if `records` is empty
/// * `DomainError::NoValidInstitutes` if every record is excluded
pub fn prepare_snapshot(
    records: Vec<InstituteRecord>,
    policy: DuplicatePolicy,
) -> Result<PreparedSnapshot, DomainError> {
    if records.is_empty() {
        return Err(DomainError::EmptySnapshot);
    }

    let trimmed: Vec<InstituteRecord> = records
        .into_iter()
        .map(|mut record| {
            record.name = record.name.trim().to_string();
            record.code = record.code.trim().to_string();
            record
        })
        .collect();

    let duplicates: Vec<DuplicateCode> = find_duplicate_codes(&trimmed);

    let (kept, discarded_duplicates): (Vec<InstituteRecord>, Vec<InstituteRecord>) = match policy
    {
        DuplicatePolicy::KeepAll => (trimmed, Vec::new()),
        DuplicatePolicy::KeepFirst => collapse_duplicates(trimmed),
    };

    let mut surviving: Vec<InstituteRecord> = Vec::with_capacity(kept.len());
    let mut filtered_out: Vec<FilteredInstitute> = Vec::new();

    for record in kept {
        match filter_reason(&record) {
            Some(reason) => filtered_out.push(FilteredInstitute {
                name: record.name,
                code: record.code,
                total_students: record.total_students,
                reason,
            }),
            None => surviving.push(record),
        }
    }

    if surviving.is_empty() {
        return Err(DomainError::NoValidInstitutes {
            filtered_out: filtered_out.len(),
        });
    }

    for record in &mut surviving {
        record.name = title_case(&record.name);
    }

    Ok(PreparedSnapshot {
        records: surviving,
        filtered_out,
        duplicates,
        discarded_duplicates,
    })
}

/// Title-cases a name: the first letter of every alphabetic run is
/// uppercased and the rest lowercased.
#[must_use]
pub fn title_case(name: &str) -> String {
    let mut result: String = String::with_capacity(name.len());
    let mut previous_is_letter: bool = false;

    for c in name.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }

    result
}

fn filter_reason(record: &InstituteRecord) -> Option<FilterReason> {
    if record.total_students == 0 {
        return Some(FilterReason::ZeroStudents);
    }
    if is_summary_text(&record.name) || is_summary_text(&record.code) {
        return Some(FilterReason::SummaryRow);
    }
    None
}

fn is_summary_text(value: &str) -> bool {
    value.to_lowercase().contains("total")
}

fn find_duplicate_codes(records: &[InstituteRecord]) -> Vec<DuplicateCode> {
    let mut order: Vec<&str> = Vec::new();
    let mut names_by_code: HashMap<&str, Vec<String>> = HashMap::new();

    for record in records {
        let names: &mut Vec<String> = names_by_code
            .entry(record.code.as_str())
            .or_insert_with(|| {
                order.push(record.code.as_str());
                Vec::new()
            });
        names.push(record.name.clone());
    }

    order
        .into_iter()
        .filter_map(|code| {
            names_by_code
                .remove(code)
                .filter(|names| names.len() > 1)
                .map(|names| DuplicateCode {
                    code: code.to_string(),
                    names,
                })
        })
        .collect()
}

fn collapse_duplicates(
    records: Vec<InstituteRecord>,
) -> (Vec<InstituteRecord>, Vec<InstituteRecord>) {
    let mut seen: HashSet<String> = HashSet::new();
    records
        .into_iter()
        .partition(|record| seen.insert(record.code.clone()))
}
