// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use examcal_domain::DomainError;
use examcal_persistence::PersistenceError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain and persistence errors and represent the
/// API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the session may not perform this action.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The record store holds nothing usable for a heatmap.
    EmptySnapshot {
        /// A human-readable description for the operator.
        message: String,
    },
    /// An uploaded CSV file could not be used.
    InvalidCsvFormat {
        /// Why the file was rejected.
        reason: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::EmptySnapshot { message } => write!(f, "{message}"),
            Self::InvalidCsvFormat { reason } => write!(f, "Invalid CSV format: {reason}"),
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        translate_domain_error(err)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        translate_persistence_error(err)
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidInstituteName(msg) => ApiError::InvalidInput {
            field: String::from("institute_name"),
            message: msg,
        },
        DomainError::InvalidInstituteCode(msg) => ApiError::InvalidInput {
            field: String::from("institute_code"),
            message: msg,
        },
        DomainError::InvalidStudentCount(msg) => ApiError::InvalidInput {
            field: String::from("total_students"),
            message: msg,
        },
        DomainError::DuplicateInstituteCode(code) => ApiError::DomainRuleViolation {
            rule: String::from("unique_institute_code"),
            message: format!("Institute with code '{code}' already exists"),
        },
        DomainError::DateParseError { date_string, error } => ApiError::InvalidInput {
            field: String::from("date"),
            message: format!("Failed to parse date '{date_string}': {error}"),
        },
        DomainError::InvalidExamPeriod {
            academic_year,
            start,
            end,
        } => ApiError::DomainRuleViolation {
            rule: String::from("exam_period_order"),
            message: format!(
                "{academic_year} exam start {start} must be on or before exam end {end}"
            ),
        },
        DomainError::InvalidDateRange { start, end } => ApiError::InvalidInput {
            field: String::from("date_range"),
            message: format!("Start date must be before or equal to end date ({start} > {end})"),
        },
        DomainError::InvalidYear(year) => ApiError::InvalidInput {
            field: String::from("year"),
            message: format!("Invalid calendar year: {year}"),
        },
        DomainError::DateArithmeticOverflow { operation } => ApiError::Internal {
            message: format!("Date arithmetic overflow while {operation}"),
        },
        DomainError::EmptySnapshot => ApiError::EmptySnapshot {
            message: String::from(
                "No data found in the record store. Add institutes or import a CSV file first.",
            ),
        },
        DomainError::NoValidInstitutes { filtered_out } => ApiError::EmptySnapshot {
            message: format!(
                "No valid institutes found with student counts ({filtered_out} filtered out). \
                 Please check the institute records."
            ),
        },
    }
}

/// Translates a persistence error into an API error.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::InstituteNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Institute"),
            message: format!("Institute {id} does not exist"),
        },
        PersistenceError::NotFound(msg) => ApiError::ResourceNotFound {
            resource_type: String::from("Record"),
            message: msg,
        },
        PersistenceError::InvalidPagination { limit, offset } => ApiError::InvalidInput {
            field: String::from("pagination"),
            message: format!("limit={limit}, offset={offset}"),
        },
        other => ApiError::Internal {
            message: format!("Record store failure: {other}"),
        },
    }
}
