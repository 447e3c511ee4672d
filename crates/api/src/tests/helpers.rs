// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use examcal_domain::AcademicYear;
use examcal_persistence::{ExamDateCells, InstituteFields, InstituteStore, Persistence};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use crate::{DashboardSession, InstituteRequest, OperatorCredentials, SessionStore, StudentCountInput};

/// Lowest bcrypt cost, to keep hashing fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

pub const TEST_LOGIN: &str = "admin";
pub const TEST_PASSWORD: &str = "correct horse battery staple";

pub fn test_now() -> OffsetDateTime {
    datetime!(2025-06-15 12:00 UTC)
}

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("Failed to create in-memory persistence")
}

pub fn create_test_credentials() -> OperatorCredentials {
    OperatorCredentials::with_cost(TEST_LOGIN, TEST_PASSWORD, TEST_BCRYPT_COST)
        .expect("Failed to hash test credentials")
}

pub fn create_session_store() -> SessionStore {
    SessionStore::new(Duration::minutes(30))
}

pub fn create_viewer_session() -> DashboardSession {
    create_session_store().create_viewer_session(test_now())
}

pub fn create_operator_session() -> DashboardSession {
    let mut sessions: SessionStore = create_session_store();
    sessions
        .login(
            None,
            &create_test_credentials(),
            TEST_LOGIN,
            TEST_PASSWORD,
            test_now(),
        )
        .expect("Failed to log in test operator")
}

pub fn create_test_request(name: &str, code: &str, students: i64) -> InstituteRequest {
    InstituteRequest {
        institute_name: name.to_string(),
        institute_code: code.to_string(),
        total_students: StudentCountInput::Number(students),
        ..InstituteRequest::default()
    }
}

/// Stores an institute directly, bypassing validation.
pub fn store_institute(
    persistence: &mut Persistence,
    name: &str,
    code: &str,
    students: i64,
    first_year: Option<(&str, &str)>,
) -> i64 {
    let mut fields: InstituteFields = InstituteFields::new(name, code, students);
    if let Some((start, end)) = first_year {
        fields = fields.with_exam_dates(
            AcademicYear::First,
            ExamDateCells::new(Some(start.to_string()), Some(end.to_string())),
        );
    }
    persistence
        .create_institute(&fields)
        .expect("Failed to store institute")
}
