// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use examcal_domain::{DateRange, DuplicatePolicy};
use time::Duration;
use time::macros::date;

use crate::tests::helpers::{
    TEST_LOGIN, TEST_PASSWORD, create_session_store, create_test_credentials, test_now,
};
use crate::{
    ApiError, AuthError, DashboardSession, RangeSelection, Role, SessionInfo, SessionStore,
    SessionUpdate, UpdateSessionRequest,
};

#[test]
fn test_viewer_session_defaults() {
    let mut sessions: SessionStore = create_session_store();

    let session: DashboardSession = sessions.create_viewer_session(test_now());

    assert_eq!(session.role(), Role::Viewer);
    assert_eq!(session.year, 2025);
    assert!(session.selected_range.is_none());
    assert!(session.remove_duplicates);
    assert_eq!(session.duplicate_policy(), DuplicatePolicy::KeepFirst);
    assert_eq!(sessions.len(), 1);
}

#[test]
fn test_get_unknown_token_fails() {
    let mut sessions: SessionStore = create_session_store();

    let result = sessions.get("session_missing", test_now());

    assert!(matches!(result, Err(AuthError::AuthenticationFailed { .. })));
}

#[test]
fn test_session_expires_and_is_removed() {
    let mut sessions: SessionStore = create_session_store();
    let session: DashboardSession = sessions.create_viewer_session(test_now());

    let later = test_now() + Duration::minutes(31);
    let result = sessions.get(&session.token, later);

    assert!(matches!(result, Err(AuthError::AuthenticationFailed { .. })));
    assert!(sessions.is_empty());
}

#[test]
fn test_get_extends_lifetime() {
    let mut sessions: SessionStore = create_session_store();
    let session: DashboardSession = sessions.create_viewer_session(test_now());

    let touched = test_now() + Duration::minutes(20);
    let refreshed: DashboardSession = sessions.get(&session.token, touched).expect("live session");
    assert_eq!(refreshed.expires_at, touched + Duration::minutes(30));
    assert!(refreshed.expires_at > session.expires_at);

    let still_live = test_now() + Duration::minutes(45);
    assert!(sessions.get(&session.token, still_live).is_ok());
}

#[test]
fn test_update_year_range_and_duplicates() {
    let mut sessions: SessionStore = create_session_store();
    let session: DashboardSession = sessions.create_viewer_session(test_now());
    let range: DateRange =
        DateRange::new(date!(2026 - 03 - 01), date!(2026 - 03 - 31)).expect("valid range");

    let updated: DashboardSession = sessions
        .update(
            &session.token,
            SessionUpdate {
                year: Some(2026),
                selected_range: Some(Some(range)),
                remove_duplicates: Some(false),
                edit_target: None,
            },
            test_now(),
        )
        .expect("update succeeds");

    assert_eq!(updated.year, 2026);
    assert_eq!(updated.selected_range, Some(range));
    assert_eq!(updated.duplicate_policy(), DuplicatePolicy::KeepAll);

    let cleared: DashboardSession = sessions
        .update(
            &session.token,
            SessionUpdate {
                selected_range: Some(None),
                ..SessionUpdate::default()
            },
            test_now(),
        )
        .expect("clear succeeds");
    assert!(cleared.selected_range.is_none());
    assert_eq!(cleared.year, 2026);
}

#[test]
fn test_update_rejects_year_out_of_bounds() {
    let mut sessions: SessionStore = create_session_store();
    let session: DashboardSession = sessions.create_viewer_session(test_now());

    for year in [1999, 2101] {
        let result = sessions.update(
            &session.token,
            SessionUpdate {
                year: Some(year),
                ..SessionUpdate::default()
            },
            test_now(),
        );
        assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
    }
}

#[test]
fn test_viewer_cannot_set_edit_target() {
    let mut sessions: SessionStore = create_session_store();
    let session: DashboardSession = sessions.create_viewer_session(test_now());

    let result = sessions.update(
        &session.token,
        SessionUpdate {
            edit_target: Some(Some(7)),
            ..SessionUpdate::default()
        },
        test_now(),
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_login_issues_new_token_and_keeps_preferences() {
    let mut sessions: SessionStore = create_session_store();
    let viewer: DashboardSession = sessions.create_viewer_session(test_now());
    sessions
        .update(
            &viewer.token,
            SessionUpdate {
                year: Some(2024),
                ..SessionUpdate::default()
            },
            test_now(),
        )
        .expect("update succeeds");

    let operator: DashboardSession = sessions
        .login(
            Some(&viewer.token),
            &create_test_credentials(),
            TEST_LOGIN,
            TEST_PASSWORD,
            test_now(),
        )
        .expect("login succeeds");

    assert_ne!(operator.token, viewer.token);
    assert_eq!(operator.role(), Role::Operator);
    assert_eq!(operator.year, 2024);
    assert!(sessions.get(&viewer.token, test_now()).is_err());
    assert_eq!(sessions.len(), 1);
}

#[test]
fn test_failed_login_keeps_viewer_session() {
    let mut sessions: SessionStore = create_session_store();
    let viewer: DashboardSession = sessions.create_viewer_session(test_now());

    let result = sessions.login(
        Some(&viewer.token),
        &create_test_credentials(),
        TEST_LOGIN,
        "nope",
        test_now(),
    );

    assert!(result.is_err());
    assert!(sessions.get(&viewer.token, test_now()).is_ok());
}

#[test]
fn test_logout_demotes_to_viewer() {
    let mut sessions: SessionStore = create_session_store();
    let operator: DashboardSession = sessions
        .login(
            None,
            &create_test_credentials(),
            TEST_LOGIN,
            TEST_PASSWORD,
            test_now(),
        )
        .expect("login succeeds");
    sessions
        .update(
            &operator.token,
            SessionUpdate {
                edit_target: Some(Some(3)),
                ..SessionUpdate::default()
            },
            test_now(),
        )
        .expect("operator may set edit target");

    let viewer: DashboardSession = sessions
        .logout(&operator.token, test_now())
        .expect("logout succeeds");

    assert_eq!(viewer.role(), Role::Viewer);
    assert!(viewer.edit_target.is_none());
    assert_eq!(viewer.token, operator.token);
}

#[test]
fn test_purge_expired_sessions() {
    let mut sessions: SessionStore = create_session_store();
    sessions.create_viewer_session(test_now());
    sessions.create_viewer_session(test_now() + Duration::minutes(20));

    let removed: usize = sessions.purge_expired(test_now() + Duration::minutes(40));

    assert_eq!(removed, 1);
    assert_eq!(sessions.len(), 1);
}

#[test]
fn test_update_request_conversion() {
    let request: UpdateSessionRequest = UpdateSessionRequest {
        year: Some(2025),
        selected_range: Some(RangeSelection {
            start: String::from("2025-06-01"),
            end: String::from("2025-06-30"),
        }),
        ..UpdateSessionRequest::default()
    };

    let update: SessionUpdate = request.into_update().expect("valid request");

    assert_eq!(update.year, Some(2025));
    assert!(matches!(update.selected_range, Some(Some(_))));
    assert!(update.edit_target.is_none());
}

#[test]
fn test_update_request_rejects_reversed_range() {
    let request: UpdateSessionRequest = UpdateSessionRequest {
        selected_range: Some(RangeSelection {
            start: String::from("2025-06-30"),
            end: String::from("2025-06-01"),
        }),
        ..UpdateSessionRequest::default()
    };

    assert!(matches!(
        request.into_update(),
        Err(ApiError::InvalidInput { .. })
    ));
}

#[test]
fn test_update_request_rejects_set_and_clear() {
    let request: UpdateSessionRequest = UpdateSessionRequest {
        edit_target: Some(1),
        clear_edit_target: true,
        ..UpdateSessionRequest::default()
    };

    assert!(request.into_update().is_err());
}

#[test]
fn test_session_info_renders_range() {
    let mut sessions: SessionStore = create_session_store();
    let session: DashboardSession = sessions.create_viewer_session(test_now());
    let range: DateRange =
        DateRange::new(date!(2025 - 01 - 05), date!(2025 - 01 - 09)).expect("valid range");
    let session: DashboardSession = sessions
        .update(
            &session.token,
            SessionUpdate {
                selected_range: Some(Some(range)),
                ..SessionUpdate::default()
            },
            test_now(),
        )
        .expect("update succeeds");

    let info: SessionInfo = SessionInfo::from_session(&session).expect("renderable");

    assert_eq!(info.role, "Viewer");
    assert_eq!(
        info.selected_range,
        Some(RangeSelection {
            start: String::from("2025-01-05"),
            end: String::from("2025-01-09"),
        })
    );
    assert!(info.expires_at.starts_with("2025-06-15T12:30:00"));
}
