// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    TEST_BCRYPT_COST, TEST_LOGIN, TEST_PASSWORD, create_operator_session, create_test_credentials,
    create_viewer_session,
};
use crate::{ApiError, AuthError, AuthorizationService, OperatorCredentials, Role};

#[test]
fn test_verify_accepts_configured_credentials() {
    let credentials: OperatorCredentials = create_test_credentials();

    let operator = credentials
        .verify(TEST_LOGIN, TEST_PASSWORD)
        .expect("valid credentials");

    assert_eq!(operator.login_name, TEST_LOGIN);
}

#[test]
fn test_verify_rejects_wrong_password() {
    let credentials: OperatorCredentials = create_test_credentials();

    let result = credentials.verify(TEST_LOGIN, "wrong");

    assert!(matches!(result, Err(AuthError::AuthenticationFailed { .. })));
}

#[test]
fn test_verify_rejects_unknown_login() {
    let credentials: OperatorCredentials = create_test_credentials();

    let result = credentials.verify("somebody", TEST_PASSWORD);

    assert!(matches!(result, Err(AuthError::AuthenticationFailed { .. })));
}

#[test]
fn test_credentials_require_login_and_password() {
    assert!(OperatorCredentials::with_cost("", "secret", TEST_BCRYPT_COST).is_err());
    assert!(OperatorCredentials::with_cost("admin", "", TEST_BCRYPT_COST).is_err());
}

#[test]
fn test_credentials_debug_hides_hash() {
    let credentials: OperatorCredentials = create_test_credentials();
    let rendered: String = format!("{credentials:?}");

    assert!(rendered.contains(TEST_LOGIN));
    assert!(!rendered.contains("$2"));
}

#[test]
fn test_viewer_cannot_manage_institutes() {
    let session = create_viewer_session();

    let result = AuthorizationService::authorize_manage_institutes(&session);

    assert!(matches!(result, Err(AuthError::Unauthorized { .. })));
    assert_eq!(session.role(), Role::Viewer);
}

#[test]
fn test_operator_can_manage_institutes() {
    let session = create_operator_session();

    let operator = AuthorizationService::authorize_manage_institutes(&session)
        .expect("operator is authorized");

    assert_eq!(operator.login_name, TEST_LOGIN);
    assert_eq!(session.role(), Role::Operator);
}

#[test]
fn test_auth_error_converts_to_api_error() {
    let err: ApiError = AuthError::Unauthorized {
        action: String::from("manage_institutes"),
        required_role: String::from("Operator"),
    }
    .into();

    assert!(matches!(err, ApiError::Unauthorized { .. }));
}
