// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use tracing::{debug, info};

use crate::error::AuthError;
use crate::session::DashboardSession;

/// Roles a dashboard session can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Anonymous viewer: may browse the heatmap and pick a year or range.
    Viewer,
    /// Authenticated operator: may additionally edit and import institutes.
    Operator,
}

impl Role {
    /// Returns the role name used in authorization errors.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "Viewer",
            Self::Operator => "Operator",
        }
    }
}

/// An operator who has logged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedOperator {
    /// The login name the operator used.
    pub login_name: String,
}

impl AuthenticatedOperator {
    /// Creates a new authenticated operator.
    #[must_use]
    pub const fn new(login_name: String) -> Self {
        Self { login_name }
    }
}

/// The single set of operator credentials the dashboard accepts.
///
/// The password is hashed with bcrypt when the credentials are built and
/// the plaintext is not retained.
#[derive(Clone)]
pub struct OperatorCredentials {
    login_name: String,
    password_hash: String,
}

impl std::fmt::Debug for OperatorCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorCredentials")
            .field("login_name", &self.login_name)
            .finish_non_exhaustive()
    }
}

impl OperatorCredentials {
    /// Hashes `password` with the default bcrypt cost.
    ///
    /// # Errors
    ///
    /// Returns an error if the login name or password is empty, or if
    /// hashing fails.
    pub fn from_plaintext(login_name: &str, password: &str) -> Result<Self, AuthError> {
        Self::with_cost(login_name, password, bcrypt::DEFAULT_COST)
    }

    /// Hashes `password` with an explicit bcrypt cost.
    ///
    /// # Arguments
    ///
    /// * `login_name` - The operator login name
    /// * `password` - The plaintext password
    /// * `cost` - The bcrypt work factor
    ///
    /// # Errors
    ///
    /// Returns an error if the login name or password is empty, or if
    /// hashing fails.
    pub fn with_cost(login_name: &str, password: &str, cost: u32) -> Result<Self, AuthError> {
        let login_name: &str = login_name.trim();
        if login_name.is_empty() {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Operator login name cannot be empty"),
            });
        }
        if password.is_empty() {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Operator password cannot be empty"),
            });
        }

        let password_hash: String =
            bcrypt::hash(password, cost).map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to hash operator password: {e}"),
            })?;

        Ok(Self {
            login_name: login_name.to_string(),
            password_hash,
        })
    }

    /// Returns the configured login name.
    #[must_use]
    pub fn login_name(&self) -> &str {
        &self.login_name
    }

    /// Checks a login attempt against these credentials.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AuthenticationFailed` for an unknown login name or
    /// a wrong password.
    pub fn verify(&self, login_name: &str, password: &str) -> Result<AuthenticatedOperator, AuthError> {
        if login_name.trim() != self.login_name {
            debug!(login_name, "Rejected login for unknown operator");
            return Err(invalid_credentials());
        }

        let matches: bool = bcrypt::verify(password, &self.password_hash).map_err(|e| {
            AuthError::AuthenticationFailed {
                reason: format!("Failed to verify password: {e}"),
            }
        })?;

        if !matches {
            debug!(login_name, "Rejected login with wrong password");
            return Err(invalid_credentials());
        }

        info!(login_name, "Operator authenticated");
        Ok(AuthenticatedOperator::new(self.login_name.clone()))
    }
}

fn invalid_credentials() -> AuthError {
    AuthError::AuthenticationFailed {
        reason: String::from("Invalid login name or password"),
    }
}

/// Authorization checks for dashboard actions.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks that a session may add, edit, delete or import institutes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` for viewer sessions.
    pub fn authorize_manage_institutes(
        session: &DashboardSession,
    ) -> Result<&AuthenticatedOperator, AuthError> {
        session.operator.as_ref().ok_or_else(|| AuthError::Unauthorized {
            action: String::from("manage_institutes"),
            required_role: String::from(Role::Operator.as_str()),
        })
    }
}
