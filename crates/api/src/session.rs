// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-visitor dashboard state.
//!
//! Every visitor holds a `DashboardSession` keyed by a random token. The
//! session carries what the dashboard needs between requests: the year
//! being viewed, the selected date range, the duplicate toggle, the
//! institute picked for editing and, after login, the operator identity.
//! Sessions expire after a sliding time-to-live.

use std::collections::HashMap;

use examcal_domain::{DateRange, DuplicatePolicy};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use crate::auth::{AuthenticatedOperator, AuthorizationService, OperatorCredentials, Role};
use crate::error::{ApiError, AuthError};
use crate::heatmap::{MAX_HEATMAP_YEAR, MIN_HEATMAP_YEAR};

/// Dashboard state for one visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSession {
    /// The token identifying this session.
    pub token: String,
    /// The logged-in operator, or `None` for a viewer.
    pub operator: Option<AuthenticatedOperator>,
    /// The calendar year being viewed.
    pub year: i32,
    /// The range selected for detailed statistics.
    pub selected_range: Option<DateRange>,
    /// The institute picked for editing.
    pub edit_target: Option<i64>,
    /// Whether duplicate institute codes are collapsed.
    pub remove_duplicates: bool,
    /// When the session lapses unless touched again.
    pub expires_at: OffsetDateTime,
}

impl DashboardSession {
    /// Returns the role this session holds.
    #[must_use]
    pub const fn role(&self) -> Role {
        if self.operator.is_some() {
            Role::Operator
        } else {
            Role::Viewer
        }
    }

    /// Returns the duplicate policy selected by this session.
    #[must_use]
    pub const fn duplicate_policy(&self) -> DuplicatePolicy {
        DuplicatePolicy::from_remove_duplicates(self.remove_duplicates)
    }

    /// Returns whether the session has lapsed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}

/// Changes to apply to a session. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    /// New year to view.
    pub year: Option<i32>,
    /// New range selection; `Some(None)` clears it.
    pub selected_range: Option<Option<DateRange>>,
    /// New duplicate toggle.
    pub remove_duplicates: Option<bool>,
    /// New edit target; `Some(None)` clears it.
    pub edit_target: Option<Option<i64>>,
}

impl SessionUpdate {
    /// Returns whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.year.is_none()
            && self.selected_range.is_none()
            && self.remove_duplicates.is_none()
            && self.edit_target.is_none()
    }
}

/// In-memory store of dashboard sessions.
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<String, DashboardSession>,
    ttl: Duration,
}

impl SessionStore {
    /// Creates an empty store whose sessions live for `ttl` after last use.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
        }
    }

    /// Returns the number of stored sessions, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns whether the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Starts an anonymous viewer session.
    ///
    /// The session views the current year, clamped to the supported range,
    /// with duplicate removal switched on.
    pub fn create_viewer_session(&mut self, now: OffsetDateTime) -> DashboardSession {
        let session: DashboardSession = DashboardSession {
            token: generate_session_token(),
            operator: None,
            year: now.year().clamp(MIN_HEATMAP_YEAR, MAX_HEATMAP_YEAR),
            selected_range: None,
            edit_target: None,
            remove_duplicates: true,
            expires_at: now + self.ttl,
        };
        debug!(year = session.year, "Created viewer session");
        self.sessions.insert(session.token.clone(), session.clone());
        session
    }

    /// Looks up a live session and extends its lifetime.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AuthenticationFailed` for an unknown or expired
    /// token. Expired sessions are removed.
    pub fn get(&mut self, token: &str, now: OffsetDateTime) -> Result<DashboardSession, AuthError> {
        let ttl: Duration = self.ttl;
        let session: &mut DashboardSession = self.live_session(token, now)?;
        session.expires_at = now + ttl;
        Ok(session.clone())
    }

    /// Applies an update to a live session.
    ///
    /// # Errors
    ///
    /// * `ApiError::AuthenticationFailed` for an unknown or expired token
    /// * `ApiError::InvalidInput` for a year outside the supported range
    /// * `ApiError::Unauthorized` if a viewer session sets an edit target
    pub fn update(
        &mut self,
        token: &str,
        update: SessionUpdate,
        now: OffsetDateTime,
    ) -> Result<DashboardSession, ApiError> {
        let ttl: Duration = self.ttl;
        let session: &mut DashboardSession = self.live_session(token, now)?;

        if let Some(year) = update.year
            && !(MIN_HEATMAP_YEAR..=MAX_HEATMAP_YEAR).contains(&year)
        {
            return Err(ApiError::InvalidInput {
                field: String::from("year"),
                message: format!(
                    "Year must be between {MIN_HEATMAP_YEAR} and {MAX_HEATMAP_YEAR}, got {year}"
                ),
            });
        }

        if let Some(Some(_)) = update.edit_target {
            AuthorizationService::authorize_manage_institutes(session)?;
        }

        if let Some(year) = update.year {
            session.year = year;
        }
        if let Some(selected_range) = update.selected_range {
            session.selected_range = selected_range;
        }
        if let Some(remove_duplicates) = update.remove_duplicates {
            session.remove_duplicates = remove_duplicates;
        }
        if let Some(edit_target) = update.edit_target {
            session.edit_target = edit_target;
        }
        session.expires_at = now + ttl;

        Ok(session.clone())
    }

    /// Logs an operator in.
    ///
    /// A new token is always issued. When `token` names a live session its
    /// year, range and duplicate toggle carry over and the old token stops
    /// working.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AuthenticationFailed` if the credentials do not
    /// match.
    pub fn login(
        &mut self,
        token: Option<&str>,
        credentials: &OperatorCredentials,
        login_name: &str,
        password: &str,
        now: OffsetDateTime,
    ) -> Result<DashboardSession, AuthError> {
        let operator: AuthenticatedOperator = credentials.verify(login_name, password)?;

        let previous: Option<DashboardSession> = token.and_then(|token| {
            self.sessions
                .remove(token)
                .filter(|session| !session.is_expired(now))
        });

        let mut session: DashboardSession = match previous {
            Some(previous) => previous,
            None => self.create_viewer_session(now),
        };
        self.sessions.remove(&session.token);

        session.token = generate_session_token();
        session.operator = Some(operator);
        session.expires_at = now + self.ttl;

        info!(login_name = credentials.login_name(), "Operator session started");
        self.sessions.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    /// Logs the operator out, leaving a viewer session behind.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AuthenticationFailed` for an unknown or expired
    /// token.
    pub fn logout(&mut self, token: &str, now: OffsetDateTime) -> Result<DashboardSession, AuthError> {
        let ttl: Duration = self.ttl;
        let session: &mut DashboardSession = self.live_session(token, now)?;

        if let Some(operator) = session.operator.take() {
            info!(login_name = %operator.login_name, "Operator logged out");
        }
        session.edit_target = None;
        session.expires_at = now + ttl;

        Ok(session.clone())
    }

    /// Removes every session that has lapsed at `now`.
    ///
    /// Returns the number of sessions removed.
    pub fn purge_expired(&mut self, now: OffsetDateTime) -> usize {
        let before: usize = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        let removed: usize = before - self.sessions.len();
        if removed > 0 {
            debug!(removed, "Purged expired sessions");
        }
        removed
    }

    fn live_session(
        &mut self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<&mut DashboardSession, AuthError> {
        let expired: bool = match self.sessions.get(token) {
            None => {
                return Err(AuthError::AuthenticationFailed {
                    reason: String::from("Invalid session token"),
                });
            }
            Some(session) => session.is_expired(now),
        };

        if expired {
            self.sessions.remove(token);
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        self.sessions
            .get_mut(token)
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })
    }
}

/// Generates an unguessable session token.
fn generate_session_token() -> String {
    format!(
        "session_{:016x}{:016x}",
        rand::random::<u64>(),
        rand::random::<u64>()
    )
}
