// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session extraction for the server.
//!
//! Clients send the token they got from `POST /session` or `POST /login`
//! as `Authorization: Bearer <token>`. These extractors read and check it.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use examcal_api::DashboardSession;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::{AppState, ErrorResponse};

/// The bearer token of the request, not yet checked against the store.
///
/// # Errors
///
/// Rejects with HTTP 401 if the header is missing or malformed.
pub struct SessionToken(pub String);

impl FromRequestParts<AppState> for SessionToken {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        bearer_token(parts)?
            .map(Self)
            .ok_or(SessionError::MissingAuthorizationHeader)
    }
}

/// The bearer token of the request, if one was sent.
///
/// # Errors
///
/// Rejects with HTTP 401 only if a header is present but malformed.
pub struct OptionalSessionToken(pub Option<String>);

impl FromRequestParts<AppState> for OptionalSessionToken {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(bearer_token(parts)?))
    }
}

/// A live dashboard session.
///
/// Looking the session up extends its lifetime.
///
/// # Errors
///
/// Rejects with HTTP 401 if the header is missing or malformed, or if the
/// token is unknown or expired.
pub struct ActiveSession(pub DashboardSession);

impl FromRequestParts<AppState> for ActiveSession {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionToken(token) = SessionToken::from_request_parts(parts, state).await?;
        lookup(state, &token).await.map(Self)
    }
}

/// A live dashboard session if a token was sent.
///
/// # Errors
///
/// Rejects with HTTP 401 if a token was sent but is malformed, unknown or
/// expired.
pub struct OptionalSession(pub Option<DashboardSession>);

impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => lookup(state, &token).await.map(|session| Self(Some(session))),
            None => Ok(Self(None)),
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<String>, SessionError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let header: &str = value.to_str().map_err(|_| {
        warn!("Invalid Authorization header encoding");
        SessionError::InvalidAuthorizationHeader
    })?;

    let token: &str = header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Authorization header does not start with 'Bearer '");
        SessionError::InvalidAuthorizationHeader
    })?;

    Ok(Some(token.trim().to_string()))
}

async fn lookup(state: &AppState, token: &str) -> Result<DashboardSession, SessionError> {
    let mut sessions = state.sessions.lock().await;
    let session: DashboardSession = sessions
        .get(token, OffsetDateTime::now_utc())
        .map_err(|e| {
            debug!(error = %e, "Session lookup failed");
            SessionError::InvalidSession(e.to_string())
        })?;
    drop(sessions);

    debug!(role = session.role().as_str(), "Session validated");
    Ok(session)
}

/// Session extraction errors.
#[derive(Debug)]
pub enum SessionError {
    /// Authorization header is missing.
    MissingAuthorizationHeader,
    /// Authorization header format is invalid.
    InvalidAuthorizationHeader,
    /// The token is unknown or expired.
    InvalidSession(String),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let message: String = match self {
            Self::MissingAuthorizationHeader => String::from("Missing Authorization header"),
            Self::InvalidAuthorizationHeader => String::from(
                "Invalid Authorization header format. Expected: 'Bearer <token>'",
            ),
            Self::InvalidSession(reason) => format!("Session validation failed: {reason}"),
        };

        (
            StatusCode::UNAUTHORIZED,
            axum::Json(ErrorResponse {
                error: true,
                message,
            }),
        )
            .into_response()
    }
}
