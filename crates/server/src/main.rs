// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod session;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use chrono_tz::Tz;
use clap::Parser;
use examcal_api::{
    ApiError, AuthError, AuthorizationService, ColumnMappingSuggestion, CsvImportRequest,
    CsvImportResult, CsvPreviewResult, CsvUploadRequest, DEFAULT_DISPLAY_TIMEZONE,
    DashboardSession, HeatmapReport, InstituteInfo, InstituteMutationResponse, InstituteRequest,
    ListInstitutesRequest, ListInstitutesResponse, LoadedSnapshot, LoginRequest,
    MAX_HEATMAP_YEAR, MIN_HEATMAP_YEAR, OperatorCredentials, RangeSelection, SessionInfo,
    SessionStore, SessionUpdate, SnapshotOptions, UpdateSessionRequest, build_heatmap_report,
    create_institute, delete_institute, get_institute, import_csv_institutes, list_institutes,
    load_snapshot, preview_csv_institutes, suggest_column_mapping, update_institute,
    validate_year,
};
use examcal_domain::{DateRange, DuplicatePolicy};
use examcal_persistence::{Persistence, PersistenceError};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::session::{ActiveSession, OptionalSession, OptionalSessionToken, SessionToken};

/// Value of `--database` that selects a throwaway in-memory store.
const IN_MEMORY_DATABASE: &str = ":memory:";

/// How often lapsed sessions are swept from the store.
const SESSION_PURGE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Examcal Server - exam availability calendar for institutes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file, or `:memory:` for a throwaway store
    #[arg(short, long, env = "EXAMCAL_DATABASE")]
    database: String,

    /// Login name of the operator account
    #[arg(long, env = "EXAMCAL_ADMIN_LOGIN")]
    admin_login: String,

    /// Password of the operator account
    #[arg(long, env = "EXAMCAL_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: String,

    /// Address to bind the server to
    #[arg(short, long, env = "EXAMCAL_BIND", default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Port to bind the server to
    #[arg(short, long, env = "EXAMCAL_PORT", default_value_t = 3000)]
    port: u16,

    /// Minutes of inactivity after which a session lapses
    #[arg(long, env = "EXAMCAL_SESSION_TTL_MINUTES", default_value_t = 480)]
    session_ttl_minutes: u32,

    /// IANA time zone used for the "last fetched" caption
    #[arg(
        long,
        env = "EXAMCAL_DISPLAY_TIMEZONE",
        default_value = DEFAULT_DISPLAY_TIMEZONE,
        value_parser = parse_timezone
    )]
    display_timezone: Tz,
}

fn parse_timezone(value: &str) -> Result<Tz, String> {
    value
        .parse::<Tz>()
        .map_err(|e| format!("unknown time zone '{value}': {e}"))
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// The institute record store.
    persistence: Arc<Mutex<Persistence>>,
    /// Live dashboard sessions.
    sessions: Arc<Mutex<SessionStore>>,
    /// The operator account.
    credentials: Arc<OperatorCredentials>,
    /// Zone used to render timestamps.
    display_timezone: Tz,
}

/// Query parameters accepted by `GET /heatmap`.
///
/// `start` and `end` select a range and must be sent together.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct HeatmapQuery {
    year: Option<i32>,
    start: Option<String>,
    end: Option<String>,
    remove_duplicates: Option<bool>,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ErrorResponse {
    /// Always `true`.
    error: bool,
    /// A human-readable description of the failure.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidInput { .. } | ApiError::InvalidCsvFormat { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ResourceNotFound { .. } | ApiError::EmptySnapshot { .. } => {
                StatusCode::NOT_FOUND
            }
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<AuthError> for HttpError {
    fn from(err: AuthError) -> Self {
        ApiError::from(err).into()
    }
}

/// Handler for POST `/session` endpoint.
///
/// Starts an anonymous viewer session.
async fn handle_create_session(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<SessionInfo>, HttpError> {
    info!("Handling create_session request");

    let mut sessions = app_state.sessions.lock().await;
    let session: DashboardSession = sessions.create_viewer_session(OffsetDateTime::now_utc());
    drop(sessions);

    Ok(Json(SessionInfo::from_session(&session)?))
}

/// Handler for GET `/session` endpoint.
async fn handle_get_session(
    ActiveSession(session): ActiveSession,
) -> Result<Json<SessionInfo>, HttpError> {
    info!(role = session.role().as_str(), "Handling get_session request");
    Ok(Json(SessionInfo::from_session(&session)?))
}

/// Handler for PUT `/session` endpoint.
///
/// Changes the viewed year, the selected range, the duplicate toggle or the
/// edit target. An edit target must name a stored institute.
async fn handle_update_session(
    AxumState(app_state): AxumState<AppState>,
    ActiveSession(session): ActiveSession,
    Json(req): Json<UpdateSessionRequest>,
) -> Result<Json<SessionInfo>, HttpError> {
    info!(role = session.role().as_str(), "Handling update_session request");

    let update: SessionUpdate = req.into_update()?;

    if let Some(Some(institute_id)) = update.edit_target {
        let mut persistence = app_state.persistence.lock().await;
        get_institute(&mut *persistence, &session, institute_id)?;
        drop(persistence);
    }

    let mut sessions = app_state.sessions.lock().await;
    let updated: DashboardSession =
        sessions.update(&session.token, update, OffsetDateTime::now_utc())?;
    drop(sessions);

    Ok(Json(SessionInfo::from_session(&updated)?))
}

/// Handler for POST `/login` endpoint.
///
/// A new token is always issued. Preferences of the session named by the
/// `Authorization` header, if any, carry over.
async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    OptionalSessionToken(token): OptionalSessionToken,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionInfo>, HttpError> {
    info!(login_name = %req.login_name, "Handling login request");

    let mut sessions = app_state.sessions.lock().await;
    let session: DashboardSession = sessions.login(
        token.as_deref(),
        &app_state.credentials,
        &req.login_name,
        &req.password,
        OffsetDateTime::now_utc(),
    )?;
    drop(sessions);

    Ok(Json(SessionInfo::from_session(&session)?))
}

/// Handler for POST `/logout` endpoint.
///
/// The session survives as a viewer session.
async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    SessionToken(token): SessionToken,
) -> Result<Json<SessionInfo>, HttpError> {
    info!("Handling logout request");

    let mut sessions = app_state.sessions.lock().await;
    let session: DashboardSession = sessions.logout(&token, OffsetDateTime::now_utc())?;
    drop(sessions);

    Ok(Json(SessionInfo::from_session(&session)?))
}

/// Handler for GET `/heatmap` endpoint.
///
/// Re-reads every stored institute and renders the year. With a session,
/// query overrides are saved into it; without one they apply to this
/// request only.
async fn handle_heatmap(
    AxumState(app_state): AxumState<AppState>,
    OptionalSession(session): OptionalSession,
    Query(query): Query<HeatmapQuery>,
) -> Result<Json<HeatmapReport>, HttpError> {
    info!(
        year = ?query.year,
        has_session = session.is_some(),
        "Handling heatmap request"
    );

    if let Some(year) = query.year {
        validate_year(year)?;
    }
    let range_override: Option<DateRange> = parse_range_query(&query)?;

    let (year, selected_range, remove_duplicates): (i32, Option<DateRange>, bool) = match session
    {
        Some(session) => {
            let update: SessionUpdate = SessionUpdate {
                year: query.year,
                selected_range: range_override.map(Some),
                remove_duplicates: query.remove_duplicates,
                edit_target: None,
            };
            let session: DashboardSession = if update.is_empty() {
                session
            } else {
                let mut sessions = app_state.sessions.lock().await;
                let updated: DashboardSession =
                    sessions.update(&session.token, update, OffsetDateTime::now_utc())?;
                drop(sessions);
                updated
            };
            (
                session.year,
                session.selected_range,
                session.remove_duplicates,
            )
        }
        None => (
            query.year.unwrap_or_else(current_year),
            range_override,
            query.remove_duplicates.unwrap_or(true),
        ),
    };

    let options: SnapshotOptions = SnapshotOptions {
        duplicate_policy: DuplicatePolicy::from_remove_duplicates(remove_duplicates),
    };

    let mut persistence = app_state.persistence.lock().await;
    let snapshot: LoadedSnapshot = load_snapshot(&mut *persistence, &options)?;
    drop(persistence);

    let report: HeatmapReport = build_heatmap_report(
        &snapshot,
        year,
        selected_range.as_ref(),
        app_state.display_timezone,
        Utc::now(),
    )?;

    debug!(
        year,
        institutes = report.total_institutes,
        "Heatmap rendered"
    );
    Ok(Json(report))
}

fn parse_range_query(query: &HeatmapQuery) -> Result<Option<DateRange>, ApiError> {
    match (&query.start, &query.end) {
        (Some(start), Some(end)) => {
            let selection: RangeSelection = RangeSelection {
                start: start.clone(),
                end: end.clone(),
            };
            Ok(Some(selection.to_date_range()?))
        }
        (None, None) => Ok(None),
        _ => Err(ApiError::InvalidInput {
            field: String::from("range"),
            message: String::from("Both start and end are required to select a range"),
        }),
    }
}

fn current_year() -> i32 {
    OffsetDateTime::now_utc()
        .year()
        .clamp(MIN_HEATMAP_YEAR, MAX_HEATMAP_YEAR)
}

/// Handler for GET `/institutes` endpoint.
async fn handle_list_institutes(
    AxumState(app_state): AxumState<AppState>,
    ActiveSession(session): ActiveSession,
    Query(query): Query<ListInstitutesRequest>,
) -> Result<Json<ListInstitutesResponse>, HttpError> {
    info!(
        limit = ?query.limit,
        offset = ?query.offset,
        "Handling list_institutes request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: ListInstitutesResponse = list_institutes(&mut *persistence, &session, &query)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/institutes` endpoint.
async fn handle_create_institute(
    AxumState(app_state): AxumState<AppState>,
    ActiveSession(session): ActiveSession,
    Json(req): Json<InstituteRequest>,
) -> Result<Json<InstituteMutationResponse>, HttpError> {
    info!(
        institute_code = %req.institute_code,
        "Handling create_institute request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: InstituteMutationResponse = create_institute(&mut *persistence, &session, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/institutes/{id}` endpoint.
async fn handle_get_institute(
    AxumState(app_state): AxumState<AppState>,
    ActiveSession(session): ActiveSession,
    Path(institute_id): Path<i64>,
) -> Result<Json<InstituteInfo>, HttpError> {
    info!(institute_id, "Handling get_institute request");

    let mut persistence = app_state.persistence.lock().await;
    let info: InstituteInfo = get_institute(&mut *persistence, &session, institute_id)?;
    drop(persistence);

    Ok(Json(info))
}

/// Handler for PUT `/institutes/{id}` endpoint.
async fn handle_update_institute(
    AxumState(app_state): AxumState<AppState>,
    ActiveSession(session): ActiveSession,
    Path(institute_id): Path<i64>,
    Json(req): Json<InstituteRequest>,
) -> Result<Json<InstituteMutationResponse>, HttpError> {
    info!(institute_id, "Handling update_institute request");

    let mut persistence = app_state.persistence.lock().await;
    let response: InstituteMutationResponse =
        update_institute(&mut *persistence, &session, institute_id, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for DELETE `/institutes/{id}` endpoint.
///
/// Clears the edit target if it pointed at the deleted institute.
async fn handle_delete_institute(
    AxumState(app_state): AxumState<AppState>,
    ActiveSession(session): ActiveSession,
    Path(institute_id): Path<i64>,
) -> Result<Json<InstituteMutationResponse>, HttpError> {
    info!(institute_id, "Handling delete_institute request");

    let mut persistence = app_state.persistence.lock().await;
    let response: InstituteMutationResponse =
        delete_institute(&mut *persistence, &session, institute_id)?;
    drop(persistence);

    if session.edit_target == Some(institute_id) {
        let update: SessionUpdate = SessionUpdate {
            edit_target: Some(None),
            ..SessionUpdate::default()
        };
        let mut sessions = app_state.sessions.lock().await;
        sessions.update(&session.token, update, OffsetDateTime::now_utc())?;
        drop(sessions);
    }

    Ok(Json(response))
}

/// Handler for POST `/institutes/import/mapping` endpoint.
///
/// Suggests a column mapping for an uploaded file. Nothing is stored.
async fn handle_suggest_mapping(
    ActiveSession(session): ActiveSession,
    Json(req): Json<CsvUploadRequest>,
) -> Result<Json<ColumnMappingSuggestion>, HttpError> {
    info!(
        bytes = req.csv_content.len(),
        "Handling suggest_mapping request"
    );

    AuthorizationService::authorize_manage_institutes(&session)?;
    let suggestion: ColumnMappingSuggestion = suggest_column_mapping(&req.csv_content)?;

    Ok(Json(suggestion))
}

/// Handler for POST `/institutes/import/preview` endpoint.
async fn handle_preview_import(
    AxumState(app_state): AxumState<AppState>,
    ActiveSession(session): ActiveSession,
    Json(req): Json<CsvImportRequest>,
) -> Result<Json<CsvPreviewResult>, HttpError> {
    info!(
        bytes = req.csv_content.len(),
        "Handling preview_import request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let preview: CsvPreviewResult =
        preview_csv_institutes(&mut *persistence, &session, &req.csv_content, &req.mapping)?;
    drop(persistence);

    Ok(Json(preview))
}

/// Handler for POST `/institutes/import` endpoint.
async fn handle_import(
    AxumState(app_state): AxumState<AppState>,
    ActiveSession(session): ActiveSession,
    Json(req): Json<CsvImportRequest>,
) -> Result<Json<CsvImportResult>, HttpError> {
    info!(bytes = req.csv_content.len(), "Handling import request");

    let mut persistence = app_state.persistence.lock().await;
    let result: CsvImportResult =
        import_csv_institutes(&mut *persistence, &session, &req.csv_content, &req.mapping)?;
    drop(persistence);

    Ok(Json(result))
}

/// Builds the application router.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/session",
            post(handle_create_session)
                .get(handle_get_session)
                .put(handle_update_session),
        )
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .route("/heatmap", get(handle_heatmap))
        .route(
            "/institutes",
            get(handle_list_institutes).post(handle_create_institute),
        )
        .route(
            "/institutes/{id}",
            get(handle_get_institute)
                .put(handle_update_institute)
                .delete(handle_delete_institute),
        )
        .route("/institutes/import/mapping", post(handle_suggest_mapping))
        .route("/institutes/import/preview", post(handle_preview_import))
        .route("/institutes/import", post(handle_import))
        .with_state(app_state)
}

/// Sweeps lapsed sessions out of the store at a fixed interval.
fn spawn_session_reaper(sessions: Arc<Mutex<SessionStore>>) {
    tokio::spawn(async move {
        let mut interval: tokio::time::Interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let removed: usize = sessions
                .lock()
                .await
                .purge_expired(OffsetDateTime::now_utc());
            if removed > 0 {
                info!(removed, "Purged expired sessions");
            }
        }
    });
}

/// Opens the record store named by `--database` and reports its size.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or counted.
fn open_store(database: &str) -> Result<Persistence, PersistenceError> {
    let mut persistence: Persistence = if database == IN_MEMORY_DATABASE {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    } else {
        info!("Using file-based database at: {}", database);
        Persistence::new_with_file(database)?
    };

    let stored: i64 = persistence.count_institutes()?;
    info!(institutes = stored, "Record store ready");

    Ok(persistence)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Examcal Server");

    let persistence: Persistence = open_store(&args.database)?;

    let credentials: OperatorCredentials =
        OperatorCredentials::from_plaintext(&args.admin_login, &args.admin_password)?;

    let sessions: Arc<Mutex<SessionStore>> = Arc::new(Mutex::new(SessionStore::new(
        time::Duration::minutes(i64::from(args.session_ttl_minutes)),
    )));
    spawn_session_reaper(Arc::clone(&sessions));

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        sessions,
        credentials: Arc::new(credentials),
        display_timezone: args.display_timezone,
    };

    let app: Router = build_router(app_state);

    let addr: SocketAddr = SocketAddr::new(args.bind, args.port);
    info!(
        timezone = %args.display_timezone,
        session_ttl_minutes = args.session_ttl_minutes,
        "Server listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
