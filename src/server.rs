//! # HTTP Server Module
//!
//! Axum routes the solar monitor and its operators talk to:
//!
//! - `POST /solar-log` stores one reading
//! - `GET /solar-log/status` summarizes today's log
//! - `GET /solar-log/files` lists every daily log
//! - `GET /healthz` liveness probe
//!
//! File system work runs on tokio's blocking pool.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::{error, info, warn};

use crate::error::{Result, SolarLogError};
use crate::telemetry::{
    Clock, DailyLogStore, DayStatus, FileCatalog, LogFileInfo, Reading, StatusReader,
};

/// Shared application state
///
/// Built once at start-up; every component looks at the same directory.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<DailyLogStore>,
    pub status: StatusReader,
    pub catalog: FileCatalog,
}

impl AppState {
    /// Open the log directory (creating it if needed) and wire up the readers
    pub fn new(log_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self> {
        let log_dir = log_dir.into();
        let store = DailyLogStore::open(&log_dir, Arc::clone(&clock))?;

        Ok(Self {
            store: Arc::new(store),
            status: StatusReader::new(&log_dir, clock),
            catalog: FileCatalog::new(log_dir),
        })
    }
}

/// Acknowledgement for a stored reading
#[derive(Debug, Serialize)]
struct AckResponse {
    status: &'static str,
    message: &'static str,
    filename: String,
}

/// Body of every error response
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct FilesResponse {
    files: Vec<LogFileInfo>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

impl IntoResponse for SolarLogError {
    fn into_response(self) -> Response {
        let status = match &self {
            SolarLogError::Validation(_) => StatusCode::BAD_REQUEST,
            SolarLogError::Config(_) | SolarLogError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let app_state = Arc::new(state);

    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/solar-log", post(receive_log_handler))
        .route("/solar-log/status", get(status_handler))
        .route("/solar-log/files", get(files_handler))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Run blocking file system work off the async workers
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| SolarLogError::Io(io::Error::other(e)))?
}

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Store one reading posted by the device.
async fn receive_log_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<AckResponse>> {
    let reading = Reading::from_json(&body).inspect_err(|e| {
        warn!(error = %e, "Rejected solar log payload");
    })?;

    let store = Arc::clone(&state.store);
    let receipt = run_blocking(move || store.append(&reading))
        .await
        .inspect_err(|e| error!(error = %e, "Error processing log"))?;

    info!(file = %receipt.filename, "Log entry written: {}", receipt.entry);

    Ok(Json(AckResponse {
        status: "success",
        message: "Log received and saved",
        filename: receipt.filename,
    }))
}

/// Summary of today's log.
async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<DayStatus>> {
    let reader = state.status.clone();
    let status = run_blocking(move || reader.status())
        .await
        .inspect_err(|e| error!(error = %e, "Status lookup failed"))?;

    Ok(Json(status))
}

/// Every daily log file on disk.
async fn files_handler(State(state): State<Arc<AppState>>) -> Result<Json<FilesResponse>> {
    let catalog = state.catalog.clone();
    let files = run_blocking(move || catalog.list_files())
        .await
        .inspect_err(|e| error!(error = %e, "Listing log files failed"))?;

    Ok(Json(FilesResponse { files }))
}
