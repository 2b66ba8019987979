//! Handlers for bulk product upload sessions.
//!
//! Provides endpoints for session creation, CSV file upload and
//! validation, status polling, cancellation, retry, history listing,
//! error export, and template download.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use taic_core::bulk_upload::session::{
    estimated_seconds_remaining, progress_percentage, SessionStatus,
};
use taic_core::bulk_upload::template::{self, TemplateKind, TemplateOptions};
use taic_core::bulk_upload::validate::{self, Severity, ValidationSummary};
use taic_core::error::CoreError;
use taic_core::pagination::{
    clamp_limit, clamp_offset, clamp_page, clamp_page_size, page_offset, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
use taic_core::types::SessionId;
use taic_db::models::row_error::{CreateUploadRowError, UploadRowError};
use taic_db::models::upload_session::{CreateUploadSession, UploadSession};
use taic_db::repositories::{RowErrorRepo, UploadSessionRepo};

use crate::error::{AppError, AppResult};
use crate::merchant::Merchant;
use crate::query::{ErrorExportParams, HistoryParams, TemplateParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Rows between progress writes during ingestion. Also the granularity
/// at which a cancellation request takes effect.
pub const PROGRESS_BATCH_ROWS: usize = 250;

/// Upper bound on row errors persisted per session. The full diagnostic
/// list is unbounded in the validation result; persistence keeps only
/// the leading slice.
pub const MAX_PERSISTED_ROW_ERRORS: usize = 100;

/// Number of recent errors embedded in a status snapshot.
const RECENT_ERRORS_LIMIT: i64 = 5;

/// Default and maximum page size for the error export endpoint.
const ERROR_EXPORT_DEFAULT_LIMIT: i64 = 50;
const ERROR_EXPORT_MAX_LIMIT: i64 = 100;

// ── Response shapes ──────────────────────────────────────────────────

/// Derived progress block embedded in a status snapshot.
#[derive(Debug, Serialize)]
pub struct ProgressView {
    /// 0-100, derived from processed vs. expected rows.
    pub percentage: f64,
    /// Current lifecycle phase (the status name).
    pub phase: String,
}

/// Full client-facing view of a session, returned by every endpoint
/// that yields a session.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    #[serde(flatten)]
    pub session: UploadSession,
    pub progress: ProgressView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_seconds_remaining: Option<f64>,
    /// Most recent row errors, newest first, bounded. Present only when
    /// the session has recorded failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recent_errors: Vec<UploadRowError>,
}

impl SessionSnapshot {
    fn build(session: UploadSession, recent_errors: Vec<UploadRowError>) -> Self {
        let status = session.status().unwrap_or(SessionStatus::Created);
        let total_rows = if session.actual_rows > 0 {
            session.actual_rows
        } else {
            session.expected_rows
        };
        let percentage = progress_percentage(status, session.processed_rows, total_rows);
        let elapsed_secs = session
            .started_at
            .map(|started| (chrono::Utc::now() - started).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);
        let eta =
            estimated_seconds_remaining(status, session.processed_rows, total_rows, elapsed_secs);

        Self {
            progress: ProgressView {
                percentage,
                phase: session.status.clone(),
            },
            estimated_seconds_remaining: eta,
            recent_errors,
            session,
        }
    }
}

/// Load the bounded recent-error list for a session when it has recorded
/// failures, and wrap the session into a snapshot.
async fn snapshot_with_errors(
    state: &AppState,
    session: UploadSession,
) -> AppResult<SessionSnapshot> {
    let status = session.status();
    let wants_errors =
        session.failed_rows > 0 || status == Some(SessionStatus::Failed);
    let recent = if wants_errors {
        RowErrorRepo::list_recent(&state.pool, session.id, RECENT_ERRORS_LIMIT).await?
    } else {
        Vec::new()
    };
    Ok(SessionSnapshot::build(session, recent))
}

fn session_not_found(id: SessionId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "upload session",
        id: id.to_string(),
    })
}

// ── Create Session ───────────────────────────────────────────────────

/// Request body for session creation.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub filename: String,
    pub file_size_bytes: i64,
    /// Client-reported data row count, used for progress estimation
    /// until the server confirms the actual count.
    pub expected_rows: i32,
}

impl CreateSessionRequest {
    fn validate(&self) -> Result<(), AppError> {
        let validation = |msg: &str| AppError::Core(CoreError::Validation(msg.to_string()));

        if self.filename.trim().is_empty() {
            return Err(validation("filename must not be empty"));
        }
        if self.filename.len() > 255 {
            return Err(validation("filename must be at most 255 characters"));
        }
        if self.file_size_bytes <= 0 {
            return Err(validation("file_size_bytes must be positive"));
        }
        if self.file_size_bytes > validate::MAX_FILE_SIZE_BYTES as i64 {
            return Err(validation(&format!(
                "file_size_bytes exceeds the maximum of {} bytes",
                validate::MAX_FILE_SIZE_BYTES
            )));
        }
        if self.expected_rows <= 0 {
            return Err(validation("expected_rows must be positive"));
        }
        if self.expected_rows > validate::MAX_DATA_ROWS as i32 {
            return Err(validation(&format!(
                "expected_rows exceeds the maximum of {} rows",
                validate::MAX_DATA_ROWS
            )));
        }
        Ok(())
    }
}

/// POST /api/v1/bulk-upload/sessions
///
/// Register a new upload session in 'created' status. The file itself
/// arrives in a follow-up request to the file endpoint.
pub async fn create_session(
    State(state): State<AppState>,
    merchant: Merchant,
    Json(body): Json<CreateSessionRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SessionSnapshot>>)> {
    body.validate()?;

    let session = UploadSessionRepo::create(
        &state.pool,
        &CreateUploadSession {
            merchant_id: merchant.id,
            filename: body.filename,
            file_size_bytes: body.file_size_bytes,
            expected_rows: body.expected_rows,
        },
    )
    .await?;

    tracing::info!(
        session_id = %session.id,
        merchant_id = merchant.id,
        filename = %session.filename,
        "Created upload session"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(SessionSnapshot::build(session, Vec::new()))),
    ))
}

// ── Status ───────────────────────────────────────────────────────────

/// GET /api/v1/bulk-upload/sessions/{id}
///
/// Return the current snapshot of a session, including derived progress
/// and a bounded list of recent row errors.
pub async fn get_status(
    State(state): State<AppState>,
    merchant: Merchant,
    Path(id): Path<SessionId>,
) -> AppResult<Json<DataResponse<SessionSnapshot>>> {
    let session = UploadSessionRepo::find_by_id(&state.pool, id, merchant.id)
        .await?
        .ok_or_else(|| session_not_found(id))?;

    Ok(Json(DataResponse::new(
        snapshot_with_errors(&state, session).await?,
    )))
}

// ── File Upload ──────────────────────────────────────────────────────

/// POST /api/v1/bulk-upload/sessions/{id}/file
///
/// Accept the CSV file as a multipart upload, validate it, and ingest
/// valid rows. Progress counters advance in batches so a concurrent
/// status poll sees monotonic progress, and a cancellation request
/// takes effect between batches.
pub async fn process_upload(
    State(state): State<AppState>,
    merchant: Merchant,
    Path(id): Path<SessionId>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<SessionSnapshot>>> {
    // Ownership check before reading the body.
    UploadSessionRepo::find_by_id(&state.pool, id, merchant.id)
        .await?
        .ok_or_else(|| session_not_found(id))?;

    let bytes = read_file_field(&mut multipart).await?;

    // created -> processing; refuse re-upload and terminal sessions.
    if UploadSessionRepo::start_processing(&state.pool, id).await?.is_none() {
        return Err(AppError::Core(CoreError::Conflict(
            "Session has already received a file or is no longer active".into(),
        )));
    }

    let validation = validate::validate_bytes(&bytes);

    // Persist the leading slice of diagnostics for later export.
    if !validation.errors.is_empty() {
        let to_persist: Vec<CreateUploadRowError> = validation
            .errors
            .iter()
            .take(MAX_PERSISTED_ROW_ERRORS)
            .map(CreateUploadRowError::from_validation)
            .collect();
        RowErrorRepo::batch_insert(&state.pool, id, &to_persist).await?;
    }

    let summary = validation.summary();

    // File-level failures (undecodable, empty, oversized, missing
    // headers) fail the whole session before any row is ingested.
    let structural = validation
        .errors
        .iter()
        .any(|e| e.row_number == 0 && e.severity == Severity::Error);
    if structural {
        let message = summary_message(&summary);
        let session = UploadSessionRepo::fail(&state.pool, id, &message)
            .await?
            .ok_or_else(|| session_not_found(id))?;
        tracing::warn!(session_id = %id, summary = %message, "Upload failed validation");
        return Ok(Json(DataResponse::new(
            snapshot_with_errors(&state, session).await?,
        )));
    }

    UploadSessionRepo::set_actual_rows(&state.pool, id, validation.row_count as i32).await?;

    // Rows that carry at least one error-severity diagnostic count as
    // failed; everything else ingests.
    let failed_rows: std::collections::HashSet<usize> = validation
        .errors
        .iter()
        .filter(|e| e.severity == Severity::Error)
        .map(|e| e.row_number)
        .collect();

    // First data row is file row 2.
    let row_numbers: Vec<usize> = (2..validation.row_count + 2).collect();
    let mut cancelled = false;
    for batch in row_numbers.chunks(PROGRESS_BATCH_ROWS) {
        let failed = batch.iter().filter(|n| failed_rows.contains(*n)).count() as i32;
        let successful = batch.len() as i32 - failed;

        let updated =
            UploadSessionRepo::record_progress(&state.pool, id, batch.len() as i32, successful, failed)
                .await?;
        if updated.is_none() {
            // The session left 'processing' under us: cancelled.
            cancelled = true;
            break;
        }
    }

    let session = if cancelled {
        tracing::info!(session_id = %id, "Upload cancelled mid-processing");
        UploadSessionRepo::find_by_id(&state.pool, id, merchant.id)
            .await?
            .ok_or_else(|| session_not_found(id))?
    } else {
        let message = if summary.error_count > 0 || summary.warning_count > 0 {
            Some(summary_message(&summary))
        } else {
            None
        };
        match UploadSessionRepo::complete(&state.pool, id, message.as_deref()).await? {
            Some(session) => session,
            // Cancelled after the final batch but before completion.
            None => UploadSessionRepo::find_by_id(&state.pool, id, merchant.id)
                .await?
                .ok_or_else(|| session_not_found(id))?,
        }
    };

    tracing::info!(
        session_id = %id,
        processed = session.processed_rows,
        successful = session.successful_rows,
        failed = session.failed_rows,
        status = %session.status,
        "Upload processing finished"
    );

    Ok(Json(DataResponse::new(
        snapshot_with_errors(&state, session).await?,
    )))
}

/// Pull the uploaded file bytes out of the multipart body. Accepts the
/// first field named `file`, or the first field carrying a filename.
async fn read_file_field(multipart: &mut Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let is_file = field.name() == Some("file") || field.file_name().is_some();
        if !is_file {
            continue;
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        return Ok(data.to_vec());
    }
    Err(AppError::BadRequest(
        "Multipart body must contain a 'file' field".to_string(),
    ))
}

/// One-line human summary of a validation outcome, stored on the session.
fn summary_message(summary: &ValidationSummary) -> String {
    let types: Vec<&str> = summary
        .critical_issue_types
        .iter()
        .map(|t| t.as_str())
        .collect();
    if types.is_empty() {
        format!("{} warning(s)", summary.warning_count)
    } else {
        format!(
            "{} error(s), {} warning(s); issues: {}",
            summary.error_count,
            summary.warning_count,
            types.join(", ")
        )
    }
}

// ── Cancel / Retry ───────────────────────────────────────────────────

/// POST /api/v1/bulk-upload/sessions/{id}/cancel
///
/// Move an active session to 'failed'. Terminal sessions cannot be
/// cancelled; the ingestion loop observes the flip between batches.
pub async fn cancel_session(
    State(state): State<AppState>,
    merchant: Merchant,
    Path(id): Path<SessionId>,
) -> AppResult<Json<DataResponse<SessionSnapshot>>> {
    UploadSessionRepo::find_by_id(&state.pool, id, merchant.id)
        .await?
        .ok_or_else(|| session_not_found(id))?;

    let Some(session) = UploadSessionRepo::fail(&state.pool, id, "Cancelled by merchant").await?
    else {
        return Err(AppError::Core(CoreError::Conflict(
            "Session has already finished".into(),
        )));
    };

    tracing::info!(session_id = %id, merchant_id = merchant.id, "Session cancelled");

    Ok(Json(DataResponse::new(
        snapshot_with_errors(&state, session).await?,
    )))
}

/// POST /api/v1/bulk-upload/sessions/{id}/retry
///
/// Create a fresh session from a finished one, copying its file
/// metadata. The original session is left untouched.
pub async fn retry_session(
    State(state): State<AppState>,
    merchant: Merchant,
    Path(id): Path<SessionId>,
) -> AppResult<(StatusCode, Json<DataResponse<SessionSnapshot>>)> {
    let original = UploadSessionRepo::find_by_id(&state.pool, id, merchant.id)
        .await?
        .ok_or_else(|| session_not_found(id))?;

    let terminal = original.status().is_some_and(|s| s.is_terminal());
    if !terminal {
        return Err(AppError::Core(CoreError::Conflict(
            "Only finished sessions can be retried".into(),
        )));
    }

    let session = UploadSessionRepo::create(
        &state.pool,
        &CreateUploadSession {
            merchant_id: merchant.id,
            filename: original.filename,
            file_size_bytes: original.file_size_bytes,
            expected_rows: original.expected_rows,
        },
    )
    .await?;

    tracing::info!(
        session_id = %session.id,
        retried_from = %id,
        "Created retry session"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(SessionSnapshot::build(session, Vec::new()))),
    ))
}

// ── History ──────────────────────────────────────────────────────────

/// Paginated history listing response.
#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub sessions: Vec<SessionSnapshot>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

/// GET /api/v1/bulk-upload/sessions
///
/// List a merchant's sessions, newest first, with optional status
/// filter and page/page_size pagination.
pub async fn list_history(
    State(state): State<AppState>,
    merchant: Merchant,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<DataResponse<HistoryPage>>> {
    let status = match params.status.as_deref() {
        Some(raw) => {
            let parsed = SessionStatus::from_str(raw).ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Unknown status '{raw}'. Expected one of: {}",
                    SessionStatus::ALL.join(", ")
                ))
            })?;
            Some(parsed)
        }
        None => None,
    };
    let status_name = status.map(|s| s.as_str());

    let page = clamp_page(params.page);
    let page_size = clamp_page_size(params.page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = page_offset(page, page_size);

    let sessions = UploadSessionRepo::list_by_merchant(
        &state.pool,
        merchant.id,
        status_name,
        page_size,
        offset,
    )
    .await?;
    let total = UploadSessionRepo::count_by_merchant(&state.pool, merchant.id, status_name).await?;

    let sessions = sessions
        .into_iter()
        .map(|s| SessionSnapshot::build(s, Vec::new()))
        .collect();

    Ok(Json(DataResponse::new(HistoryPage {
        sessions,
        page,
        page_size,
        total,
    })))
}

// ── Error Export ─────────────────────────────────────────────────────

/// Paginated error export response.
#[derive(Debug, Serialize)]
pub struct ErrorExport {
    pub errors: Vec<UploadRowError>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// GET /api/v1/bulk-upload/sessions/{id}/errors
///
/// Export the persisted row errors for a session, ascending by row
/// number, with limit/offset pagination.
pub async fn export_errors(
    State(state): State<AppState>,
    merchant: Merchant,
    Path(id): Path<SessionId>,
    Query(params): Query<ErrorExportParams>,
) -> AppResult<Json<DataResponse<ErrorExport>>> {
    UploadSessionRepo::find_by_id(&state.pool, id, merchant.id)
        .await?
        .ok_or_else(|| session_not_found(id))?;

    let limit = clamp_limit(params.limit, ERROR_EXPORT_DEFAULT_LIMIT, ERROR_EXPORT_MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let errors = RowErrorRepo::list_by_session(&state.pool, id, limit, offset).await?;
    let total = RowErrorRepo::count_by_session(&state.pool, id).await?;

    Ok(Json(DataResponse::new(ErrorExport {
        errors,
        total,
        limit,
        offset,
    })))
}

// ── Template ─────────────────────────────────────────────────────────

/// GET /api/v1/bulk-upload/template
///
/// Generate a CSV upload template and serve it as a file download.
pub async fn get_template(
    Query(params): Query<TemplateParams>,
) -> AppResult<impl IntoResponse> {
    let kind = match params.template_type.as_deref() {
        Some(raw) => TemplateKind::from_str(raw).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Unknown template_type '{raw}'. Expected basic, comprehensive, or variants-only"
            ))
        })?,
        None => TemplateKind::Basic,
    };

    let generated = template::generate(&TemplateOptions {
        kind,
        include_optional_fields: params.include_optional_fields,
        sample_data: params.sample_data,
    });

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", generated.filename),
            ),
        ],
        generated.content,
    ))
}
