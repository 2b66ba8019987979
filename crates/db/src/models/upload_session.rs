//! Models for bulk upload sessions.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use taic_core::bulk_upload::session::SessionStatus;
use taic_core::types::{DbId, SessionId, Timestamp};

/// A row from the `upload_sessions` table.
///
/// `status` is the resolved status name from the `upload_session_statuses`
/// lookup table, selected alongside the session columns.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UploadSession {
    pub id: SessionId,
    pub merchant_id: DbId,
    pub status: String,
    pub filename: String,
    pub file_size_bytes: i64,
    pub expected_rows: i32,
    pub actual_rows: i32,
    pub processed_rows: i32,
    pub successful_rows: i32,
    pub failed_rows: i32,
    pub error_summary: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl UploadSession {
    /// The typed lifecycle status. `None` only if the database holds a
    /// name outside the seeded set, which the schema prevents.
    pub fn status(&self) -> Option<SessionStatus> {
        SessionStatus::from_str(&self.status)
    }
}

/// DTO for creating a new upload session.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUploadSession {
    pub merchant_id: DbId,
    pub filename: String,
    pub file_size_bytes: i64,
    pub expected_rows: i32,
}
