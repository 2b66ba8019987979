//! Models for persisted row-level upload errors.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use taic_core::bulk_upload::validate::ValidationError;
use taic_core::types::{DbId, SessionId, Timestamp};

/// A row from the `upload_row_errors` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UploadRowError {
    pub id: DbId,
    pub session_id: SessionId,
    pub row_number: i32,
    pub error_type: String,
    pub field_name: Option<String>,
    pub raw_value: Option<String>,
    pub severity: String,
    pub message: String,
    pub created_at: Timestamp,
}

/// DTO for inserting a row error.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUploadRowError {
    pub row_number: i32,
    pub error_type: String,
    pub field_name: Option<String>,
    pub raw_value: Option<String>,
    pub severity: String,
    pub message: String,
}

impl CreateUploadRowError {
    /// Build an insert DTO from a validator diagnostic.
    pub fn from_validation(err: &ValidationError) -> Self {
        Self {
            row_number: err.row_number as i32,
            error_type: err.error_type.as_str().to_string(),
            field_name: err.field.clone(),
            raw_value: err.value.clone(),
            severity: err.severity.as_str().to_string(),
            message: err.message.clone(),
        }
    }
}
