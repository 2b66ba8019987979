//! Repository for persisted row-level upload errors.

use sqlx::PgPool;
use taic_core::types::SessionId;

use crate::models::row_error::{CreateUploadRowError, UploadRowError};

/// Column list for `upload_row_errors` queries.
const COLUMNS: &str = "id, session_id, row_number, error_type, field_name, \
     raw_value, severity, message, created_at";

/// Provides insert and listing operations for upload row errors.
pub struct RowErrorRepo;

impl RowErrorRepo {
    /// Insert a batch of row errors for a session.
    pub async fn batch_insert(
        pool: &PgPool,
        session_id: SessionId,
        errors: &[CreateUploadRowError],
    ) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;
        for err in errors {
            sqlx::query(
                "INSERT INTO upload_row_errors \
                    (session_id, row_number, error_type, field_name, raw_value, severity, message) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(session_id)
            .bind(err.row_number)
            .bind(&err.error_type)
            .bind(&err.field_name)
            .bind(&err.raw_value)
            .bind(&err.severity)
            .bind(&err.message)
            .execute(pool)
            .await?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// The most recently recorded errors for a session, newest first.
    /// Used for the bounded quick-feedback list in status snapshots.
    pub async fn list_recent(
        pool: &PgPool,
        session_id: SessionId,
        limit: i64,
    ) -> Result<Vec<UploadRowError>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM upload_row_errors \
             WHERE session_id = $1 ORDER BY id DESC LIMIT $2"
        );
        sqlx::query_as::<_, UploadRowError>(&sql)
            .bind(session_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Full error export for a session, in source-file order.
    pub async fn list_by_session(
        pool: &PgPool,
        session_id: SessionId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UploadRowError>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM upload_row_errors \
             WHERE session_id = $1 ORDER BY row_number, id \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, UploadRowError>(&sql)
            .bind(session_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Total persisted errors for a session.
    pub async fn count_by_session(
        pool: &PgPool,
        session_id: SessionId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM upload_row_errors WHERE session_id = $1")
            .bind(session_id)
            .fetch_one(pool)
            .await
    }
}
