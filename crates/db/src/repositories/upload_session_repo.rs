//! Repository for bulk upload sessions.
//!
//! Status transitions are guarded in SQL (`WHERE status_id IN (...)`) so
//! the lifecycle only moves forward and terminal sessions are immutable,
//! regardless of interleaved requests. Progress updates are single
//! relative `UPDATE`s, so a status poll can never observe a torn write.

use sqlx::PgPool;
use taic_core::bulk_upload::session::SessionStatus;
use taic_core::types::{DbId, SessionId};
use uuid::Uuid;

use crate::models::upload_session::{CreateUploadSession, UploadSession};

/// Column list for `upload_sessions` queries. The status name is resolved
/// from the lookup table with a correlated subselect so the same list
/// works in both `SELECT` and `RETURNING` position.
const COLUMNS: &str = "id, merchant_id, \
     (SELECT st.name FROM upload_session_statuses st WHERE st.id = status_id) AS status, \
     filename, file_size_bytes, expected_rows, actual_rows, processed_rows, \
     successful_rows, failed_rows, error_summary, \
     created_at, started_at, completed_at, updated_at";

/// Provides CRUD operations and guarded lifecycle transitions for
/// upload sessions.
pub struct UploadSessionRepo;

impl UploadSessionRepo {
    /// Create a new session in 'created' status with a fresh UUIDv7 id.
    pub async fn create(
        pool: &PgPool,
        input: &CreateUploadSession,
    ) -> Result<UploadSession, sqlx::Error> {
        let sql = format!(
            "INSERT INTO upload_sessions \
                (id, merchant_id, status_id, filename, file_size_bytes, expected_rows) \
             VALUES ( \
                $1, $2, \
                (SELECT id FROM upload_session_statuses WHERE name = 'created'), \
                $3, $4, $5 \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UploadSession>(&sql)
            .bind(Uuid::now_v7())
            .bind(input.merchant_id)
            .bind(&input.filename)
            .bind(input.file_size_bytes)
            .bind(input.expected_rows)
            .fetch_one(pool)
            .await
    }

    /// Find a session by id, scoped to its owning merchant.
    pub async fn find_by_id(
        pool: &PgPool,
        id: SessionId,
        merchant_id: DbId,
    ) -> Result<Option<UploadSession>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM upload_sessions WHERE id = $1 AND merchant_id = $2"
        );
        sqlx::query_as::<_, UploadSession>(&sql)
            .bind(id)
            .bind(merchant_id)
            .fetch_optional(pool)
            .await
    }

    /// List a merchant's sessions, newest first, with an optional
    /// exact-match status filter.
    pub async fn list_by_merchant(
        pool: &PgPool,
        merchant_id: DbId,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UploadSession>, sqlx::Error> {
        match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM upload_sessions \
                     WHERE merchant_id = $1 \
                       AND status_id = (SELECT id FROM upload_session_statuses WHERE name = $2) \
                     ORDER BY created_at DESC \
                     LIMIT $3 OFFSET $4"
                );
                sqlx::query_as::<_, UploadSession>(&sql)
                    .bind(merchant_id)
                    .bind(status)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM upload_sessions \
                     WHERE merchant_id = $1 \
                     ORDER BY created_at DESC \
                     LIMIT $2 OFFSET $3"
                );
                sqlx::query_as::<_, UploadSession>(&sql)
                    .bind(merchant_id)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Total sessions for a merchant under the same filter as
    /// [`Self::list_by_merchant`].
    pub async fn count_by_merchant(
        pool: &PgPool,
        merchant_id: DbId,
        status: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        match status {
            Some(status) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM upload_sessions \
                     WHERE merchant_id = $1 \
                       AND status_id = (SELECT id FROM upload_session_statuses WHERE name = $2)",
                )
                .bind(merchant_id)
                .bind(status)
                .fetch_one(pool)
                .await
            }
            None => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM upload_sessions WHERE merchant_id = $1",
                )
                .bind(merchant_id)
                .fetch_one(pool)
                .await
            }
        }
    }

    /// created -> processing. Sets `started_at`. Returns `None` if the
    /// session was not in 'created' status (already started, cancelled,
    /// or terminal).
    pub async fn start_processing(
        pool: &PgPool,
        id: SessionId,
    ) -> Result<Option<UploadSession>, sqlx::Error> {
        Self::guarded_transition(
            pool,
            id,
            &[SessionStatus::Created],
            SessionStatus::Processing,
            None,
        )
        .await
    }

    /// processing -> completed.
    pub async fn complete(
        pool: &PgPool,
        id: SessionId,
        error_summary: Option<&str>,
    ) -> Result<Option<UploadSession>, sqlx::Error> {
        Self::guarded_transition(
            pool,
            id,
            &[SessionStatus::Processing],
            SessionStatus::Completed,
            error_summary,
        )
        .await
    }

    /// created|processing -> failed. Used for fatal errors and for
    /// cancellation requests.
    pub async fn fail(
        pool: &PgPool,
        id: SessionId,
        error_summary: &str,
    ) -> Result<Option<UploadSession>, sqlx::Error> {
        Self::guarded_transition(
            pool,
            id,
            &[SessionStatus::Created, SessionStatus::Processing],
            SessionStatus::Failed,
            Some(error_summary),
        )
        .await
    }

    /// Record the server-confirmed data row count once the header parses.
    pub async fn set_actual_rows(
        pool: &PgPool,
        id: SessionId,
        actual_rows: i32,
    ) -> Result<Option<UploadSession>, sqlx::Error> {
        let sql = format!(
            "UPDATE upload_sessions SET actual_rows = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UploadSession>(&sql)
            .bind(id)
            .bind(actual_rows)
            .fetch_optional(pool)
            .await
    }

    /// Atomically advance the row counters by the given deltas.
    ///
    /// Only applies while the session is 'processing'; returns `None`
    /// once the session has been cancelled or finished, which the
    /// ingestion loop uses as its between-batch cancellation check.
    pub async fn record_progress(
        pool: &PgPool,
        id: SessionId,
        processed: i32,
        successful: i32,
        failed: i32,
    ) -> Result<Option<UploadSession>, sqlx::Error> {
        let sql = format!(
            "UPDATE upload_sessions SET \
                processed_rows = processed_rows + $2, \
                successful_rows = successful_rows + $3, \
                failed_rows = failed_rows + $4, \
                updated_at = now() \
             WHERE id = $1 \
               AND status_id = (SELECT id FROM upload_session_statuses WHERE name = 'processing') \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UploadSession>(&sql)
            .bind(id)
            .bind(processed)
            .bind(successful)
            .bind(failed)
            .fetch_optional(pool)
            .await
    }

    /// Guarded status transition: the update only lands if the current
    /// status is in `from`, making terminal states immutable.
    async fn guarded_transition(
        pool: &PgPool,
        id: SessionId,
        from: &[SessionStatus],
        to: SessionStatus,
        error_summary: Option<&str>,
    ) -> Result<Option<UploadSession>, sqlx::Error> {
        let from_names: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
        let sql = format!(
            "UPDATE upload_sessions SET \
                status_id = (SELECT id FROM upload_session_statuses WHERE name = $2), \
                started_at = CASE WHEN $2 = 'processing' THEN now() ELSE started_at END, \
                completed_at = CASE WHEN $2 IN ('completed', 'failed') THEN now() \
                               ELSE completed_at END, \
                error_summary = COALESCE($3, error_summary), \
                updated_at = now() \
             WHERE id = $1 \
               AND status_id IN (SELECT id FROM upload_session_statuses WHERE name = ANY($4)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UploadSession>(&sql)
            .bind(id)
            .bind(to.as_str())
            .bind(error_summary)
            .bind(&from_names)
            .fetch_optional(pool)
            .await
    }
}
