pub mod bulk_upload;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /bulk-upload/sessions                 create, list history
/// /bulk-upload/sessions/{id}            status snapshot
/// /bulk-upload/sessions/{id}/file       upload + validate + ingest
/// /bulk-upload/sessions/{id}/cancel     cancel an active session
/// /bulk-upload/sessions/{id}/retry      new session from a finished one
/// /bulk-upload/sessions/{id}/errors     row error export
/// /bulk-upload/template                 CSV template download
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/bulk-upload", bulk_upload::router())
}
