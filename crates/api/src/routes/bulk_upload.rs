//! Route definitions for bulk product upload sessions.
//!
//! Mounted at `/bulk-upload`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::bulk_upload;
use crate::state::AppState;

/// Routes mounted at `/bulk-upload`.
///
/// ```text
/// POST   /sessions               -> create_session
/// GET    /sessions               -> list_history
/// GET    /sessions/{id}          -> get_status
/// POST   /sessions/{id}/file     -> process_upload   (multipart)
/// POST   /sessions/{id}/cancel   -> cancel_session
/// POST   /sessions/{id}/retry    -> retry_session
/// GET    /sessions/{id}/errors   -> export_errors
/// GET    /template               -> get_template     (CSV download)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/sessions",
            post(bulk_upload::create_session).get(bulk_upload::list_history),
        )
        .route("/sessions/{id}", get(bulk_upload::get_status))
        .route("/sessions/{id}/file", post(bulk_upload::process_upload))
        .route("/sessions/{id}/cancel", post(bulk_upload::cancel_session))
        .route("/sessions/{id}/retry", post(bulk_upload::retry_session))
        .route("/sessions/{id}/errors", get(bulk_upload::export_errors))
        .route("/template", get(bulk_upload::get_template))
}
