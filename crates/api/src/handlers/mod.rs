//! Request handlers for the bulk product ingestion API.
//!
//! Handlers delegate to `taic_core` for validation/template logic and to
//! the repositories in `taic_db` for persistence, mapping errors via
//! [`crate::error::AppError`].

pub mod bulk_upload;
