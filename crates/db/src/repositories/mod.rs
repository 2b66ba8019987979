//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod row_error_repo;
pub mod upload_session_repo;

pub use row_error_repo::RowErrorRepo;
pub use upload_session_repo::UploadSessionRepo;
