//! Row structs (`sqlx::FromRow`) and create DTOs.

pub mod row_error;
pub mod upload_session;
