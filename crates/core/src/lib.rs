//! Pure domain logic for the TAIC bulk product ingestion service.
//!
//! This crate has no database, async, or I/O dependencies. It provides:
//!
//! - CSV line parsing and escaping ([`csv`])
//! - The bulk-upload row validator, error taxonomy, template generator,
//!   and upload-session state machine ([`bulk_upload`])
//! - Shared id/timestamp aliases ([`types`]) and pagination clamping
//!   ([`pagination`])

pub mod bulk_upload;
pub mod csv;
pub mod error;
pub mod pagination;
pub mod types;
