//! Bulk product upload domain logic.
//!
//! Pure types and functions for the merchant-facing CSV bulk upload
//! pipeline: the parsed row representation, the file validator and its
//! error taxonomy, the downloadable template generator, and the upload
//! session state machine with its derived progress math.

pub mod row;
pub mod session;
pub mod template;
pub mod validate;
