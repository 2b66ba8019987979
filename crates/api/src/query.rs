//! Shared query parameter types for API handlers.
//!
//! Common query structs that appear across multiple handler modules are
//! extracted here to avoid duplication.

use serde::Deserialize;

/// Query parameters for the upload-history listing (`?page=&page_size=&status=`).
///
/// Page values are clamped in the handler via `clamp_page` / `clamp_page_size`.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    /// Optional status filter (`created`, `processing`, `completed`, `failed`).
    pub status: Option<String>,
}

/// Generic pagination parameters (`?limit=&offset=`) for the error export.
#[derive(Debug, Deserialize)]
pub struct ErrorExportParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for template generation.
#[derive(Debug, Deserialize)]
pub struct TemplateParams {
    /// Template tier (`basic`, `comprehensive`, `variants-only`). Default: `basic`.
    pub template_type: Option<String>,
    /// Include the optional column set in basic/variants-only templates.
    #[serde(default)]
    pub include_optional_fields: bool,
    /// Emit illustrative sample rows under the header.
    #[serde(default)]
    pub sample_data: bool,
}
