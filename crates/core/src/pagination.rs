//! Pagination clamping helpers shared by list endpoints.

/// Default page size for session history listings.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size for session history listings.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp a user-provided page size to `1..=max`.
pub fn clamp_page_size(page_size: Option<i64>, default: i64, max: i64) -> i64 {
    page_size.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided 1-indexed page number to at least 1.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// Convert a clamped (page, page_size) pair into a SQL offset.
pub fn page_offset(page: i64, page_size: i64) -> i64 {
    (page - 1) * page_size
}

/// Clamp a user-provided limit to `1..=max` (for limit/offset endpoints).
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to at least 0.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
