//! Column schema and the strongly-typed parsed row.
//!
//! This module has zero external dependencies beyond serde. It provides
//! the fixed CSV column schema (required and optional headers, recognised
//! categories, field length limits) and [`ProductRow`], the typed
//! representation of one data row. Downstream consumers read named fields
//! instead of string-keyed records, so a misspelled column cannot be read
//! silently.

use serde::{Deserialize, Serialize};

// ── Column names ─────────────────────────────────────────────────────

pub const COL_PRODUCT_HANDLE: &str = "product_handle";
pub const COL_VARIANT_SKU: &str = "variant_sku";
pub const COL_STOCK_QUANTITY: &str = "variant_stock_quantity";
pub const COL_PRODUCT_NAME: &str = "product_name";
pub const COL_PRODUCT_DESCRIPTION: &str = "product_description";
pub const COL_PRODUCT_CATEGORY: &str = "product_category";
pub const COL_BASE_PRICE: &str = "base_price";
pub const COL_IMAGE_URL: &str = "image_url";
pub const COL_VARIANT_PRICE: &str = "variant_price";
pub const COL_VARIANT_IMAGE_URL: &str = "variant_image_url";
pub const COL_ATTR_1_NAME: &str = "variant_attribute_1_name";
pub const COL_ATTR_1_VALUE: &str = "variant_attribute_1_value";
pub const COL_ATTR_2_NAME: &str = "variant_attribute_2_name";
pub const COL_ATTR_2_VALUE: &str = "variant_attribute_2_value";
pub const COL_CASHBACK_PERCENTAGE: &str = "cashback_percentage";
pub const COL_IS_ACTIVE: &str = "is_active";

/// Headers that must be present for a file to be accepted.
pub const REQUIRED_HEADERS: &[&str] =
    &[COL_PRODUCT_HANDLE, COL_VARIANT_SKU, COL_STOCK_QUANTITY];

/// Recognised optional headers. Anything outside the union of required
/// and optional headers is flagged as unknown (warning) and ignored.
pub const OPTIONAL_HEADERS: &[&str] = &[
    COL_PRODUCT_NAME,
    COL_PRODUCT_DESCRIPTION,
    COL_PRODUCT_CATEGORY,
    COL_BASE_PRICE,
    COL_IMAGE_URL,
    COL_VARIANT_PRICE,
    COL_VARIANT_IMAGE_URL,
    COL_ATTR_1_NAME,
    COL_ATTR_1_VALUE,
    COL_ATTR_2_NAME,
    COL_ATTR_2_VALUE,
    COL_CASHBACK_PERCENTAGE,
    COL_IS_ACTIVE,
];

/// Categories the catalog recognises. Off-list categories are a warning,
/// not a rejection.
pub const PRODUCT_CATEGORIES: &[&str] = &[
    "Electronics",
    "Clothing",
    "Home & Garden",
    "Sports & Outdoors",
    "Health & Beauty",
    "Books & Media",
    "Toys & Games",
    "Automotive",
    "Food & Beverages",
    "Office Supplies",
];

// ── Field limits ─────────────────────────────────────────────────────

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LENGTH: usize = 255;

/// Maximum length of a product description.
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// Cashback percentage upper bound (inclusive).
pub const MAX_CASHBACK_PERCENTAGE: f64 = 99.99;

/// Returns `true` if `header` is a recognised column (required or optional).
pub fn is_known_header(header: &str) -> bool {
    REQUIRED_HEADERS.contains(&header) || OPTIONAL_HEADERS.contains(&header)
}

/// Parse an `is_active` cell. Accepts TRUE/FALSE/1/0/YES/NO,
/// case-insensitive. Returns `None` for anything else.
pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.to_ascii_uppercase().as_str() {
        "TRUE" | "1" | "YES" => Some(true),
        "FALSE" | "0" | "NO" => Some(false),
        _ => None,
    }
}

// ── Parsed row ───────────────────────────────────────────────────────

/// A named variant attribute pair (e.g. "Color" / "Red").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantAttribute {
    pub name: String,
    pub value: String,
}

/// One validated CSV data row.
///
/// Multiple rows sharing a `product_handle` are variants of one logical
/// product; by convention the first row with a populated `product_name`
/// is authoritative for the product-level fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    /// File row number (header row = 1, first data row = 2).
    pub row_number: usize,
    pub product_handle: String,
    pub variant_sku: String,
    pub stock_quantity: i64,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub product_category: Option<String>,
    pub base_price: Option<f64>,
    pub image_url: Option<String>,
    pub variant_price: Option<f64>,
    pub variant_image_url: Option<String>,
    pub attribute_1: Option<VariantAttribute>,
    pub attribute_2: Option<VariantAttribute>,
    pub cashback_percentage: Option<f64>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_headers_are_known() {
        for h in REQUIRED_HEADERS {
            assert!(is_known_header(h), "header: {h}");
        }
    }

    #[test]
    fn optional_headers_are_known() {
        for h in OPTIONAL_HEADERS {
            assert!(is_known_header(h), "header: {h}");
        }
    }

    #[test]
    fn unknown_header_is_not_known() {
        assert!(!is_known_header("colour"));
        assert!(!is_known_header(""));
    }

    #[test]
    fn boolean_accepted_forms() {
        for v in &["TRUE", "true", "1", "YES", "yes"] {
            assert_eq!(parse_boolean(v), Some(true), "value: {v}");
        }
        for v in &["FALSE", "false", "0", "NO", "no"] {
            assert_eq!(parse_boolean(v), Some(false), "value: {v}");
        }
    }

    #[test]
    fn boolean_rejects_everything_else() {
        assert_eq!(parse_boolean("maybe"), None);
        assert_eq!(parse_boolean("2"), None);
        assert_eq!(parse_boolean(""), None);
    }
}
