//! Downloadable CSV template generator.
//!
//! Produces a header row (and optionally illustrative sample rows)
//! matching the validator's column schema, so merchants can author
//! conforming files. Emission goes through [`crate::csv::render_line`],
//! which applies the same quote-doubling convention the parser reads.

use serde::{Deserialize, Serialize};

use super::row::{self};
use crate::csv;

// ── Template tiers ───────────────────────────────────────────────────

/// Which column set a template carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    /// Required columns plus core product fields.
    Basic,
    /// Every recognised column.
    Comprehensive,
    /// Required columns plus variant-level fields only.
    VariantsOnly,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Comprehensive => "comprehensive",
            Self::VariantsOnly => "variants-only",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "basic" => Some(Self::Basic),
            "comprehensive" => Some(Self::Comprehensive),
            "variants-only" => Some(Self::VariantsOnly),
            _ => None,
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options selecting what the generated template contains.
#[derive(Debug, Clone, Copy)]
pub struct TemplateOptions {
    pub kind: TemplateKind,
    /// Append image/cashback/active columns to non-comprehensive tiers.
    pub include_optional_fields: bool,
    /// Emit illustrative sample rows after the header.
    pub sample_data: bool,
}

/// A rendered template ready to serve.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedTemplate {
    pub filename: String,
    pub content: String,
}

/// Extra columns appended when `include_optional_fields` is set on a tier
/// that does not already carry them.
const OPTIONAL_EXTRAS: &[&str] = &[
    row::COL_IMAGE_URL,
    row::COL_CASHBACK_PERCENTAGE,
    row::COL_IS_ACTIVE,
];

/// Resolve the ordered column list for the given options.
///
/// Required columns always lead; tier columns follow in a fixed order;
/// optional extras are appended last, skipping duplicates.
pub fn resolve_columns(options: &TemplateOptions) -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = row::REQUIRED_HEADERS.to_vec();

    match options.kind {
        TemplateKind::Basic => {
            columns.extend([
                row::COL_PRODUCT_NAME,
                row::COL_PRODUCT_DESCRIPTION,
                row::COL_BASE_PRICE,
                row::COL_PRODUCT_CATEGORY,
            ]);
        }
        TemplateKind::Comprehensive => {
            columns.extend([
                row::COL_PRODUCT_NAME,
                row::COL_PRODUCT_DESCRIPTION,
                row::COL_BASE_PRICE,
                row::COL_PRODUCT_CATEGORY,
                row::COL_IMAGE_URL,
                row::COL_VARIANT_PRICE,
                row::COL_VARIANT_IMAGE_URL,
                row::COL_ATTR_1_NAME,
                row::COL_ATTR_1_VALUE,
                row::COL_ATTR_2_NAME,
                row::COL_ATTR_2_VALUE,
                row::COL_CASHBACK_PERCENTAGE,
                row::COL_IS_ACTIVE,
            ]);
        }
        TemplateKind::VariantsOnly => {
            columns.extend([
                row::COL_VARIANT_PRICE,
                row::COL_VARIANT_IMAGE_URL,
                row::COL_ATTR_1_NAME,
                row::COL_ATTR_1_VALUE,
                row::COL_ATTR_2_NAME,
                row::COL_ATTR_2_VALUE,
            ]);
        }
    }

    if options.include_optional_fields && options.kind != TemplateKind::Comprehensive {
        for extra in OPTIONAL_EXTRAS.iter().copied() {
            if !columns.contains(&extra) {
                columns.push(extra);
            }
        }
    }

    columns
}

/// Generate the template CSV and its suggested filename.
pub fn generate(options: &TemplateOptions) -> GeneratedTemplate {
    let columns = resolve_columns(options);
    let mut content = csv::render_line(&columns);
    content.push('\n');

    if options.sample_data {
        for variant in 0..SAMPLE_VARIANT_COUNT {
            let fields: Vec<String> = columns
                .iter()
                .map(|col| sample_value(col, variant).to_string())
                .collect();
            content.push_str(&csv::render_line(&fields));
            content.push('\n');
        }
    }

    GeneratedTemplate {
        filename: format!("product_upload_template_{}.csv", options.kind),
        content,
    }
}

/// Number of sample variant rows emitted (two variants of one product).
const SAMPLE_VARIANT_COUNT: usize = 2;

/// Sample cell for a column.
///
/// The two rows share a product handle; only the first carries the
/// product-level fields, matching the first-row-authoritative variant
/// convention the validator accepts without warnings.
fn sample_value(column: &str, variant: usize) -> &'static str {
    let first = variant == 0;
    match column {
        row::COL_PRODUCT_HANDLE => "wireless-headphones",
        row::COL_VARIANT_SKU => {
            if first {
                "WH-001-BLK"
            } else {
                "WH-001-WHT"
            }
        }
        row::COL_STOCK_QUANTITY => {
            if first {
                "50"
            } else {
                "25"
            }
        }
        row::COL_PRODUCT_NAME => {
            if first {
                "Wireless Headphones"
            } else {
                ""
            }
        }
        row::COL_PRODUCT_DESCRIPTION => {
            if first {
                "Over-ear wireless headphones, 30h battery"
            } else {
                ""
            }
        }
        row::COL_BASE_PRICE => {
            if first {
                "79.99"
            } else {
                ""
            }
        }
        row::COL_PRODUCT_CATEGORY => {
            if first {
                "Electronics"
            } else {
                ""
            }
        }
        row::COL_IMAGE_URL => {
            if first {
                "https://cdn.example.com/wh-001.jpg"
            } else {
                ""
            }
        }
        row::COL_VARIANT_PRICE => {
            if first {
                "79.99"
            } else {
                "84.99"
            }
        }
        row::COL_VARIANT_IMAGE_URL => {
            if first {
                "https://cdn.example.com/wh-001-blk.jpg"
            } else {
                "https://cdn.example.com/wh-001-wht.jpg"
            }
        }
        row::COL_ATTR_1_NAME => "Color",
        row::COL_ATTR_1_VALUE => {
            if first {
                "Black"
            } else {
                "White"
            }
        }
        row::COL_ATTR_2_NAME => "Connectivity",
        row::COL_ATTR_2_VALUE => "Bluetooth 5.3",
        row::COL_CASHBACK_PERCENTAGE => {
            if first {
                "2.5"
            } else {
                ""
            }
        }
        row::COL_IS_ACTIVE => "TRUE",
        _ => "",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
