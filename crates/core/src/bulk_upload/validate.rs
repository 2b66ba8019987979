//! CSV file validator for bulk product uploads.
//!
//! A single pass over the file accumulates every diagnostic; validation
//! never short-circuits on the first bad row and never returns an `Err` to
//! the caller. Structural problems (empty file, undecodable bytes, missing
//! headers) and data-quality problems share one result shape,
//! [`FileValidation`], so callers always receive a structured result.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::row::{
    self, ProductRow, VariantAttribute, MAX_CASHBACK_PERCENTAGE, MAX_DESCRIPTION_LENGTH,
    MAX_PRODUCT_NAME_LENGTH, REQUIRED_HEADERS,
};
use crate::csv;

// ── Bounds ───────────────────────────────────────────────────────────

/// Maximum accepted upload size. The whole file is held in memory while
/// validating, so the bound is enforced before parsing.
pub const MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Maximum number of data rows per upload.
pub const MAX_DATA_ROWS: usize = 50_000;

/// Upper bound on distinct critical issue types surfaced in a summary.
pub const MAX_CRITICAL_ISSUE_TYPES: usize = 5;

// ── Severity ─────────────────────────────────────────────────────────

/// Whether a diagnostic blocks ingestion of its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Error taxonomy ───────────────────────────────────────────────────

/// Fixed taxonomy of validation diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BulkUploadErrorType {
    EmptyFile,
    FileTooLarge,
    TooManyRows,
    MissingHeaders,
    UnknownHeaders,
    MissingProductHandle,
    InvalidProductHandle,
    MissingVariantSku,
    MissingStockQuantity,
    InvalidStockQuantity,
    InvalidPrice,
    InvalidVariantPrice,
    InvalidCategory,
    InvalidCashback,
    InvalidImageUrl,
    InvalidVariantImageUrl,
    InvalidBoolean,
    ProductNameTooLong,
    DescriptionTooLong,
    AmbiguousProductMetadata,
    ParseError,
}

impl BulkUploadErrorType {
    /// Return the taxonomy name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyFile => "EMPTY_FILE",
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::TooManyRows => "TOO_MANY_ROWS",
            Self::MissingHeaders => "MISSING_HEADERS",
            Self::UnknownHeaders => "UNKNOWN_HEADERS",
            Self::MissingProductHandle => "MISSING_PRODUCT_HANDLE",
            Self::InvalidProductHandle => "INVALID_PRODUCT_HANDLE",
            Self::MissingVariantSku => "MISSING_VARIANT_SKU",
            Self::MissingStockQuantity => "MISSING_STOCK_QUANTITY",
            Self::InvalidStockQuantity => "INVALID_STOCK_QUANTITY",
            Self::InvalidPrice => "INVALID_PRICE",
            Self::InvalidVariantPrice => "INVALID_VARIANT_PRICE",
            Self::InvalidCategory => "INVALID_CATEGORY",
            Self::InvalidCashback => "INVALID_CASHBACK",
            Self::InvalidImageUrl => "INVALID_IMAGE_URL",
            Self::InvalidVariantImageUrl => "INVALID_VARIANT_IMAGE_URL",
            Self::InvalidBoolean => "INVALID_BOOLEAN",
            Self::ProductNameTooLong => "PRODUCT_NAME_TOO_LONG",
            Self::DescriptionTooLong => "DESCRIPTION_TOO_LONG",
            Self::AmbiguousProductMetadata => "AMBIGUOUS_PRODUCT_METADATA",
            Self::ParseError => "PARSE_ERROR",
        }
    }

    /// Parse a taxonomy name. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// All taxonomy members.
    pub const ALL: &'static [Self] = &[
        Self::EmptyFile,
        Self::FileTooLarge,
        Self::TooManyRows,
        Self::MissingHeaders,
        Self::UnknownHeaders,
        Self::MissingProductHandle,
        Self::InvalidProductHandle,
        Self::MissingVariantSku,
        Self::MissingStockQuantity,
        Self::InvalidStockQuantity,
        Self::InvalidPrice,
        Self::InvalidVariantPrice,
        Self::InvalidCategory,
        Self::InvalidCashback,
        Self::InvalidImageUrl,
        Self::InvalidVariantImageUrl,
        Self::InvalidBoolean,
        Self::ProductNameTooLong,
        Self::DescriptionTooLong,
        Self::AmbiguousProductMetadata,
        Self::ParseError,
    ];
}

impl std::fmt::Display for BulkUploadErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Diagnostics ──────────────────────────────────────────────────────

/// One detected problem in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// File row number. 0 = header-level problem, first data row = 2.
    pub row_number: usize,
    pub error_type: BulkUploadErrorType,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub severity: Severity,
}

/// The outcome of validating one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileValidation {
    /// True iff no diagnostic carries `error` severity.
    pub is_valid: bool,
    /// All diagnostics, ascending by row number.
    pub errors: Vec<ValidationError>,
    /// Number of data rows found (header excluded).
    pub row_count: usize,
    /// Rows that carry no `error`-severity diagnostic, in file order.
    pub rows: Vec<ProductRow>,
}

/// Grouped counts for quick client display.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    /// Distinct error-severity types, first-occurrence order, bounded by
    /// [`MAX_CRITICAL_ISSUE_TYPES`].
    pub critical_issue_types: Vec<BulkUploadErrorType>,
}

impl FileValidation {
    /// Build the summary view of this result.
    pub fn summary(&self) -> ValidationSummary {
        let mut error_count = 0;
        let mut warning_count = 0;
        let mut info_count = 0;
        let mut critical: Vec<BulkUploadErrorType> = Vec::new();

        for err in &self.errors {
            match err.severity {
                Severity::Error => {
                    error_count += 1;
                    if critical.len() < MAX_CRITICAL_ISSUE_TYPES && !critical.contains(&err.error_type)
                    {
                        critical.push(err.error_type);
                    }
                }
                Severity::Warning => warning_count += 1,
                Severity::Info => info_count += 1,
            }
        }

        ValidationSummary {
            error_count,
            warning_count,
            info_count,
            critical_issue_types: critical,
        }
    }

    /// A result containing exactly one structural error.
    fn structural(error_type: BulkUploadErrorType, message: String) -> Self {
        Self {
            is_valid: false,
            errors: vec![ValidationError {
                row_number: 0,
                error_type,
                message,
                field: None,
                value: None,
                severity: Severity::Error,
            }],
            row_count: 0,
            rows: Vec::new(),
        }
    }
}

// ── Validation ───────────────────────────────────────────────────────

/// Validate raw upload bytes.
///
/// Degrades undecodable input to a single `PARSE_ERROR` result instead of
/// returning an error; the caller always gets a [`FileValidation`].
pub fn validate_bytes(bytes: &[u8]) -> FileValidation {
    if bytes.len() > MAX_FILE_SIZE_BYTES {
        return FileValidation::structural(
            BulkUploadErrorType::FileTooLarge,
            format!(
                "File is {} bytes; the maximum accepted size is {} bytes",
                bytes.len(),
                MAX_FILE_SIZE_BYTES
            ),
        );
    }
    match std::str::from_utf8(bytes) {
        Ok(content) => validate_file(content),
        Err(e) => FileValidation::structural(
            BulkUploadErrorType::ParseError,
            format!("File is not valid UTF-8 text: {e}"),
        ),
    }
}

/// Validate decoded file content in one pass.
pub fn validate_file(content: &str) -> FileValidation {
    let lines = csv::split_lines(content);

    if lines.is_empty() {
        return FileValidation::structural(
            BulkUploadErrorType::EmptyFile,
            "File contains no data".to_string(),
        );
    }

    let mut errors: Vec<ValidationError> = Vec::new();

    // Header row.
    let headers = csv::parse_line(lines[0]);
    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .copied()
        .filter(|req| !headers.iter().any(|h| h == req))
        .collect();
    if !missing.is_empty() {
        return FileValidation::structural(
            BulkUploadErrorType::MissingHeaders,
            format!("Missing required headers: {}", missing.join(", ")),
        );
    }
    for header in &headers {
        if !header.is_empty() && !row::is_known_header(header) {
            errors.push(ValidationError {
                row_number: 0,
                error_type: BulkUploadErrorType::UnknownHeaders,
                message: format!("Unknown header '{header}' will be ignored"),
                field: Some(header.clone()),
                value: None,
                severity: Severity::Warning,
            });
        }
    }

    let data_lines = &lines[1..];
    if data_lines.len() > MAX_DATA_ROWS {
        return FileValidation::structural(
            BulkUploadErrorType::TooManyRows,
            format!(
                "File has {} data rows; the maximum accepted is {MAX_DATA_ROWS}",
                data_lines.len()
            ),
        );
    }

    // Column name -> position. First occurrence wins for duplicates.
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (pos, header) in headers.iter().enumerate() {
        if row::is_known_header(header) {
            index.entry(header.as_str()).or_insert(pos);
        }
    }

    // [A-Za-z0-9_-]+ is a constant pattern; compiling cannot fail.
    let handle_re = Regex::new(r"^[A-Za-z0-9_-]+$").expect("static handle pattern");

    let mut rows: Vec<ProductRow> = Vec::new();
    // handle -> (first data row number, rows with a populated product_name)
    let mut name_rows_by_handle: HashMap<String, (usize, usize)> = HashMap::new();
    let has_name_column = index.contains_key(row::COL_PRODUCT_NAME);

    for (i, line) in data_lines.iter().enumerate() {
        // Header is file row 1, so the first data row is 2.
        let row_number = i + 2;
        let fields = csv::parse_line(line);
        let before = errors.len();

        let row = validate_row(row_number, &fields, &index, &handle_re, &mut errors);

        if !row.product_handle.is_empty() && has_name_column {
            let entry = name_rows_by_handle
                .entry(row.product_handle.clone())
                .or_insert((row_number, 0));
            if row.product_name.is_some() {
                entry.1 += 1;
            }
        }

        let row_has_error = errors[before..].iter().any(|e| e.severity == Severity::Error);
        if !row_has_error {
            rows.push(row);
        }
    }

    // Variant grouping convention: exactly one row per handle should carry
    // the product-level metadata. Either zero or several is accepted but
    // flagged (loose coupling with the template generator).
    let mut ambiguous: Vec<(usize, String, usize)> = name_rows_by_handle
        .into_iter()
        .filter(|(_, (_, named))| *named != 1)
        .map(|(handle, (first_row, named))| (first_row, handle, named))
        .collect();
    ambiguous.sort();
    for (first_row, handle, named) in ambiguous {
        let detail = if named == 0 {
            "no row".to_string()
        } else {
            format!("{named} rows")
        };
        errors.push(ValidationError {
            row_number: first_row,
            error_type: BulkUploadErrorType::AmbiguousProductMetadata,
            message: format!(
                "Product '{handle}' has {detail} with a populated product_name; \
                 expected exactly one"
            ),
            field: Some(row::COL_PRODUCT_NAME.to_string()),
            value: Some(handle),
            severity: Severity::Warning,
        });
    }

    // Diagnostics read top-to-bottom matching the source file.
    errors.sort_by_key(|e| e.row_number);

    FileValidation {
        is_valid: !errors.iter().any(|e| e.severity == Severity::Error),
        errors,
        row_count: data_lines.len(),
        rows,
    }
}

/// Validate one data row, pushing diagnostics and returning the typed row.
fn validate_row(
    row_number: usize,
    fields: &[String],
    index: &HashMap<&str, usize>,
    handle_re: &Regex,
    errors: &mut Vec<ValidationError>,
) -> ProductRow {
    let cell = |name: &str| -> &str {
        index
            .get(name)
            .and_then(|pos| fields.get(*pos))
            .map(String::as_str)
            .unwrap_or("")
    };
    let optional = |name: &str| -> Option<String> {
        let v = cell(name);
        (!v.is_empty()).then(|| v.to_string())
    };
    // Product handle: required, constrained charset.
    let handle = cell(row::COL_PRODUCT_HANDLE);
    if handle.is_empty() {
        push_field_error(
            errors,
            row_number,
            BulkUploadErrorType::MissingProductHandle,
            "product_handle is required".to_string(),
            row::COL_PRODUCT_HANDLE,
            handle,
            Severity::Error,
        );
    } else if !handle_re.is_match(handle) {
        push_field_error(
            errors,
            row_number,
            BulkUploadErrorType::InvalidProductHandle,
            format!("product_handle '{handle}' may only contain letters, digits, '_' and '-'"),
            row::COL_PRODUCT_HANDLE,
            handle,
            Severity::Error,
        );
    }

    // Variant SKU: required.
    let sku = cell(row::COL_VARIANT_SKU);
    if sku.is_empty() {
        push_field_error(
            errors,
            row_number,
            BulkUploadErrorType::MissingVariantSku,
            "variant_sku is required".to_string(),
            row::COL_VARIANT_SKU,
            sku,
            Severity::Error,
        );
    }

    // Stock quantity: required, integer >= 0.
    let stock_raw = cell(row::COL_STOCK_QUANTITY);
    let stock_quantity = if stock_raw.is_empty() {
        push_field_error(
            errors,
            row_number,
            BulkUploadErrorType::MissingStockQuantity,
            "variant_stock_quantity is required".to_string(),
            row::COL_STOCK_QUANTITY,
            stock_raw,
            Severity::Error,
        );
        0
    } else {
        match stock_raw.parse::<i64>() {
            Ok(n) if n >= 0 => n,
            _ => {
                push_field_error(
                    errors,
                    row_number,
                    BulkUploadErrorType::InvalidStockQuantity,
                    format!("variant_stock_quantity '{stock_raw}' must be an integer >= 0"),
                    row::COL_STOCK_QUANTITY,
                    stock_raw,
                    Severity::Error,
                );
                0
            }
        }
    };

    let base_price = validate_price(
        row_number,
        cell(row::COL_BASE_PRICE),
        row::COL_BASE_PRICE,
        BulkUploadErrorType::InvalidPrice,
        errors,
    );
    let variant_price = validate_price(
        row_number,
        cell(row::COL_VARIANT_PRICE),
        row::COL_VARIANT_PRICE,
        BulkUploadErrorType::InvalidVariantPrice,
        errors,
    );

    // Category: off-list values are a warning, the row still ingests.
    let category = optional(row::COL_PRODUCT_CATEGORY);
    if let Some(cat) = &category {
        if !row::PRODUCT_CATEGORIES.contains(&cat.as_str()) {
            push_field_error(
                errors,
                row_number,
                BulkUploadErrorType::InvalidCategory,
                format!("product_category '{cat}' is not a recognised category"),
                row::COL_PRODUCT_CATEGORY,
                cat,
                Severity::Warning,
            );
        }
    }

    // Cashback: numeric, 0..=99.99.
    let cashback_raw = cell(row::COL_CASHBACK_PERCENTAGE);
    let cashback_percentage = if cashback_raw.is_empty() {
        None
    } else {
        match cashback_raw.parse::<f64>() {
            Ok(v) if v.is_finite() && (0.0..=MAX_CASHBACK_PERCENTAGE).contains(&v) => Some(v),
            _ => {
                push_field_error(
                    errors,
                    row_number,
                    BulkUploadErrorType::InvalidCashback,
                    format!(
                        "cashback_percentage '{cashback_raw}' must be a number between 0 and {MAX_CASHBACK_PERCENTAGE}"
                    ),
                    row::COL_CASHBACK_PERCENTAGE,
                    cashback_raw,
                    Severity::Error,
                );
                None
            }
        }
    };

    // Image URLs: malformed values are a warning, not a rejection.
    let image_url = validate_url(
        row_number,
        cell(row::COL_IMAGE_URL),
        row::COL_IMAGE_URL,
        BulkUploadErrorType::InvalidImageUrl,
        errors,
    );
    let variant_image_url = validate_url(
        row_number,
        cell(row::COL_VARIANT_IMAGE_URL),
        row::COL_VARIANT_IMAGE_URL,
        BulkUploadErrorType::InvalidVariantImageUrl,
        errors,
    );

    // is_active flag.
    let active_raw = cell(row::COL_IS_ACTIVE);
    let is_active = if active_raw.is_empty() {
        None
    } else {
        match row::parse_boolean(active_raw) {
            Some(b) => Some(b),
            None => {
                push_field_error(
                    errors,
                    row_number,
                    BulkUploadErrorType::InvalidBoolean,
                    format!("is_active '{active_raw}' must be one of TRUE, FALSE, 1, 0, YES, NO"),
                    row::COL_IS_ACTIVE,
                    active_raw,
                    Severity::Error,
                );
                None
            }
        }
    };

    // Length limits.
    let product_name = optional(row::COL_PRODUCT_NAME);
    if let Some(name) = &product_name {
        if name.chars().count() > MAX_PRODUCT_NAME_LENGTH {
            push_field_error(
                errors,
                row_number,
                BulkUploadErrorType::ProductNameTooLong,
                format!("product_name exceeds {MAX_PRODUCT_NAME_LENGTH} characters"),
                row::COL_PRODUCT_NAME,
                name,
                Severity::Error,
            );
        }
    }
    let product_description = optional(row::COL_PRODUCT_DESCRIPTION);
    if let Some(desc) = &product_description {
        if desc.chars().count() > MAX_DESCRIPTION_LENGTH {
            push_field_error(
                errors,
                row_number,
                BulkUploadErrorType::DescriptionTooLong,
                format!("product_description exceeds {MAX_DESCRIPTION_LENGTH} characters"),
                row::COL_PRODUCT_DESCRIPTION,
                "",
                Severity::Warning,
            );
        }
    }

    ProductRow {
        row_number,
        product_handle: handle.to_string(),
        variant_sku: sku.to_string(),
        stock_quantity,
        product_name,
        product_description,
        product_category: category,
        base_price,
        image_url,
        variant_price,
        variant_image_url,
        attribute_1: attribute_pair(
            optional(row::COL_ATTR_1_NAME),
            optional(row::COL_ATTR_1_VALUE),
        ),
        attribute_2: attribute_pair(
            optional(row::COL_ATTR_2_NAME),
            optional(row::COL_ATTR_2_VALUE),
        ),
        cashback_percentage,
        is_active,
    }
}

#[allow(clippy::too_many_arguments)]
fn push_field_error(
    errors: &mut Vec<ValidationError>,
    row_number: usize,
    error_type: BulkUploadErrorType,
    message: String,
    field: &str,
    value: &str,
    severity: Severity,
) {
    errors.push(ValidationError {
        row_number,
        error_type,
        message,
        field: Some(field.to_string()),
        value: (!value.is_empty()).then(|| value.to_string()),
        severity,
    });
}

fn validate_price(
    row_number: usize,
    raw: &str,
    field: &str,
    error_type: BulkUploadErrorType,
    errors: &mut Vec<ValidationError>,
) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
        _ => {
            errors.push(ValidationError {
                row_number,
                error_type,
                message: format!("{field} '{raw}' must be a number >= 0"),
                field: Some(field.to_string()),
                value: Some(raw.to_string()),
                severity: Severity::Error,
            });
            None
        }
    }
}

fn validate_url(
    row_number: usize,
    raw: &str,
    field: &str,
    error_type: BulkUploadErrorType,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    match url::Url::parse(raw) {
        Ok(_) => Some(raw.to_string()),
        Err(_) => {
            errors.push(ValidationError {
                row_number,
                error_type,
                message: format!("{field} '{raw}' is not a well-formed URL"),
                field: Some(field.to_string()),
                value: Some(raw.to_string()),
                severity: Severity::Warning,
            });
            // Keep the raw value so the merchant sees what was supplied.
            Some(raw.to_string())
        }
    }
}

fn attribute_pair(name: Option<String>, value: Option<String>) -> Option<VariantAttribute> {
    match (name, value) {
        (Some(name), Some(value)) => Some(VariantAttribute { name, value }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
