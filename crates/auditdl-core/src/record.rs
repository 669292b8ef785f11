//! Report metadata model

use serde::{Deserialize, Serialize};

/// One row of the audit-report listing table.
///
/// Created once during extraction and immutable afterwards. `title` and
/// `url` are guaranteed non-empty for any record the extractor emits;
/// `url` is always absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Sequence number from the table's first column.
    pub serial: u32,
    pub title: String,
    /// Publish date as shown on the page (may be empty).
    pub date_text: String,
    /// Human-readable year/period string, e.g. "2024-2025".
    pub year_label: Option<String>,
    /// Normalized form of `year_label`, see [`derive_year_code`].
    pub year_code: Option<String>,
    /// Raw value the page's own year filter uses (e.g. "y14").
    pub page_year_code: Option<String>,
    /// Absolute URL of the PDF resource.
    pub url: String,
    /// Internal report identifier from the hidden trailing cells.
    pub report_code: Option<String>,
    /// Report-type identifier from the hidden trailing cells.
    pub type_code: Option<String>,
    /// Listing status flag, when the row carries one.
    pub is_active: Option<bool>,
}

/// Normalize a year label into a machine-comparable code.
///
/// The first run of exactly four ASCII digits wins ("Audit Year
/// 2024-2025" → "2024"). Labels without a 4-digit token fall back to
/// the label with all non-alphanumerics removed, lowercased, so
/// filtering still degrades gracefully.
pub fn derive_year_code(label: &str) -> String {
    let bytes = label.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 4 {
                return label[start..i].to_string();
            }
        } else {
            i += 1;
        }
    }
    label
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
