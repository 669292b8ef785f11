//! Record filtering
//!
//! Produces a stable subsequence of the extracted records: never
//! reorders, never invents.

use crate::record::ReportRecord;

/// Filter criteria, all optional. Empty criteria are the identity.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Year labels or codes; a record matches when any entry equals its
    /// `year_label`, `year_code`, or `page_year_code` (case-insensitive,
    /// trimmed).
    pub years: Vec<String>,
    /// Case-insensitive substring match on the title.
    pub query: Option<String>,
    /// Truncate the filtered result to the first N entries.
    pub limit: Option<usize>,
}

/// Apply `criteria` to `records`, preserving input order.
pub fn filter(records: &[ReportRecord], criteria: &FilterCriteria) -> Vec<ReportRecord> {
    let years: Vec<String> = criteria
        .years
        .iter()
        .map(|y| y.trim().to_lowercase())
        .collect();
    let query = criteria.query.as_deref().map(str::to_lowercase);

    let mut out: Vec<ReportRecord> = records
        .iter()
        .filter(|r| matches_year(r, &years))
        .filter(|r| match &query {
            Some(q) => r.title.to_lowercase().contains(q),
            None => true,
        })
        .cloned()
        .collect();

    if let Some(limit) = criteria.limit {
        out.truncate(limit);
    }
    out
}

fn matches_year(record: &ReportRecord, years: &[String]) -> bool {
    if years.is_empty() {
        return true;
    }
    let candidates = [
        &record.year_label,
        &record.year_code,
        &record.page_year_code,
    ];
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .any(|c| years.iter().any(|y| y == &c.trim().to_lowercase()))
}
