//! Listing-page HTML extraction
//!
//! Pulls `ReportRecord`s out of the audit-report table. Tolerant by
//! design: header/footer rows of the wrong shape are skipped silently,
//! rows missing a title or link are dropped with a warning, and a row
//! that fails to parse never aborts the rest of the extraction.

use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::record::{derive_year_code, ReportRecord};

/// Extract records from listing HTML in document order.
///
/// Relative hrefs are resolved against `base_url`. Malformed or empty
/// HTML yields an empty vec, not an error.
pub fn extract(html: &str, base_url: &Url) -> Vec<ReportRecord> {
    let doc = Html::parse_document(html);
    let year_map = extract_year_map(&doc);

    let listing_rows = Selector::parse("#myTable tbody tr").expect("valid selector");
    let any_rows = Selector::parse("table tr").expect("valid selector");
    let cells = RowSelectors {
        td: Selector::parse("td").expect("valid selector"),
        a: Selector::parse("a").expect("valid selector"),
    };

    let mut rows: Vec<ElementRef> = doc.select(&listing_rows).collect();
    if rows.is_empty() {
        // Page layout without the listing id, fall back to any table
        rows = doc.select(&any_rows).collect();
    }

    let mut records = Vec::new();
    for tr in rows {
        if let Some(record) = parse_row(tr, base_url, &year_map, &cells) {
            records.push(record);
        }
    }
    log::debug!("extracted {} records from listing", records.len());
    records
}

/// Year-code → display-label mapping from the page's `#year` select.
fn extract_year_map(doc: &Html) -> HashMap<String, String> {
    let options = Selector::parse("#year option").expect("valid selector");
    let mut map = HashMap::new();
    for option in doc.select(&options) {
        let Some(value) = option.value().attr("value") else {
            continue;
        };
        let value = value.trim();
        let text = cell_text(option);
        if value.is_empty() || text.is_empty() {
            continue;
        }
        map.entry(value.to_string()).or_insert(text);
    }
    map
}

struct RowSelectors {
    td: Selector,
    a: Selector,
}

fn parse_row(
    tr: ElementRef,
    base_url: &Url,
    year_map: &HashMap<String, String>,
    selectors: &RowSelectors,
) -> Option<ReportRecord> {
    let cells: Vec<ElementRef> = tr.select(&selectors.td).collect();
    // Header/footer rows don't have the expected column shape
    if cells.len() < 4 {
        return None;
    }
    let serial: u32 = cell_text(cells[0]).parse().ok()?;

    let title = cell_text(cells[1]);
    if title.is_empty() {
        log::warn!("row {serial}: empty title, dropping");
        return None;
    }
    let date_text = cell_text(cells[2]);

    let href = cells[3]
        .select(&selectors.a)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty());
    let Some(href) = href else {
        log::warn!("row {serial} ({title}): no download link, dropping");
        return None;
    };
    let url = match base_url.join(href) {
        Ok(url) => url,
        Err(e) => {
            log::warn!("row {serial} ({title}): bad href {href:?}: {e}, dropping");
            return None;
        }
    };

    // Hidden trailing cells: year code the page's filter uses (the
    // select element maps it back to a display label), then report and
    // type identifiers and a status flag.
    let page_year_code = optional_cell_text(&cells, 4);
    let year_label = page_year_code
        .as_ref()
        .and_then(|code| year_map.get(code).cloned());
    let year_code = year_label.as_deref().map(derive_year_code);
    let report_code = optional_cell_text(&cells, 5);
    let type_code = optional_cell_text(&cells, 6);
    let is_active = optional_cell_text(&cells, 7).and_then(|text| {
        match text.to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    });

    Some(ReportRecord {
        serial,
        title,
        date_text,
        year_label,
        year_code,
        page_year_code,
        url: url.into(),
        report_code,
        type_code,
        is_active,
    })
}

fn optional_cell_text(cells: &[ElementRef], index: usize) -> Option<String> {
    cells
        .get(index)
        .map(|cell| cell_text(*cell))
        .filter(|text| !text.is_empty())
}

/// Text content of an element with nested markup flattened and
/// whitespace collapsed.
fn cell_text(el: ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://agp.gov.pk/AuditReports").unwrap()
    }

    const LISTING: &str = r#"
        <html><body>
        <select id="year">
          <option value="">Select Year</option>
          <option value="y14"> 2024-2025 </option>
          <option value="y13">2023-2024</option>
        </select>
        <table id="myTable">
          <thead><tr><th>#</th><th>Title</th><th>Date</th><th>Link</th></tr></thead>
          <tbody>
            <tr>
              <td> 1 </td>
              <td> Audit Report on <b>Federal Government</b> </td>
              <td>01-07-2024</td>
              <td><a href="/SiteImage/Downloads/federal.pdf">Download</a></td>
              <td style="display:none">y14</td>
              <td style="display:none">AR-2024-017</td>
              <td style="display:none">FED</td>
              <td style="display:none">True</td>
            </tr>
            <tr>
              <td>2</td>
              <td>Report without a link</td>
              <td>02-07-2024</td>
              <td></td>
            </tr>
            <tr>
              <td>3</td>
              <td>Provincial Accounts</td>
              <td>03-07-2023</td>
              <td><a href="https://cdn.example.org/provincial.pdf">Download</a></td>
              <td style="display:none">y13</td>
            </tr>
          </tbody>
        </table>
        </body></html>
    "#;

    #[test]
    fn extracts_rows_in_document_order() {
        let records = extract(LISTING, &base());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].serial, 1);
        assert_eq!(records[1].serial, 3);
    }

    #[test]
    fn flattens_nested_markup_and_whitespace() {
        let records = extract(LISTING, &base());
        assert_eq!(records[0].title, "Audit Report on Federal Government");
    }

    #[test]
    fn resolves_relative_hrefs() {
        let records = extract(LISTING, &base());
        assert_eq!(
            records[0].url,
            "https://agp.gov.pk/SiteImage/Downloads/federal.pdf"
        );
        // Absolute hrefs pass through untouched
        assert_eq!(records[1].url, "https://cdn.example.org/provincial.pdf");
    }

    #[test]
    fn attaches_year_label_and_code_from_select() {
        let records = extract(LISTING, &base());
        assert_eq!(records[0].page_year_code.as_deref(), Some("y14"));
        assert_eq!(records[0].year_label.as_deref(), Some("2024-2025"));
        assert_eq!(records[0].year_code.as_deref(), Some("2024"));
        assert_eq!(records[1].year_label.as_deref(), Some("2023-2024"));
    }

    #[test]
    fn carries_hidden_report_and_type_cells() {
        let records = extract(LISTING, &base());
        assert_eq!(records[0].report_code.as_deref(), Some("AR-2024-017"));
        assert_eq!(records[0].type_code.as_deref(), Some("FED"));
        assert_eq!(records[0].is_active, Some(true));
        // Second row has no hidden trailing cells beyond the year code
        assert_eq!(records[1].report_code, None);
        assert_eq!(records[1].type_code, None);
        assert_eq!(records[1].is_active, None);
    }

    #[test]
    fn unrecognized_status_text_yields_no_flag() {
        let html = r#"
            <table><tbody><tr>
              <td>9</td><td>Odd status</td><td></td>
              <td><a href="https://x.example/9.pdf">dl</a></td>
              <td>y14</td><td>AR-9</td><td>FED</td><td>pending</td>
            </tr></tbody></table>
        "#;
        let records = extract(html, &base());
        assert_eq!(records[0].report_code.as_deref(), Some("AR-9"));
        assert_eq!(records[0].is_active, None);
    }

    #[test]
    fn row_without_year_cell_has_no_label() {
        let html = r#"
            <table><tbody><tr>
              <td>7</td><td>Standalone</td><td></td>
              <td><a href="https://x.example/a.pdf">dl</a></td>
            </tr></tbody></table>
        "#;
        let records = extract(html, &base());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].year_label, None);
        assert_eq!(records[0].year_code, None);
    }

    #[test]
    fn malformed_middle_row_is_isolated() {
        let html = r#"
            <table><tbody>
              <tr><td>1</td><td>First</td><td></td>
                  <td><a href="https://x.example/1.pdf">dl</a></td></tr>
              <tr><th colspan="4">not a data row</th></tr>
              <tr><td>3</td><td>Third</td><td></td>
                  <td><a href="https://x.example/3.pdf">dl</a></td></tr>
            </tbody></table>
        "#;
        let records = extract(html, &base());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "First");
        assert_eq!(records[1].title, "Third");
    }

    #[test]
    fn empty_and_garbage_html_yield_no_records() {
        assert!(extract("", &base()).is_empty());
        assert!(extract("<<<not html>>>", &base()).is_empty());
        assert!(extract("<p>no table here</p>", &base()).is_empty());
    }

    #[test]
    fn non_numeric_serial_is_skipped_silently() {
        let html = r#"
            <table><tbody><tr>
              <td>total</td><td>Footer row</td><td></td>
              <td><a href="https://x.example/f.pdf">dl</a></td>
            </tr></tbody></table>
        "#;
        assert!(extract(html, &base()).is_empty());
    }
}
