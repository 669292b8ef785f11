//! auditdl core: scraping and download pipeline for AGP audit reports
//!
//! Extracts report records from the public listing page's HTML table
//! and bulk-downloads the referenced PDFs through a bounded worker
//! pool. The CLI crate wires configuration in and prints summaries;
//! everything with behavior worth testing lives here.

pub mod download;
pub mod extract;
pub mod filter;
pub mod http;
pub mod logging;
pub mod metadata;
pub mod progress;
pub mod record;
pub mod sanitize;
pub mod shutdown;

// Re-exports for convenience
pub use download::{download_all, DownloadOptions, DownloadOutcome, OutcomeStatus};
pub use extract::extract;
pub use filter::{filter, FilterCriteria};
pub use http::{fetch_text, FetchError};
pub use logging::init_logging;
pub use metadata::write_metadata;
pub use progress::{ProgressContext, SharedProgress};
pub use record::{derive_year_code, ReportRecord};
pub use sanitize::{sanitize, sanitize_dir_name};
pub use shutdown::{is_shutdown_requested, request_shutdown, shutdown_flag};
