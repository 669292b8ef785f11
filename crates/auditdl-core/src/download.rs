//! Concurrent download pipeline
//!
//! Destinations are assigned sequentially before dispatch so no two
//! workers can claim the same path, then a bounded worker pool fetches
//! the PDFs. One outcome per input record, in input order, regardless
//! of completion order.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::http::{self, FetchError};
use crate::progress::SharedProgress;
use crate::record::ReportRecord;
use crate::sanitize::{sanitize, sanitize_dir_name};
use crate::shutdown::is_shutdown_requested;

/// Result status of one attempted download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Downloaded,
    SkippedDryRun,
    SkippedExists,
    Failed,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Downloaded => "downloaded",
            Self::SkippedDryRun => "skipped (dry run)",
            Self::SkippedExists => "skipped (exists)",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Per-record result of the pipeline. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub record: ReportRecord,
    pub status: OutcomeStatus,
    /// Written (or would-be-written) path; absent only when the
    /// failure happened before a destination was assigned.
    pub destination_path: Option<PathBuf>,
    /// Failure detail, present only for `Failed`.
    pub error: Option<String>,
}

impl DownloadOutcome {
    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }
}

/// Pipeline configuration, populated by the CLI layer.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub dest_root: PathBuf,
    /// Upper bound on concurrent fetches.
    pub workers: usize,
    pub dry_run: bool,
    /// Re-fetch files that already exist at their destination.
    pub overwrite: bool,
    /// Total per-request timeout.
    pub timeout: Duration,
}

/// Compute the destination path for every record.
///
/// Records are grouped under a year-keyed subdirectory (`unknown` when
/// the label is absent); filenames are disambiguated per directory so
/// the parallel phase never races on a path. Pure planning, nothing
/// is created on disk.
pub fn plan_destinations(records: &[ReportRecord], dest_root: &Path) -> Vec<PathBuf> {
    let mut used_by_dir: HashMap<PathBuf, HashSet<String>> = HashMap::new();
    records
        .iter()
        .map(|record| {
            let label = record.year_label.as_deref().unwrap_or_default();
            let dir = dest_root.join(sanitize_dir_name(label));
            let used = used_by_dir.entry(dir.clone()).or_default();
            let name = sanitize(&record.title, &record.url, used);
            used.insert(name.clone());
            dir.join(name)
        })
        .collect()
}

/// Download every record, returning one outcome per record in input
/// order. Individual failures never abort the batch.
pub fn download_all(
    records: &[ReportRecord],
    opts: &DownloadOptions,
    progress: &SharedProgress,
) -> Vec<DownloadOutcome> {
    let destinations = plan_destinations(records, &opts.dest_root);

    if opts.dry_run {
        return records
            .iter()
            .zip(destinations)
            .map(|(record, dest)| {
                log::debug!("dry run: would fetch {} -> {}", record.url, dest.display());
                DownloadOutcome {
                    record: record.clone(),
                    status: OutcomeStatus::SkippedDryRun,
                    destination_path: Some(dest),
                    error: None,
                }
            })
            .collect();
    }

    let jobs: Vec<(usize, &ReportRecord, PathBuf)> = records
        .iter()
        .enumerate()
        .zip(destinations)
        .map(|((idx, record), dest)| (idx, record, dest))
        .collect();

    // Outcome slots written by index preserve input order without a
    // final sort.
    let slots: Mutex<Vec<Option<DownloadOutcome>>> = Mutex::new(vec![None; records.len()]);
    let cursor = AtomicUsize::new(0);
    let workers = opts.workers.max(1).min(jobs.len().max(1));
    let is_tty = progress.is_tty();

    rayon::scope(|s| {
        for _ in 0..workers {
            s.spawn(|_| loop {
                let i = cursor.fetch_add(1, Ordering::Relaxed);
                let Some((idx, record, dest)) = jobs.get(i) else {
                    break;
                };
                if is_shutdown_requested() {
                    break;
                }
                let outcome = process_one(record, dest, opts, progress);
                if !is_tty {
                    match (&outcome.status, &outcome.error) {
                        (OutcomeStatus::Failed, Some(e)) => {
                            log::error!("{}: {e}", record.title);
                        }
                        (status, _) => {
                            log::info!("{}: {status}", record.title);
                        }
                    }
                }
                slots.lock().expect("worker thread panicked")[*idx] = Some(outcome);
            });
        }
    });

    // Jobs never started (shutdown) still get an outcome so the
    // one-per-record contract holds.
    slots
        .into_inner()
        .expect("worker thread panicked")
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| {
            slot.unwrap_or_else(|| DownloadOutcome {
                record: records[idx].clone(),
                status: OutcomeStatus::Failed,
                destination_path: None,
                error: Some("cancelled before start".to_string()),
            })
        })
        .collect()
}

fn process_one(
    record: &ReportRecord,
    dest: &Path,
    opts: &DownloadOptions,
    progress: &SharedProgress,
) -> DownloadOutcome {
    let outcome = |status, error: Option<String>| DownloadOutcome {
        record: record.clone(),
        status,
        destination_path: Some(dest.to_path_buf()),
        error,
    };

    if !opts.overwrite && dest.exists() {
        return outcome(OutcomeStatus::SkippedExists, None);
    }

    match fetch_into_place(record, dest, opts, progress) {
        Ok(()) => outcome(OutcomeStatus::Downloaded, None),
        Err(e) => outcome(OutcomeStatus::Failed, Some(e.to_string())),
    }
}

/// Fetch to `<dest>.part`, then rename into place. An interrupted or
/// failed fetch never leaves a corrupt destination file.
fn fetch_into_place(
    record: &ReportRecord,
    dest: &Path,
    opts: &DownloadOptions,
    progress: &SharedProgress,
) -> Result<(), FetchError> {
    let parent = dest.parent().unwrap_or(&opts.dest_root);
    fs::create_dir_all(parent)?;

    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = dest.with_file_name(format!("{file_name}.part"));

    let pb = progress.download_bar(&file_name);
    pb.set_message("connecting...");

    let result = http::fetch_to_file(&record.url, &tmp, opts.timeout, &pb);
    pb.finish_and_clear();

    match result {
        Ok(_) => {
            fs::rename(&tmp, dest)?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(serial: u32, title: &str, label: Option<&str>) -> ReportRecord {
        ReportRecord {
            serial,
            title: title.to_string(),
            date_text: String::new(),
            year_label: label.map(String::from),
            year_code: label.map(crate::record::derive_year_code),
            url: format!("https://x.example/files/{serial}.pdf"),
            ..Default::default()
        }
    }

    #[test]
    fn plans_year_keyed_subdirectories() {
        let records = vec![
            record(1, "Federal", Some("2024-2025")),
            record(2, "Orphan", None),
        ];
        let dests = plan_destinations(&records, Path::new("/out"));
        assert_eq!(dests[0], Path::new("/out/2024-2025/Federal.pdf"));
        assert_eq!(dests[1], Path::new("/out/unknown/Orphan.pdf"));
    }

    #[test]
    fn colliding_names_are_disambiguated_per_directory() {
        let records = vec![
            record(1, "report", Some("2024-2025")),
            record(2, "report", Some("2024-2025")),
            record(3, "report", Some("2023-2024")),
        ];
        let dests = plan_destinations(&records, Path::new("/out"));
        assert_eq!(dests[0], Path::new("/out/2024-2025/report.pdf"));
        assert_eq!(dests[1], Path::new("/out/2024-2025/report-2.pdf"));
        // Different directory, no collision
        assert_eq!(dests[2], Path::new("/out/2023-2024/report.pdf"));
    }

    #[test]
    fn planning_is_deterministic() {
        let records = vec![
            record(1, "report", Some("2024-2025")),
            record(2, "report", Some("2024-2025")),
        ];
        let a = plan_destinations(&records, Path::new("/out"));
        let b = plan_destinations(&records, Path::new("/out"));
        assert_eq!(a, b);
    }
}
