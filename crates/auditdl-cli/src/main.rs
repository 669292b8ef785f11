//! auditdl - download audit reports from agp.gov.pk
//!
//! Scrapes the public listing page for report metadata and
//! bulk-downloads the referenced PDFs into year-keyed subdirectories.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use url::Url;

use auditdl_core::{
    download_all, extract, fetch_text, filter, shutdown_flag, write_metadata, DownloadOptions,
    FilterCriteria, OutcomeStatus, ProgressContext,
};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "auditdl")]
#[command(about = "Download audit reports from https://agp.gov.pk/AuditReports")]
#[command(version)]
struct Cli {
    /// Destination directory for downloaded reports
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Year label or code to filter (repeatable, e.g. 2024-2025)
    #[arg(short = 'y', long = "year")]
    years: Vec<String>,

    /// Keep only reports whose titles contain this substring
    #[arg(short, long)]
    query: Option<String>,

    /// Limit the number of reports to process after filtering
    #[arg(short = 'l', long)]
    limit: Option<usize>,

    /// Number of concurrent downloads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Re-download files even if they already exist
    #[arg(long)]
    overwrite: bool,

    /// Compute destinations and report them without downloading
    #[arg(long)]
    dry_run: bool,

    /// Write matched report metadata as JSON to this path
    #[arg(short, long)]
    metadata: Option<PathBuf>,

    /// Print matched reports and exit without downloading
    #[arg(long)]
    list_only: bool,

    /// HTTP timeout in seconds for download requests
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Config file path (default: ./auditdl.toml or ~/.config/auditdl/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug  — progress bars show activity
    //   non-TTY: info unless --debug          — logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    auditdl_core::init_logging(quiet, cli.debug, multi);

    setup_signal_handler();

    let config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    let base_url = Url::parse(&config.listing.base_url)
        .with_context(|| format!("invalid base URL: {}", config.listing.base_url))?;
    let timeout = Duration::from_secs(cli.timeout.unwrap_or(config.http.timeout_secs));

    let stage = progress.stage_line("listing");
    stage.set_message(config.listing.page_url.clone());
    let html = fetch_text(&config.listing.page_url, timeout)
        .with_context(|| format!("failed to fetch {}", config.listing.page_url))?;
    stage.finish_and_clear();

    let records = extract(&html, &base_url);
    log::info!("Parsed {} reports from listing", records.len());

    let criteria = FilterCriteria {
        years: cli.years,
        query: cli.query,
        limit: cli.limit,
    };
    let selected = filter(&records, &criteria);
    if selected.is_empty() {
        log::warn!("No reports matched the given filters.");
        return Ok(());
    }
    log::info!("Selected {} reports for processing", selected.len());

    if let Some(path) = &cli.metadata {
        write_metadata(&selected, path)?;
        log::info!("Wrote metadata to {}", path.display());
    }

    if cli.list_only {
        print_listing(&selected);
        return Ok(());
    }

    let workers = cli
        .workers
        .unwrap_or(config.workers.default)
        .clamp(1, config.workers.max.max(1));
    let opts = DownloadOptions {
        dest_root: cli.output.unwrap_or(config.output.default_dir),
        workers,
        dry_run: cli.dry_run,
        overwrite: cli.overwrite,
        timeout,
    };

    let started = Instant::now();
    let outcomes = download_all(&selected, &opts, &progress);
    let elapsed = started.elapsed();

    if opts.dry_run {
        for outcome in &outcomes {
            if let Some(dest) = &outcome.destination_path {
                progress.println(format!("would fetch {} -> {}", outcome.record.url, dest.display()));
            }
        }
    }

    let count = |status: OutcomeStatus| outcomes.iter().filter(|o| o.status == status).count();
    let downloaded = count(OutcomeStatus::Downloaded);
    let skipped_exists = count(OutcomeStatus::SkippedExists);
    let skipped_dry_run = count(OutcomeStatus::SkippedDryRun);
    let failed = count(OutcomeStatus::Failed);

    for outcome in outcomes.iter().filter(|o| o.is_failure()) {
        let detail = outcome.error.as_deref().unwrap_or("unknown error");
        log::error!("{}: {detail}", outcome.record.title);
    }

    print_summary(
        "Downloads",
        &[
            ("Downloaded", downloaded.to_string()),
            ("Skipped (exists)", skipped_exists.to_string()),
            ("Skipped (dry run)", skipped_dry_run.to_string()),
            ("Failed", failed.to_string()),
            ("Time", format!("{:.1}s", elapsed.as_secs_f64())),
        ],
    );

    if failed > 0 {
        anyhow::bail!("{failed} of {} downloads failed", outcomes.len());
    }
    Ok(())
}

/// First signal: set graceful shutdown flag.
/// Second signal: force exit (default SIGINT behavior restored).
/// SAFETY: AtomicBool::swap and process::exit are async-signal-safe.
fn setup_signal_handler() {
    unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGTERM, || {
            if shutdown_flag().swap(true, Ordering::Relaxed) {
                std::process::exit(130);
            }
        })
        .expect("Failed to register SIGTERM handler");
        signal_hook::low_level::register(signal_hook::consts::SIGINT, || {
            if shutdown_flag().swap(true, Ordering::Relaxed) {
                std::process::exit(130);
            }
        })
        .expect("Failed to register SIGINT handler");
    }
}

/// Print matched reports on stdout (--list-only).
fn print_listing(records: &[auditdl_core::ReportRecord]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("#").fg(Color::Cyan),
            Cell::new("Date").fg(Color::Cyan),
            Cell::new("Year").fg(Color::Cyan),
            Cell::new("Title").fg(Color::Cyan),
        ]);
    for record in records {
        table.add_row(vec![
            format!("{:04}", record.serial),
            record.date_text.clone(),
            record.year_label.clone().unwrap_or_default(),
            record.title.clone(),
        ]);
    }
    println!("{table}");
}

/// Print a key-value summary table on stderr.
fn print_summary(title: &str, rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}
