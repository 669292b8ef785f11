//! Progress reporting for TTY and non-TTY environments.
//!
//! TTY mode: one indicatif byte bar per in-flight download, cleared on
//! completion. Non-TTY mode: bars are hidden and log lines carry the
//! progress instead.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Width reserved for the filename prefix on download bars.
const PREFIX_WIDTH: usize = 24;

fn byte_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:<24.dim} {bar:28.green/dim} {binary_bytes:>8}/{binary_total_bytes:8} {wide_msg:.dim}")
        .expect("invalid template")
        .progress_chars("--")
}

/// Shown before Content-Length is known.
fn pending_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:<24.dim} {wide_msg:.dim}")
        .expect("invalid template")
}

/// Upgrade a pending bar to a byte bar once the total is known.
pub fn upgrade_to_bar(pb: &ProgressBar, total: u64) {
    pb.set_length(total);
    pb.set_style(byte_bar_style());
}

/// Central context managing the multi-progress display.
pub struct ProgressContext {
    multi: MultiProgress,
    is_tty: bool,
}

impl ProgressContext {
    /// Create a new context, detecting TTY automatically.
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            is_tty: std::io::stderr().is_terminal(),
        }
    }

    /// Per-download progress bar named after the destination file.
    ///
    /// Starts in pending style; call [`upgrade_to_bar`] once the
    /// response headers arrive. Hidden (no-op) outside a TTY.
    pub fn download_bar(&self, name: &str) -> ProgressBar {
        if !self.is_tty {
            return ProgressBar::hidden();
        }
        let pb = self.multi.add(ProgressBar::new(0));
        pb.set_style(pending_style());
        // Truncate long names to keep bars aligned
        let display: String = name.chars().take(PREFIX_WIDTH).collect();
        pb.set_prefix(display);
        pb
    }

    /// Spinner status line for a pipeline stage (fetching the listing).
    pub fn stage_line(&self, name: &str) -> ProgressBar {
        if !self.is_tty {
            return ProgressBar::hidden();
        }
        let pb = self.multi.add(ProgressBar::new(0));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {prefix:<10.cyan.bold} {wide_msg}")
                .expect("invalid template"),
        );
        pb.set_prefix(name.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    /// Print a line above the managed bars without tearing them.
    pub fn println(&self, msg: impl AsRef<str>) {
        if self.is_tty {
            let _ = self.multi.println(msg);
        } else {
            eprintln!("{}", msg.as_ref());
        }
    }

    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// `MultiProgress` handle for the log bridge.
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }
}

impl Default for ProgressContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe handle shared across workers.
pub type SharedProgress = Arc<ProgressContext>;
