//! Metadata export
//!
//! Serializes the (filtered) record sequence as a JSON array. The file
//! is written to a temporary sibling and renamed into place, so a
//! reader never observes a partially-written document.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::record::ReportRecord;

/// Write `records` as pretty-printed JSON to `path`.
///
/// Parent directories are created as needed. Any failure surfaces to
/// the caller; nothing is silently dropped.
pub fn write_metadata(records: &[ReportRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(records).context("failed to serialize metadata")?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("metadata path has no filename")?;
    let tmp = path.with_file_name(format!("{file_name}.tmp"));

    fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to move metadata into {}", path.display()))?;
    Ok(())
}
