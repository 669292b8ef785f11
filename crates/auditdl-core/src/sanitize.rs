//! Filesystem-safe filename derivation
//!
//! Pure functions: no filesystem access, deterministic for identical
//! inputs. Collision bookkeeping for one batch lives in the caller's
//! `used_names` set.

use std::collections::HashSet;

/// Hard cap on filename length in bytes, extension included.
const MAX_FILENAME_BYTES: usize = 200;

const DEFAULT_EXT: &str = ".pdf";
const FALLBACK_STEM: &str = "report";

/// Map a report title and URL to a safe, unique filename.
///
/// Characters outside `[A-Za-z0-9._-]` become underscores, runs
/// collapse, and the result is truncated to [`MAX_FILENAME_BYTES`]
/// preserving the extension (taken from the URL path, `.pdf` when the
/// URL has none). A candidate already present in `used_names` gets a
/// `-2`, `-3`, … suffix before the extension until unique.
pub fn sanitize(title: &str, url: &str, used_names: &HashSet<String>) -> String {
    let ext = extension_from_url(url);
    let mut stem = sanitize_component(title);

    // Titles that already carry the extension would double it
    let lowered = stem.to_lowercase();
    if lowered.ends_with(&ext) {
        stem.truncate(stem.len() - ext.len());
        stem = stem.trim_end_matches(['.', '_', ' ']).to_string();
    }

    let available = MAX_FILENAME_BYTES.saturating_sub(ext.len()).max(1);
    while stem.len() > available {
        stem.pop();
    }
    stem = stem.trim_end_matches(['.', '_', ' ']).to_string();
    if stem.is_empty() {
        stem = FALLBACK_STEM.to_string();
    }

    let candidate = format!("{stem}{ext}");
    if !used_names.contains(&candidate) {
        return candidate;
    }
    for n in 2u32.. {
        let candidate = format!("{stem}-{n}{ext}");
        if !used_names.contains(&candidate) {
            return candidate;
        }
    }
    unreachable!("disambiguator space exhausted")
}

/// Sanitize a year label for use as a directory name.
/// Empty or fully-invalid labels become "unknown".
pub fn sanitize_dir_name(label: &str) -> String {
    let name = sanitize_component(label);
    if name.is_empty() {
        "unknown".to_string()
    } else {
        name
    }
}

/// Replace risky characters with underscores, collapse runs, and trim
/// leading/trailing dots, underscores and whitespace.
fn sanitize_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    // "foo _. bar" style artifacts: underscore directly before a dot
    while let Some(pos) = out.find("_.") {
        out.remove(pos);
    }
    out.trim_matches(['.', '_', ' ']).to_string()
}

fn extension_from_url(url: &str) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .rsplit('/')
        .next()
        .unwrap_or_default();
    match path.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_lowercase())
        }
        _ => DEFAULT_EXT.to_string(),
    }
}
