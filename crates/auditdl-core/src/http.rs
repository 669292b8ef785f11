//! HTTP fetching over a shared client
//!
//! Uses async reqwest internally but presents a sync interface so the
//! rayon download workers stay plain threads. The client and runtime
//! are process-wide resources acquired once.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use futures_util::StreamExt;
use indicatif::ProgressBar;

/// Connect timeout, separate from the per-request total timeout the
/// caller supplies.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error from fetching a single resource.
#[derive(Debug)]
pub enum FetchError {
    /// HTTP error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Local I/O error while writing the body
    Io(std::io::Error),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Shared HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(8)
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime for HTTP operations.
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Fetch a page body as text (the listing page).
pub fn fetch_text(url: &str, timeout: Duration) -> Result<String, FetchError> {
    SHARED_RUNTIME.handle().block_on(async {
        let response = SHARED_CLIENT
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::from_reqwest(&e))?;
        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))
    })
}

/// Stream a resource to `dest`, updating `pb` as bytes arrive.
///
/// The bar is upgraded to a byte bar once Content-Length is known.
/// Returns the number of bytes written. `dest` should be a temporary
/// path; the caller renames it into place on success.
pub fn fetch_to_file(
    url: &str,
    dest: &Path,
    timeout: Duration,
    pb: &ProgressBar,
) -> Result<u64, FetchError> {
    SHARED_RUNTIME.handle().block_on(async {
        let response = SHARED_CLIENT
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::from_reqwest(&e))?;

        if let Some(total) = response.content_length() {
            crate::progress::upgrade_to_bar(pb, total);
        }

        let mut file = fs::File::create(dest)?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::from_reqwest(&e))?;
            file.write_all(&chunk)?;
            written += chunk.len() as u64;
            pb.set_position(written);
        }
        file.flush()?;
        Ok(written)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_http_with_status() {
        let err = FetchError::Http {
            status: Some(404),
            message: "not found".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP 404: not found");
    }

    #[test]
    fn display_http_without_status() {
        let err = FetchError::Http {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP error: connection refused");
    }

    #[test]
    fn display_io_error() {
        let err = FetchError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        assert!(format!("{err}").contains("IO error"));
    }
}
