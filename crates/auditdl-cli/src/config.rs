//! Configuration loading from TOML files

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global configuration for auditdl. CLI flags override these values;
/// these values override the built-in defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub listing: ListingConfig,
    pub output: OutputConfig,
    pub workers: WorkersConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Page enumerating the audit reports.
    pub page_url: String,
    /// Base for resolving relative download hrefs.
    pub base_url: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_url: "https://agp.gov.pk/AuditReports".to_string(),
            base_url: "https://agp.gov.pk".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub default_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_dir: PathBuf::from("downloads"),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub default: usize,
    pub max: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            default: 4,
            max: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Search order:
    /// 1. ./auditdl.toml (current directory)
    /// 2. ~/.config/auditdl/config.toml
    ///
    /// If no config file is found, returns the defaults.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("auditdl.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "auditdl") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.output.default_dir, PathBuf::from("downloads"));
        assert_eq!(config.workers.default, 4);
        assert_eq!(config.http.timeout_secs, 60);
        assert!(config.listing.page_url.starts_with("https://agp.gov.pk"));
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[listing]
page_url = "https://example.org/reports"
base_url = "https://example.org"

[output]
default_dir = "/tmp/reports"

[workers]
default = 8
max = 12

[http]
timeout_secs = 30
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.listing.page_url, "https://example.org/reports");
        assert_eq!(config.output.default_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(config.workers.default, 8);
        assert_eq!(config.workers.max, 12);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml = r#"
[workers]
default = 2
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.workers.default, 2);
        assert_eq!(config.workers.max, 16);
        assert_eq!(config.output.default_dir, PathBuf::from("downloads"));
    }

    #[test]
    fn from_file_missing() {
        let path = PathBuf::from("/nonexistent/auditdl.toml");
        assert!(Config::from_file(&path).is_err());
    }
}
