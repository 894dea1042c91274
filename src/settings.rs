use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::fetcher::Waits;

const SETTINGS_FILE: &str = "jupiter";
const ENV_PREFIX: &str = "JUPITER";

/// Defaults, then `jupiter.toml` (optional), then `JUPITER_*` variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory of a saved session, or `http(s)://` base URL of a mirror.
    pub source: String,
    pub ready_timeout_ms: u64,
    pub curriculum_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            source: "data/jupiter".to_string(),
            ready_timeout_ms: 5000,
            curriculum_timeout_ms: 3000,
            poll_interval_ms: 100,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Directory(PathBuf),
    Http(String),
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::build(File::with_name(SETTINGS_FILE).required(false))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        Self::build(File::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn source(&self) -> Source {
        let s = self.source.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            Source::Http(s.to_string())
        } else {
            Source::Directory(PathBuf::from(s))
        }
    }

    pub fn waits(&self) -> Waits {
        Waits {
            ready: Duration::from_millis(self.ready_timeout_ms),
            curriculum: Duration::from_millis(self.curriculum_timeout_ms),
            poll: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jupiter.toml");
        std::fs::write(&path, "source = \"https://mirror.example/jupiter/\"\nready_timeout_ms = 250\n").unwrap();

        let s = Settings::load_from(&path).unwrap();
        assert_eq!(s.source(), Source::Http("https://mirror.example/jupiter/".to_string()));
        assert_eq!(s.waits().ready, Duration::from_millis(250));
        assert_eq!(s.curriculum_timeout_ms, 3000);
        assert_eq!(s.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn plain_path_is_a_directory() {
        let s = Settings::default();
        assert_eq!(s.source(), Source::Directory(PathBuf::from("data/jupiter")));
    }

    #[test]
    fn missing_required_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
