use anyhow::{Context, Result};
use mediathek_parser::{BackendKind, ResolverConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "mediathek";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// API generation of the deployment.
    pub backend: BackendKind,
    /// Schemes the local player handles.
    pub schemes: Vec<String>,
    pub resolver: ResolverConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            schemes: vec!["http".to_string(), "https".to_string()],
            resolver: ResolverConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, or the default location. A missing default file means
    /// defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(AppConfig::parse("").unwrap(), AppConfig::default());
    }

    #[test]
    fn overrides_are_merged_into_defaults() {
        let config = AppConfig::parse(
            r#"
            backend = "legacy"
            schemes = ["http", "rtmp"]

            [resolver]
            request_timeout_secs = 5
            broken_host_markers = []
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, BackendKind::Legacy);
        assert_eq!(config.schemes, ["http", "rtmp"]);
        assert_eq!(config.resolver.request_timeout_secs, 5);
        assert!(config.resolver.broken_host_markers.is_empty());
        assert_eq!(config.resolver.player_id, "ngplayer_2_3");
    }

    #[test]
    fn explicit_missing_file_fails() {
        let missing = Path::new("/nonexistent/mediathek/config.toml");
        assert!(AppConfig::load(Some(missing)).is_err());
    }
}
