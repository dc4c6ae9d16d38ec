//! Application configuration, read from a JSON file next to the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable pointing at a config file.
pub const CONFIG_ENV: &str = "GAMEDATA_VIZ_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "gamedata_viz.json";

/// Space around the plot area, in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 30.0,
            bottom: 90.0,
            left: 70.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub steam_csv: String,
    pub twitch_csv: String,
    pub sales_csv: String,
    /// Duration of enter/update/exit transitions.
    pub transition_ms: u64,
    /// Allowed zoom factors, `[min, max]`.
    pub zoom_extent: [f64; 2],
    pub window_size: [f32; 2],
    pub margins: Margins,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            steam_csv: "steam.csv".to_string(),
            twitch_csv: "twitchdata-update.csv".to_string(),
            sales_csv: "vgsales.csv".to_string(),
            transition_ms: 750,
            zoom_extent: [1.0, 10.0],
            window_size: [1400.0, 860.0],
            margins: Margins::default(),
        }
    }
}

impl AppConfig {
    /// Read a config file. Missing keys take their default value.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the config location and load it, falling back to defaults.
    ///
    /// Never fails: a broken file is logged and ignored.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                info!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                warn!("{e:#}; using default config");
                Self::default()
            }
        }
    }

    pub fn steam_path(&self) -> PathBuf {
        self.data_dir.join(&self.steam_csv)
    }

    pub fn twitch_path(&self) -> PathBuf {
        self.data_dir.join(&self.twitch_csv)
    }

    pub fn sales_path(&self) -> PathBuf {
        self.data_dir.join(&self.sales_csv)
    }

    /// Transition length in seconds.
    pub fn transition_secs(&self) -> f64 {
        self.transition_ms as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "data_dir": "/srv/csv", "transition_ms": 300 }}"#).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.transition_ms, 300);
        assert_eq!(config.steam_path(), PathBuf::from("/srv/csv/steam.csv"));
        assert_eq!(config.zoom_extent, [1.0, 10.0]);
        assert_eq!(config.margins, Margins::default());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn defaults_point_at_bundled_csvs() {
        let config = AppConfig::default();
        assert_eq!(config.twitch_path(), PathBuf::from("data/twitchdata-update.csv"));
        assert_eq!(config.transition_secs(), 0.75);
    }
}
