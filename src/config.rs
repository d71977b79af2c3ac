//! Capture settings persistence
//!
//! Save folder, file base name, the running file counter and the image
//! format survive across runs in a JSON state file. This persists
//! *settings* only; session state never outlives the process.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::sink::FileFormat;

/// User-facing capture settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub save_dir: PathBuf,
    pub base_name: String,
    /// Next file number, always below 10000.
    pub counter: u32,
    pub format: FileFormat,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            base_name: "scan".to_owned(),
            counter: 0,
            format: FileFormat::default(),
        }
    }
}

/// The user's Pictures directory, with a home-relative fallback.
pub fn default_save_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl CaptureConfig {
    fn state_file_path() -> Result<PathBuf> {
        let dir = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .context("no state directory available")?;
        Ok(dir.join("scanport").join("config.json"))
    }

    /// Save to the platform state directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::state_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Load from the platform state directory, if a config was ever saved.
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(&Self::state_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut config: CaptureConfig = serde_json::from_str(&json)?;
        config.counter %= 10_000;
        Ok(Some(config))
    }

    pub fn delete() -> Result<()> {
        let path = Self::state_file_path()?;
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("failed to delete config file: {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("config.json");
        let config = CaptureConfig {
            save_dir: PathBuf::from("/tmp/scans"),
            base_name: "page".to_owned(),
            counter: 42,
            format: FileFormat::Tiff,
        };
        config.save_to(&path).unwrap();
        let loaded = CaptureConfig::load_from(&path).unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(CaptureConfig::load_from(&path).unwrap().is_none());
    }

    #[test]
    fn test_counter_is_normalised_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = CaptureConfig::default();
        config.counter = 12_345;
        config.save_to(&path).unwrap();
        let loaded = CaptureConfig::load_from(&path).unwrap().unwrap();
        assert_eq!(loaded.counter, 2_345);
    }

    #[test]
    fn test_default_points_at_pictures() {
        let config = CaptureConfig::default();
        assert_eq!(config.base_name, "scan");
        assert_eq!(config.counter, 0);
        assert_eq!(config.format, FileFormat::Png);
    }
}
