//! Config file persistence

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::model::AppConfig;

/// File name used when none is given
pub const DEFAULT_CONFIG_FILE: &str = "clicker_config.json";

/// Reads and writes the JSON config file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create a store for the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, failing on a missing or malformed file
    pub fn load(&self) -> ConfigResult<AppConfig> {
        debug!("Loading config file: {:?}", self.path);

        let content = fs::read_to_string(&self.path).map_err(|e| ConfigError::ReadFile {
            path: self.path.clone(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Load the config, falling back to defaults
    ///
    /// A missing or unparsable file is replaced by the default config, which
    /// is written back so the next start finds a valid file.
    pub fn load_or_default(&self) -> ConfigResult<AppConfig> {
        if !self.path.exists() {
            info!("No config at {:?}, writing defaults", self.path);
            return self.write_default();
        }

        match self.load() {
            Ok(config) => Ok(config),
            Err(ConfigError::ParseJson { source, .. }) => {
                warn!("Config at {:?} is not valid JSON ({}), resetting to defaults", self.path, source);
                self.write_default()
            }
            Err(e) => Err(e),
        }
    }

    /// Write `config` as pretty-printed JSON
    pub fn save(&self, config: &AppConfig) -> ConfigResult<()> {
        debug!("Saving config file: {:?}", self.path);

        let content = serde_json::to_string_pretty(config)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(&self.path, content).map_err(|e| ConfigError::WriteFile {
            path: self.path.clone(),
            source: e,
        })
    }

    fn write_default(&self) -> ConfigResult<AppConfig> {
        let config = AppConfig::default();
        self.save(&config)?;
        Ok(config)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_is_error() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("missing.json"));
        assert!(matches!(store.load(), Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_load_or_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clicker_config.json");
        let store = ConfigStore::new(&path);

        let config = store.load_or_default().unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn test_load_or_default_resets_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clicker_config.json");
        fs::write(&path, "{ not json").unwrap();

        let store = ConfigStore::new(&path);
        let config = store.load_or_default().unwrap();

        assert_eq!(config, AppConfig::default());
        assert!(store.load().is_ok());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("config.json"));

        store.save(&AppConfig::default()).unwrap();
        assert!(store.path().exists());
    }
}
