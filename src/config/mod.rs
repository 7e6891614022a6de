use crate::models::Config;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors from reading or writing `config.json`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("Config path {0} has no parent directory")]
    InvalidPath(Utf8PathBuf),
}

/// Typed load/save/reset of the persisted JSON settings.
///
/// Writes always go through a temporary file in the same directory followed by
/// a rename, so concurrent readers see either the old or the new content.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: Utf8PathBuf,
    home_dir: Utf8PathBuf,
}

impl ConfigStore {
    /// Create a store for `config_path`; `home_dir` seeds the default directories
    pub fn new<P, H>(config_path: P, home_dir: H) -> Self
    where
        P: AsRef<Utf8Path>,
        H: AsRef<Utf8Path>,
    {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            home_dir: home_dir.as_ref().to_path_buf(),
        }
    }

    /// Load and parse the config file.
    ///
    /// Malformed content is returned as [`ConfigError::Parse`] and left on disk untouched.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(&self.config_path).map_err(|source| ConfigError::Read {
            path: self.config_path.clone(),
            source,
        })?;

        let config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.config_path.clone(),
            source,
        })?;

        tracing::info!("Loaded config from {}", self.config_path);
        Ok(config)
    }

    /// Atomically overwrite the config file with `config` as indented JSON
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)?;
        self.write_atomic(json.as_bytes())?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    /// Build the canonical default config, persist it and return it
    pub fn reset_to_default(&self) -> Result<Config, ConfigError> {
        let config = Config::default_for_home(&self.home_dir);
        self.save(&config)?;

        tracing::info!("Reset config at {} to defaults", self.config_path);
        Ok(config)
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }

    fn write_atomic(&self, contents: &[u8]) -> Result<(), ConfigError> {
        let dir = self
            .config_path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or(Utf8Path::new("."));

        let write_err = |source| ConfigError::Write {
            path: self.config_path.clone(),
            source,
        };

        if self.config_path.file_name().is_none() {
            return Err(ConfigError::InvalidPath(self.config_path.clone()));
        }

        let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
        temp.write_all(contents).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&self.config_path)
            .map_err(|err| write_err(err.error))?;

        Ok(())
    }
}
