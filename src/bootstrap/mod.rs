//! Idempotent ensure-exists logic for the directories and files the session needs.
//!
//! Bootstrap is additive-only: it creates what is missing, never deletes or
//! truncates what already exists, and seeds `config.json` with defaults only on
//! the call that created it.

use crate::config::{ConfigError, ConfigStore};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use thiserror::Error;

/// Directory name used under each platform base directory
pub const APP_NAMESPACE: &str = "Bolt";

pub const DEFAULT_CACHE_FILE: &str = "default_cache.json";
pub const EXTENDED_CACHE_FILE: &str = "extended_cache.json";
pub const CONFIG_FILE: &str = "config.json";
pub const ERROR_LOG_FILE: &str = "error.log";

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Could not resolve the user's {0} directory")]
    DirectoryUnavailable(&'static str),

    #[error("Platform path is not valid UTF-8: {0:?}")]
    NonUtf8Path(PathBuf),

    #[error("Failed to inspect {path}: {source}")]
    Probe {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("Expected a directory at {0}")]
    NotADirectory(Utf8PathBuf),

    #[error("Expected a regular file at {0}")]
    NotAFile(Utf8PathBuf),

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create file {path}: {source}")]
    CreateFile {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to seed default config at {path}: {source}")]
    SeedConfig {
        path: Utf8PathBuf,
        source: ConfigError,
    },
}

/// The fixed set of paths the session requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapPaths {
    pub cache_dir: Utf8PathBuf,
    pub config_dir: Utf8PathBuf,
    pub data_dir: Utf8PathBuf,
    pub home_dir: Utf8PathBuf,
}

impl BootstrapPaths {
    /// Resolve the platform-canonical cache, config and data directories
    pub fn from_platform() -> Result<Self, BootstrapError> {
        let cache = resolve(dirs::cache_dir(), "cache")?;
        let config = resolve(dirs::config_dir(), "config")?;
        let data = resolve(dirs::data_local_dir(), "data")?;
        let home = resolve(dirs::home_dir(), "home")?;

        Ok(Self {
            cache_dir: cache.join(APP_NAMESPACE),
            config_dir: config.join(APP_NAMESPACE),
            data_dir: data.join(APP_NAMESPACE),
            home_dir: home,
        })
    }

    /// Lay the same structure out under `root`, with `root` standing in for the home directory
    pub fn under_root<P: AsRef<Utf8Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            cache_dir: root.join("cache").join(APP_NAMESPACE),
            config_dir: root.join("config").join(APP_NAMESPACE),
            data_dir: root.join("data").join(APP_NAMESPACE),
            home_dir: root.to_path_buf(),
        }
    }

    pub fn required_dirs(&self) -> [&Utf8Path; 3] {
        [&self.cache_dir, &self.config_dir, &self.data_dir]
    }

    pub fn required_files(&self) -> Vec<Utf8PathBuf> {
        vec![
            self.default_cache_file(),
            self.extended_cache_file(),
            self.config_file(),
            self.error_log_file(),
        ]
    }

    pub fn default_cache_file(&self) -> Utf8PathBuf {
        self.cache_dir.join(DEFAULT_CACHE_FILE)
    }

    pub fn extended_cache_file(&self) -> Utf8PathBuf {
        self.cache_dir.join(EXTENDED_CACHE_FILE)
    }

    pub fn config_file(&self) -> Utf8PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn error_log_file(&self) -> Utf8PathBuf {
        self.data_dir.join(ERROR_LOG_FILE)
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::new(self.config_file(), &self.home_dir)
    }
}

fn resolve(dir: Option<PathBuf>, label: &'static str) -> Result<Utf8PathBuf, BootstrapError> {
    let dir = dir.ok_or(BootstrapError::DirectoryUnavailable(label))?;
    Utf8PathBuf::try_from(dir).map_err(|err| BootstrapError::NonUtf8Path(err.into_path_buf()))
}

/// Outcome of a bootstrap run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Every required file, in a fixed order
    pub required_files: Vec<Utf8PathBuf>,

    /// Paths this run created; empty when everything already existed
    pub created: Vec<Utf8PathBuf>,

    /// Whether this run wrote the default config
    pub config_seeded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Directory,
    File,
    /// Exists but is neither a directory nor a regular file
    Other,
    Missing,
}

/// Metadata lookup used by the probe
type StatFn = fn(&Utf8Path) -> io::Result<fs::Metadata>;

fn stat(path: &Utf8Path) -> io::Result<fs::Metadata> {
    fs::metadata(path)
}

/// Stat `path`, separating "missing" from every other failure
fn probe(path: &Utf8Path, stat: StatFn) -> Result<Presence, BootstrapError> {
    match stat(path) {
        Ok(meta) if meta.is_dir() => Ok(Presence::Directory),
        Ok(meta) if meta.is_file() => Ok(Presence::File),
        Ok(_) => Ok(Presence::Other),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Presence::Missing),
        Err(source) => Err(BootstrapError::Probe {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Ensures the session's directories and files exist
#[derive(Debug, Clone)]
pub struct BootstrapManager {
    paths: BootstrapPaths,
    stat: StatFn,
}

impl BootstrapManager {
    pub fn new(paths: BootstrapPaths) -> Self {
        Self { paths, stat }
    }

    #[cfg(test)]
    fn with_stat(mut self, stat: StatFn) -> Self {
        self.stat = stat;
        self
    }

    pub fn paths(&self) -> &BootstrapPaths {
        &self.paths
    }

    /// Create every missing directory and file.
    ///
    /// The first failure aborts the run; nothing created before it is rolled back.
    pub fn setup(&self) -> Result<BootstrapReport, BootstrapError> {
        let mut created = Vec::new();

        for dir in self.paths.required_dirs() {
            if self.ensure_dir(dir)? {
                created.push(dir.to_path_buf());
            }
        }

        let config_file = self.paths.config_file();
        let required_files = self.paths.required_files();
        let mut config_seeded = false;

        for file in &required_files {
            if !self.ensure_file(file)? {
                continue;
            }
            created.push(file.clone());

            if *file == config_file {
                self.paths
                    .config_store()
                    .reset_to_default()
                    .map_err(|source| BootstrapError::SeedConfig {
                        path: file.clone(),
                        source,
                    })?;
                config_seeded = true;
            }
        }

        if created.is_empty() {
            tracing::debug!("Bootstrap found all required paths in place");
        } else {
            tracing::info!("Bootstrap created {} path(s)", created.len());
        }

        Ok(BootstrapReport {
            required_files,
            created,
            config_seeded,
        })
    }

    /// Returns true when the directory was created by this call
    fn ensure_dir(&self, dir: &Utf8Path) -> Result<bool, BootstrapError> {
        match probe(dir, self.stat)? {
            Presence::Directory => Ok(false),
            Presence::File | Presence::Other => {
                Err(BootstrapError::NotADirectory(dir.to_path_buf()))
            }
            Presence::Missing => {
                fs::create_dir_all(dir).map_err(|source| BootstrapError::CreateDirectory {
                    path: dir.to_path_buf(),
                    source,
                })?;
                tracing::info!("Created directory {}", dir);
                Ok(true)
            }
        }
    }

    /// Returns true when the file was created by this call
    fn ensure_file(&self, file: &Utf8Path) -> Result<bool, BootstrapError> {
        match probe(file, self.stat)? {
            Presence::File => return Ok(false),
            Presence::Directory | Presence::Other => {
                return Err(BootstrapError::NotAFile(file.to_path_buf()));
            }
            Presence::Missing => {}
        }

        // create_new never truncates a file that appeared after the probe
        match OpenOptions::new().write(true).create_new(true).open(file) {
            Ok(_) => {
                tracing::info!("Created file {}", file);
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                if probe(file, self.stat)? == Presence::File {
                    Ok(false)
                } else {
                    Err(BootstrapError::NotAFile(file.to_path_buf()))
                }
            }
            Err(source) => Err(BootstrapError::CreateFile {
                path: file.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_paths() -> (BootstrapPaths, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (BootstrapPaths::under_root(root), temp_dir)
    }

    /// Stat that refuses to inspect the config directory
    fn stat_denied_under_config(path: &Utf8Path) -> io::Result<fs::Metadata> {
        if path.ends_with(Utf8Path::new("config").join(APP_NAMESPACE)) {
            return Err(io::Error::from(ErrorKind::PermissionDenied));
        }
        fs::metadata(path)
    }

    #[test]
    fn test_probe_distinguishes_missing() {
        let (paths, _temp_dir) = create_test_paths();
        assert_eq!(probe(&paths.home_dir, stat).unwrap(), Presence::Directory);
        assert_eq!(probe(&paths.config_file(), stat).unwrap(), Presence::Missing);

        fs::write(paths.home_dir.join("plain"), b"").unwrap();
        assert_eq!(
            probe(&paths.home_dir.join("plain"), stat).unwrap(),
            Presence::File
        );
    }

    #[test]
    fn test_required_files_order() {
        let (paths, _temp_dir) = create_test_paths();
        let names: Vec<String> = paths
            .required_files()
            .iter()
            .map(|p| p.file_name().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["default_cache.json", "extended_cache.json", "config.json", "error.log"]
        );
    }

    #[test]
    fn test_directory_occupied_by_file_is_error() {
        let (paths, _temp_dir) = create_test_paths();
        fs::create_dir_all(paths.cache_dir.parent().unwrap()).unwrap();
        fs::write(&paths.cache_dir, b"not a dir").unwrap();

        let err = BootstrapManager::new(paths).setup().unwrap_err();
        assert!(matches!(err, BootstrapError::NotADirectory(_)));
    }

    #[test]
    fn test_file_occupied_by_directory_is_error() {
        let (paths, _temp_dir) = create_test_paths();
        fs::create_dir_all(paths.config_file()).unwrap();

        let err = BootstrapManager::new(paths.clone()).setup().unwrap_err();
        assert!(
            matches!(&err, BootstrapError::NotAFile(path) if *path == paths.config_file()),
            "expected NotAFile for config.json, got: {err:?}"
        );
        assert!(paths.config_file().is_dir());
    }

    #[test]
    fn test_stat_failure_aborts_setup() {
        let (paths, _temp_dir) = create_test_paths();

        let err = BootstrapManager::new(paths.clone())
            .with_stat(stat_denied_under_config)
            .setup()
            .unwrap_err();

        assert!(
            matches!(&err, BootstrapError::Probe { path, source }
                if *path == paths.config_dir && source.kind() == ErrorKind::PermissionDenied),
            "expected probe error on the config dir, got: {err:?}"
        );
        assert!(!paths.config_dir.exists());
        assert!(!paths.config_file().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_probe_is_not_treated_as_existing() {
        use std::os::unix::fs::PermissionsExt;

        let (paths, _temp_dir) = create_test_paths();
        let locked = paths.config_dir.parent().unwrap().to_path_buf();
        fs::create_dir_all(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits; test_stat_failure_aborts_setup covers that case
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = BootstrapManager::new(paths.clone()).setup();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let err = result.unwrap_err();
        assert!(
            matches!(err, BootstrapError::Probe { .. }),
            "expected probe error, got: {err:?}"
        );
        assert!(!paths.config_file().exists());
    }
}
