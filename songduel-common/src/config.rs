//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `SONGDUEL_ROOT` environment variable
//! 3. `root_folder` in the TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or broken config file never prevents startup: compiled
//! defaults are used and the reason is reported back to the caller.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the root folder
pub const ROOT_ENV_VAR: &str = "SONGDUEL_ROOT";

/// Default listen address for the HTTP service
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5730";

/// Default bound on conditional-update attempts per vote
pub const DEFAULT_VOTE_MAX_ATTEMPTS: u32 = 3;

/// Default upload body limit (50 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const DATABASE_FILE_NAME: &str = "songduel.db";
const UPLOADS_DIR_NAME: &str = "uploads";

/// Which song store implementation backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite database under the root folder
    #[default]
    Sqlite,
    /// Process-local map; contents are lost on exit
    Memory,
}

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing level; `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Contents of `config.toml`
///
/// Every field has a default, so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_addr: String,
    pub storage: StorageBackend,
    pub vote_max_attempts: u32,
    pub max_upload_bytes: usize,
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            storage: StorageBackend::default(),
            vote_max_attempts: DEFAULT_VOTE_MAX_ATTEMPTS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.vote_max_attempts == 0 {
            return Err(Error::Config(
                "vote_max_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        if self.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(Error::Config(format!(
                "bind_addr is not a socket address: {}",
                self.bind_addr
            )));
        }
        Ok(())
    }
}

/// Platform config file location: `<config_dir>/songduel/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("songduel").join("config.toml"))
}

/// Read, parse and validate a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Write a config file, creating the parent directory if needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed and validated from this file
    File(PathBuf),
    /// Compiled defaults; `reason` says why no file was used
    Defaults { reason: String },
}

/// Effective configuration plus its origin
///
/// Loading happens before tracing is initialized (the log level lives in
/// the file), so the caller logs `source` once the subscriber is up.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

/// Load the config file, falling back to defaults on any problem
///
/// `explicit` is the `--config` argument; when absent the platform
/// location is tried.
pub fn load_or_default(explicit: Option<&Path>) -> LoadedConfig {
    let defaults = |reason: String| LoadedConfig {
        config: TomlConfig::default(),
        source: ConfigSource::Defaults { reason },
    };

    let path = match explicit.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => path,
        None => return defaults("could not determine config directory".to_string()),
    };

    if !path.exists() {
        return defaults(format!("config file not found: {}", path.display()));
    }

    match load_toml_config(&path) {
        Ok(config) => LoadedConfig {
            config,
            source: ConfigSource::File(path),
        },
        Err(e) => defaults(format!("ignoring config file {}: {}", path.display(), e)),
    }
}

/// Resolves the root folder following the priority order above
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, toml_root: Option<PathBuf>) -> Self {
        Self { cli_arg, toml_root }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            return path.clone();
        }

        default_root_folder()
    }
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("songduel"))
        .unwrap_or_else(|| PathBuf::from("./songduel_data"))
}

/// Creates the root folder layout and knows where things live inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create root and uploads directories if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.uploads_path())?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE_NAME)
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TomlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.vote_max_attempts, 3);
        assert_eq!(config.storage, StorageBackend::Sqlite);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = TomlConfig {
            vote_max_attempts: 0,
            ..TomlConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_bad_bind_addr_rejected() {
        let config = TomlConfig {
            bind_addr: "localhost".to_string(),
            ..TomlConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str("storage = \"memory\"\n").unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_initializer_paths() {
        let init = RootFolderInitializer::new(PathBuf::from("/srv/songduel"));
        assert_eq!(init.database_path(), PathBuf::from("/srv/songduel/songduel.db"));
        assert_eq!(init.uploads_path(), PathBuf::from("/srv/songduel/uploads"));
    }
}
