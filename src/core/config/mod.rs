//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! care has two configuration scopes:
//! - **Global**: User-level settings, board access, and templates
//! - **Repo**: Per-repository overrides of the git workflow settings
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. Environment (`$CARE_BOARD_TOKEN` for the board credential)
//! 5. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$CARE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/care/config.toml`
//! 3. `~/.care/config.toml` (canonical write location)
//!
//! # Repo Config Location
//!
//! `.git/care/config.toml` under the repository root.
//!
//! # Example
//!
//! ```no_run
//! use carework::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/repo"))).unwrap();
//! let config = result.config;
//!
//! println!("Remote: {}", config.remote());
//! if let Some(tool) = config.merge_tool() {
//!     println!("Merge tool: {}", tool);
//! }
//! ```

pub mod schema;

pub use schema::{BoardConfig, GlobalConfig, RepoConfig, TemplateConfig, SETTABLE_KEYS};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "CARE_CONFIG";

/// Environment variable holding the board credential.
pub const BOARD_TOKEN_ENV: &str = "CARE_BOARD_TOKEN";

/// Public GraphQL endpoint used when none is configured.
pub const DEFAULT_BOARD_URL: &str = "https://api.monday.com/v2";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence rules. Repo config overrides global
/// config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if in a repo)
    pub repo: Option<RepoConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the repo config file (if loaded)
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `repo_path` is provided, also loads repo-specific config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(repo_path: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let (global, global_path) = Self::load_global()?;

        let (repo, repo_path_found) = match repo_path {
            Some(path) => Self::load_repo(path)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        debug!(?global_path, repo_path = ?repo_path_found, "configuration loaded");
        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                global_path,
                repo_path: repo_path_found,
            },
        })
    }

    /// Load only the global file, for `care config`.
    pub fn load_global_only() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        let loaded = Self::load_global()?;
        loaded.0.validate()?;
        Ok(loaded)
    }

    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("care/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".care/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    fn load_repo(repo_path: &Path) -> Result<(Option<RepoConfig>, Option<PathBuf>), ConfigError> {
        let path = Self::repo_config_path(repo_path);
        if !path.exists() {
            return Ok((None, None));
        }
        let config = Self::read_config(&path)?;
        Ok((Some(config), Some(path)))
    }

    fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Path `care config set` writes to.
    ///
    /// `$CARE_CONFIG` when set, otherwise `~/.care/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".care/config.toml"))
    }

    /// Repo config path under the given repository root.
    pub fn repo_config_path(repo_path: &Path) -> PathBuf {
        repo_path.join(".git/care/config.toml")
    }

    /// Write global config atomically.
    pub fn write_global(config: &GlobalConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::global_config_path()?;
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write repo config atomically.
    pub fn write_repo(repo_path: &Path, config: &RepoConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::repo_config_path(repo_path);
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write to a temp file in the same directory, then rename over the
    /// target.
    fn write_config_atomic<T: serde::Serialize>(
        path: &Path,
        config: &T,
    ) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Branch used when HEAD is detached.
    pub fn default_branch(&self) -> Option<&str> {
        self.repo
            .as_ref()
            .and_then(|r| r.default_branch.as_deref())
            .or(self.global.default_branch.as_deref())
    }

    /// Remote name.
    ///
    /// Defaults to "origin" if not configured.
    pub fn remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.remote.as_deref())
            .or(self.global.remote.as_deref())
            .unwrap_or("origin")
    }

    /// Configured merge tool, if any. Never assumed.
    pub fn merge_tool(&self) -> Option<&str> {
        self.repo
            .as_ref()
            .and_then(|r| r.merge_tool.as_deref())
            .or(self.global.merge_tool.as_deref())
    }

    /// Check if interactive mode is enabled by default.
    ///
    /// Defaults to `true` if not configured.
    pub fn interactive(&self) -> bool {
        self.global.interactive.unwrap_or(true)
    }

    /// Board credential: `$CARE_BOARD_TOKEN`, else the config file.
    pub fn board_credential(&self) -> Option<String> {
        match std::env::var(BOARD_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => Some(token),
            _ => self.board().and_then(|b| b.credential.clone()),
        }
    }

    /// GraphQL endpoint for the board.
    pub fn board_base_url(&self) -> &str {
        self.board()
            .and_then(|b| b.base_url.as_deref())
            .unwrap_or(DEFAULT_BOARD_URL)
    }

    /// Default board id.
    pub fn board_id(&self) -> Option<&str> {
        self.board().and_then(|b| b.board_id.as_deref())
    }

    /// Column id of the time tracker.
    pub fn time_column(&self) -> Option<&str> {
        self.board().and_then(|b| b.time_column.as_deref())
    }

    fn board(&self) -> Option<&BoardConfig> {
        self.global.board.as_ref()
    }

    /// Configured project templates.
    pub fn templates(&self) -> &[TemplateConfig] {
        &self.global.templates
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}
