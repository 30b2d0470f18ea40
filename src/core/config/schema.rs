//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$CARE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/care/config.toml`
//! 3. `~/.care/config.toml` (canonical write location)
//!
//! # Repo Config
//!
//! Located at `.git/care/config.toml`. Only the git workflow settings can
//! be overridden per repository.
//!
//! # Validation
//!
//! Values are checked after parsing: branch and remote names must be
//! usable on a git command line, the board URL must be http(s), and
//! template names must be unique.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// default_branch = "main"
/// remote = "origin"
/// merge_tool = "vimdiff"
/// interactive = true
///
/// [board]
/// board_id = "1234567890"
/// time_column = "time_tracking"
///
/// [[templates]]
/// name = "react-app"
/// path = "/home/me/templates/react-app"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Branch used when HEAD is detached
    pub default_branch: Option<String>,

    /// Remote name (default: "origin")
    pub remote: Option<String>,

    /// Tool passed to `git mergetool --tool`
    pub merge_tool: Option<String>,

    /// Default interactive mode
    pub interactive: Option<bool>,

    /// Task board settings
    pub board: Option<BoardConfig>,

    /// Project templates
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<TemplateConfig>,
}

/// Keys accepted by `care config get|set`.
pub const SETTABLE_KEYS: &[&str] = &[
    "default_branch",
    "remote",
    "merge_tool",
    "interactive",
    "board.credential",
    "board.base_url",
    "board.board_id",
    "board.time_column",
];

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_git_settings(
            self.default_branch.as_deref(),
            self.remote.as_deref(),
            self.merge_tool.as_deref(),
        )?;

        if let Some(board) = &self.board {
            board.validate()?;
        }

        let mut seen = std::collections::HashSet::new();
        for template in &self.templates {
            template.validate()?;
            if !seen.insert(template.name.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "template '{}' is defined more than once",
                    template.name
                )));
            }
        }

        Ok(())
    }

    /// Read a dotted key as text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unknown key.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let board = self.board.as_ref();
        let value = match key {
            "default_branch" => self.default_branch.clone(),
            "remote" => self.remote.clone(),
            "merge_tool" => self.merge_tool.clone(),
            "interactive" => self.interactive.map(|b| b.to_string()),
            "board.credential" => board.and_then(|b| b.credential.clone()),
            "board.base_url" => board.and_then(|b| b.base_url.clone()),
            "board.board_id" => board.and_then(|b| b.board_id.clone()),
            "board.time_column" => board.and_then(|b| b.time_column.clone()),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set a dotted key from text, then validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unknown key or a value
    /// that does not validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let text = Some(value.to_string());
        match key {
            "default_branch" => self.default_branch = text,
            "remote" => self.remote = text,
            "merge_tool" => self.merge_tool = text,
            "interactive" => {
                let parsed = match value {
                    "true" | "yes" | "1" => true,
                    "false" | "no" | "0" => false,
                    _ => {
                        return Err(ConfigError::InvalidValue(format!(
                            "interactive must be true or false, got '{}'",
                            value
                        )))
                    }
                };
                self.interactive = Some(parsed);
            }
            "board.credential" => self.board_mut().credential = text,
            "board.base_url" => self.board_mut().base_url = text,
            "board.board_id" => self.board_mut().board_id = text,
            "board.time_column" => self.board_mut().time_column = text,
            _ => return Err(unknown_key(key)),
        }
        self.validate()
    }

    fn board_mut(&mut self) -> &mut BoardConfig {
        self.board.get_or_insert_with(BoardConfig::default)
    }
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::InvalidValue(format!(
        "unknown key '{}', expected one of: {}",
        key,
        SETTABLE_KEYS.join(", ")
    ))
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// default_branch = "develop"
/// remote = "upstream"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Branch used when HEAD is detached
    pub default_branch: Option<String>,

    /// Remote name
    pub remote: Option<String>,

    /// Tool passed to `git mergetool --tool`
    pub merge_tool: Option<String>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_git_settings(
            self.default_branch.as_deref(),
            self.remote.as_deref(),
            self.merge_tool.as_deref(),
        )
    }
}

/// Task board settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BoardConfig {
    /// API token (`$CARE_BOARD_TOKEN` takes precedence)
    pub credential: Option<String>,

    /// GraphQL endpoint
    pub base_url: Option<String>,

    /// Default board
    pub board_id: Option<String>,

    /// Column holding the time tracker
    pub time_column: Option<String>,
}

impl BoardConfig {
    /// Validate the board settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.base_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "board.base_url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }
        if let Some(id) = &self.board_id {
            if id.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "board.board_id cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A named project template directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    /// Name shown in the template menu
    pub name: String,

    /// Directory copied into the new project
    pub path: PathBuf,
}

impl TemplateConfig {
    /// Validate the template entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "template name cannot be empty".to_string(),
            ));
        }
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "template '{}' has an empty path",
                self.name
            )));
        }
        Ok(())
    }
}

fn validate_git_settings(
    default_branch: Option<&str>,
    remote: Option<&str>,
    merge_tool: Option<&str>,
) -> Result<(), ConfigError> {
    if let Some(branch) = default_branch {
        if !is_plausible_ref_name(branch) {
            return Err(ConfigError::InvalidValue(format!(
                "invalid default_branch '{}'",
                branch
            )));
        }
    }
    if let Some(remote) = remote {
        if remote.is_empty() || !is_plausible_ref_name(remote) {
            return Err(ConfigError::InvalidValue(format!(
                "invalid remote '{}'",
                remote
            )));
        }
    }
    if let Some(tool) = merge_tool {
        if tool.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "merge_tool cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

/// A subset of `git check-ref-format` rules, enough to reject names that
/// would be parsed as options or ranges.
fn is_plausible_ref_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.starts_with('/')
        && !name.ends_with('/')
        && !name.ends_with(".lock")
        && !name.contains("..")
        && !name.contains("@{")
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c))
}
