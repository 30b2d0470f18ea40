//! config command - Get, set, or list configuration values
//!
//! All three act on the global file. Repo files are edited by hand.

use crate::core::config::{Config, GlobalConfig, SETTABLE_KEYS};
use crate::engine::Context;
use crate::ui::prompts;
use anyhow::{Context as _, Result};

/// Key whose value is never echoed.
const SECRET_KEY: &str = "board.credential";

/// Get a configuration value.
pub fn get(_ctx: &Context, key: &str) -> Result<()> {
    let (config, _) = Config::load_global_only().context("Failed to load config")?;
    let value = config.get(key)?;

    if let Some(value) = value {
        if key == SECRET_KEY {
            println!("{}", mask(&value));
        } else {
            println!("{}", value);
        }
    }
    // Key exists but has no value - exit silently
    Ok(())
}

/// Set a configuration value.
///
/// With no value, `board.credential` is read without echo.
pub fn set(ctx: &Context, key: &str, value: Option<&str>) -> Result<()> {
    let (mut config, _) = Config::load_global_only().context("Failed to load config")?;

    let value = match value {
        Some(value) => value.to_string(),
        None if key == SECRET_KEY => prompts::password("Board credential", ctx.interactive)
            .context("Failed to read credential")?,
        None => anyhow::bail!("A value is required for {}", key),
    };

    config.set(key, &value)?;
    let path = Config::write_global(&config).context("Failed to write config")?;

    if !ctx.quiet {
        let shown = if key == SECRET_KEY {
            mask(&value)
        } else {
            value
        };
        println!("Set {} = {} in {}", key, shown, path.display());
    }

    Ok(())
}

/// List every settable value, then the templates.
pub fn list(_ctx: &Context) -> Result<()> {
    let (config, path) = Config::load_global_only().context("Failed to load config")?;

    match &path {
        Some(path) => println!("# {}", path.display()),
        None => println!("# (no config file; defaults in effect)"),
    }
    for line in render(&config)? {
        println!("{}", line);
    }
    Ok(())
}

fn render(config: &GlobalConfig) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for key in SETTABLE_KEYS {
        let value = match config.get(key)? {
            Some(v) if *key == SECRET_KEY => mask(&v),
            Some(v) => v,
            None => "(not set)".to_string(),
        };
        lines.push(format!("{} = {}", key, value));
    }
    for template in &config.templates {
        lines.push(format!(
            "template {} = {}",
            template.name,
            template.path.display()
        ));
    }
    Ok(lines)
}

/// Keep the last four characters of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
