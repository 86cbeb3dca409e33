mod types;

pub use types::*;

use crate::watch::WatchTarget;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Load and validate configuration from a TOML file, or from a flat JSON
/// file when the path ends in `.json`.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = read_config(path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load and validate config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    let config = read_config_or_default(custom_path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Like [`load_config_or_default`] but without validation, for callers that
/// apply overrides first and validate the result themselves.
pub fn read_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return read_config(path);
    }

    let default_paths = ["./csvwatch.toml", "~/.config/csvwatch/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return read_config(path);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str::<JsonConfig>(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?
            .into()
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?
    };

    Ok(config)
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.watch.delay_ms == 0 {
        anyhow::bail!("Watch delay must be greater than 0 ms");
    }

    if config.watch.path.as_os_str().is_empty() {
        anyhow::bail!("Watch path cannot be empty");
    }

    // Listing failures are retried every cycle, so this is not fatal.
    if !config.watch.path.exists() {
        tracing::warn!("Watch path does not exist: {:?}", config.watch.path);
    }

    Ok(())
}

impl Config {
    /// Replace watch settings with command-line values where given.
    pub fn apply_overrides(&mut self, path: Option<PathBuf>, delay_ms: Option<u64>) {
        if let Some(path) = path {
            self.watch.path = path;
        }
        if let Some(delay_ms) = delay_ms {
            self.watch.delay_ms = delay_ms;
        }
    }

    /// The poll target described by this configuration.
    pub fn watch_target(&self) -> Result<WatchTarget> {
        let target = WatchTarget::new(
            self.watch.path.clone(),
            Duration::from_millis(self.watch.delay_ms),
        )?;
        Ok(target)
    }
}
