use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Informational label, logged at startup.
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            watch: WatchConfig::default(),
        }
    }
}

fn default_name() -> String {
    "csvwatch".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
    /// Directory to poll for new files
    #[serde(default = "default_watch_path")]
    pub path: PathBuf,

    /// Delay between poll cycles in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_watch_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_delay_ms() -> u64 {
    1000
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            path: default_watch_path(),
            delay_ms: default_delay_ms(),
        }
    }
}

/// Flat JSON layout: `{ "name": .., "watchPath": .., "watchDelay": .. }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_watch_path")]
    pub watch_path: PathBuf,

    #[serde(default = "default_delay_ms")]
    pub watch_delay: u64,
}

impl From<JsonConfig> for Config {
    fn from(json: JsonConfig) -> Self {
        Self {
            name: json.name,
            watch: WatchConfig {
                path: json.watch_path,
                delay_ms: json.watch_delay,
            },
        }
    }
}
