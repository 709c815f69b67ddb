//! Layered application configuration.
//!
//! Values are resolved from built-in defaults, then
//! `~/.config/railhand/config.toml`, then `RAILHAND_*` environment variables
//! (`RAILHAND_CLAIM__ACK_TIMEOUT_MS=5000` overrides `claim.ack_timeout_ms`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{hand::LayoutConfig, models::CardColor};

const APP_DIR: &str = "railhand";
const ENV_PREFIX: &str = "RAILHAND";

const DEFAULT_CONFIG: &str = r#"# railhand configuration

[layout]
left = 20
top = 940
gutter_small = 20
gutter_big = 70
lift = 10
card_width = 60
section_width = 920
scroll_step = 50

[claim]
# Milliseconds to wait for the server before a claim is abandoned.
ack_timeout_ms = 10000

[demo]
# board_path = "board.json"
peer_latency_ms = 150
starting_coins = 45
starting_hand = ["blue", "blue", "green", "green", "green", "red", "rainbow"]
player_color = "red"
"#;

/// Claim submission settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimConfig {
    /// How long a submitted claim may wait for acknowledgment.
    pub ack_timeout_ms: u64,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: 10_000,
        }
    }
}

/// Settings for the local demo game played by the terminal client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Board JSON to load instead of the built-in board.
    pub board_path: Option<PathBuf>,
    /// Simulated round trip to the referee.
    pub peer_latency_ms: u64,
    pub starting_coins: u32,
    pub starting_hand: Vec<CardColor>,
    /// Marker color of the local player.
    pub player_color: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        use CardColor::*;
        Self {
            board_path: None,
            peer_latency_ms: 150,
            starting_coins: 45,
            starting_hand: vec![Blue, Blue, Green, Green, Green, Red, Rainbow],
            player_color: "red".to_string(),
        }
    }
}

/// Resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Hand geometry.
    pub layout: LayoutConfig,
    /// Claim submission.
    pub claim: ClaimConfig,
    /// Local demo game.
    pub demo: DemoConfig,
}

impl AppConfig {
    /// Load from the user config file and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load from `path` (which may be missing) and the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = ::config::Config::try_from(&AppConfig::default())
            .context("failed to serialise default configuration")?;
        let settings = ::config::Config::builder()
            .add_source(defaults)
            .add_source(::config::File::from(path.to_path_buf()).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("demo.starting_hand")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;
        let config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        debug!(path = %path.display(), ?config, "configuration loaded");
        Ok(config)
    }
}

/// Location of the user config file.
pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("could not determine the user config directory")?;
    Ok(base.join(APP_DIR).join("config.toml"))
}

/// Write the commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path()?;
    write_default_config(&path)?;
    Ok(path)
}

/// Write the default config to `path` unless a file is already there.
pub fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "default configuration written");
    Ok(true)
}
