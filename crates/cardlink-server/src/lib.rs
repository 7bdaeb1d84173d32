//! Runtime pieces of the cardlink server: configuration and the staleness
//! scan scheduler. The binary in `main.rs` wires them to the API router.

pub mod scheduler;

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;

/// Prefix for environment overrides, e.g. `CARDLINK_PORT=8080`.
pub const ENV_PREFIX: &str = "CARDLINK";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Hours between staleness scans; `0` disables the scheduler.
  #[serde(default = "default_scan_interval_hours")]
  pub scan_interval_hours: u64,
  /// Run one scan as soon as the server starts.
  #[serde(default)]
  pub scan_on_startup:     bool,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 3000 }

fn default_scan_interval_hours() -> u64 { 24 }

impl ServerConfig {
  /// Layer the TOML file at `path` (optional) under `CARDLINK_*` variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn scan_interval(&self) -> Option<Duration> {
    (self.scan_interval_hours > 0)
      .then(|| Duration::from_secs(self.scan_interval_hours * 60 * 60))
  }

  /// `store_path` with a leading `~/` expanded to `$HOME`.
  pub fn resolved_store_path(&self) -> PathBuf {
    let raw = self.store_path.to_string_lossy();
    if let Some(rest) = raw.strip_prefix("~/")
      && let Ok(home) = std::env::var("HOME")
    {
      return PathBuf::from(home).join(rest);
    }
    self.store_path.clone()
  }
}
