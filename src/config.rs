//! Configuration management for anisearch
//!
//! Handles config file loading/saving and environment overrides.
//! Config is stored at ~/.config/anisearch/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::models::ResolveStrategy;

/// AniLibria title endpoint (search and lookup)
pub const DEFAULT_API_URL: &str = "https://api.anilibria.tv/v1/getTitle";
/// AniLibria torrent listing endpoint
pub const DEFAULT_TORRENT_URL: &str = "https://api.anilibria.tv/v1/getTorrent";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "ANISEARCH_API_URL";
pub const ENV_TORRENT_URL: &str = "ANISEARCH_TORRENT_URL";
pub const ENV_STRATEGY: &str = "ANISEARCH_STRATEGY";
pub const ENV_TIMEOUT_SECS: &str = "ANISEARCH_TIMEOUT_SECS";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Title search / lookup endpoint
    pub api_url: String,
    /// Torrent listing endpoint
    pub torrent_url: String,
    /// How AniList ids are resolved
    pub strategy: ResolveStrategy,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            torrent_url: DEFAULT_TORRENT_URL.to_string(),
            strategy: ResolveStrategy::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Get config file path (~/.config/anisearch/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("anisearch").join("config.toml"))
    }

    /// Load config from the default path, then apply environment overrides.
    ///
    /// A missing or unreadable file yields defaults.
    pub fn load() -> Self {
        Self::load_or_default(Self::path().as_deref())
    }

    /// Load config from `path` (if any), falling back to defaults, then apply
    /// environment overrides
    pub fn load_or_default(path: Option<&Path>) -> Self {
        Self::stored_or_default(path).apply_env()
    }

    /// Config as stored at `path`, without environment overrides.
    ///
    /// A missing or unreadable file yields defaults.
    pub fn stored_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(path) if path.exists() => Self::load_from(path).unwrap_or_else(|e| {
                warn!(error = %e, "ignoring unreadable config file");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Self = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        if config.timeout_secs == 0 {
            warn!(
                path = %path.display(),
                "timeout_secs must be positive, using {}", DEFAULT_TIMEOUT_SECS
            );
            config.timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Apply ANISEARCH_* environment variables
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Values that fail to parse are skipped.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        if let Some(url) = lookup(ENV_TORRENT_URL).filter(|v| !v.is_empty()) {
            self.torrent_url = url;
        }
        if let Some(raw) = lookup(ENV_STRATEGY) {
            match ResolveStrategy::from_str_loose(&raw) {
                Some(strategy) => self.strategy = strategy,
                None => warn!(value = %raw, "unknown {}", ENV_STRATEGY),
            }
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_secs = secs,
                _ => warn!(value = %raw, "invalid {}", ENV_TIMEOUT_SECS),
            }
        }
        self
    }
}
