//! Configuration service implementation.
//!
//! Loads [`AppConfig`] from `~/.config/quantum-tarot/config.toml`. A missing
//! file yields the defaults; a malformed one is logged and also falls back
//! to the defaults.

use crate::paths::TarotPaths;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tarot_core::config::AppConfig;
use tarot_core::error::TarotError;

/// Configuration service that loads and caches the application config.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<AppConfig>>>,
    paths: TarotPaths,
}

impl ConfigService {
    /// Creates a new ConfigService.
    ///
    /// The configuration is loaded lazily on first access.
    pub fn new(base_path: Option<&Path>) -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            paths: TarotPaths::new(base_path),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> AppConfig {
        if let Ok(read_lock) = self.config.read() {
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load_config().unwrap_or_else(|e| {
            tracing::warn!("[Config] {}; using defaults", e);
            AppConfig::default()
        });

        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    /// Reads and parses `config.toml`.
    pub fn load_config(&self) -> Result<AppConfig, TarotError> {
        let config_path = self.config_path()?;
        if !config_path.exists() {
            tracing::debug!("[Config] {} not found", config_path.display());
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&content)?;
        tracing::info!("[Config] Loaded {}", config_path.display());
        Ok(config)
    }

    fn config_path(&self) -> Result<PathBuf, TarotError> {
        self.paths
            .config_file()
            .map_err(|e| TarotError::config(e.to_string()))
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new(None)
    }
}
