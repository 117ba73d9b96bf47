//! Unified path management for quantum-tarot configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/quantum-tarot/     # Config directory
//! ├── config.toml              # Application configuration
//! └── secret.json              # API keys
//! ```

use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "quantum-tarot";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolves configuration file locations.
///
/// With a base path every file lives directly under it, which keeps tests
/// away from the real home directory.
#[derive(Debug, Clone, Default)]
pub struct TarotPaths {
    base: Option<PathBuf>,
}

impl TarotPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the configuration directory (e.g. `~/.config/quantum-tarot/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path to `secret.json`.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600).
    pub fn secret_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("secret.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_dir() {
        if let Ok(config_dir) = TarotPaths::default().config_dir() {
            assert!(config_dir.ends_with(APP_DIR_NAME));
        }
    }

    #[test]
    fn test_base_path_override() {
        let dir = tempfile::tempdir().unwrap();
        let paths = TarotPaths::new(Some(dir.path()));
        assert_eq!(paths.config_file().unwrap(), dir.path().join("config.toml"));
        assert_eq!(paths.secret_file().unwrap(), dir.path().join("secret.json"));
    }
}
