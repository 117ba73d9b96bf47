//! Secret management service trait.
//!
//! Defines the interface for loading API credentials.

use crate::config::SecretConfig;

/// Service for managing secret configuration.
///
/// Implementations must never log or embed secret values in error messages.
#[async_trait::async_trait]
pub trait SecretService: Send + Sync {
    /// Loads the secret configuration.
    ///
    /// # Returns
    ///
    /// - `Ok(SecretConfig)`: Successfully loaded secrets
    /// - `Err(String)`: Failed to load (error message should not contain secrets)
    async fn load_secrets(&self) -> Result<SecretConfig, String>;
}
