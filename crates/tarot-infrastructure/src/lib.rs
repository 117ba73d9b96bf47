//! File-backed configuration and secrets for quantum-tarot.

pub mod config_service;
pub mod paths;
pub mod secret_service;

pub use config_service::ConfigService;
pub use paths::{PathError, TarotPaths};
pub use secret_service::SecretServiceImpl;
