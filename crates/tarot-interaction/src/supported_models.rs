//! Supported Gemini model versions and update procedures.
//!
//! # Supported Models (as of 2026-10-19)
//!
//! | Model ID | Tier | Notes |
//! |----------|------|-------|
//! | `gemini-2.5-flash` | Flash (default) | Intent analysis, readings and chat |
//! | `gemini-3-pro-preview` | Pro | Richer readings, slower |
//! | `gemini-2.5-pro` | Stable | Usable as a `pro` override |
//! | `gemini-2.5-flash-lite` | Stable lite | Usable as a `flash` override |
//!
//! Reference: <https://ai.google.dev/gemini-api/docs/models>
//!
//! # How to Add or Update Model Versions
//!
//! 1. **Core defaults** (`tarot-core/src/config.rs`)
//!    - `DEFAULT_GEMINI_MODEL`, `GEMINI_3_PRO_MODEL`
//!    - `ModelConfig::default()`
//! 2. **This module**: update the table above and [`SUPPORTED_GEMINI_MODELS`].
//!
//! ## Notes
//!
//! - Both tiers can be overridden in `config.toml` under `[models]`.
//! - Unknown ids are still sent to the API; the CLI only warns about them.
//! - Keep the Flash default on a stable version.

use tarot_core::config::{DEFAULT_GEMINI_MODEL, GEMINI_3_PRO_MODEL};

/// Model ids known to work with the REST endpoints used here.
pub const SUPPORTED_GEMINI_MODELS: &[&str] = &[
    DEFAULT_GEMINI_MODEL,
    GEMINI_3_PRO_MODEL,
    "gemini-2.5-pro",
    "gemini-2.5-flash-lite",
];

/// Whether `model` is listed in [`SUPPORTED_GEMINI_MODELS`].
pub fn is_supported_model(model: &str) -> bool {
    SUPPORTED_GEMINI_MODELS.contains(&model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_supported() {
        assert!(is_supported_model(DEFAULT_GEMINI_MODEL));
        assert!(is_supported_model(GEMINI_3_PRO_MODEL));
        assert!(!is_supported_model("gpt-5"));
    }
}
