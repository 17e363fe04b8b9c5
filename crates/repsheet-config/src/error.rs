// crates/repsheet-config/src/error.rs
// ============================================================================
// Module: Config Errors
// Description: Error taxonomy for configuration loading and validation.
// Purpose: Distinguish io, parse, and validation failures for callers.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! One error enum covers the whole configuration pipeline: reading the file,
//! parsing the TOML, and validating the parsed settings. Callers that only
//! want a message can display the error; callers that branch (retry a read,
//! surface a validation hint) match the variant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The config file could not be read from disk.
    #[error("config io failure: {reason}")]
    Io {
        /// Filesystem failure description.
        reason: String,
    },
    /// The config file did not parse as the expected TOML shape.
    #[error("config parse failure: {reason}")]
    Parse {
        /// Parser failure description, including unknown-field rejections.
        reason: String,
    },
    /// A guard or bounds check rejected the settings.
    #[error("invalid config: {reason}")]
    Invalid {
        /// Which check the settings failed.
        reason: String,
    },
}

/// Builds an invalid-config error with the given reason.
pub(crate) fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_string(),
    }
}
