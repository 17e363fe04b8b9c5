// crates/repsheet-config/src/load.rs
// ============================================================================
// Module: Config Loading
// Description: Fail-closed file loading with path, size, and encoding guards.
// Purpose: Keep untrusted config input bounded before it reaches the parser.
// Dependencies: toml
// ============================================================================

//! ## Overview
//! Loading runs a fixed pipeline: path guards, bounded read, UTF-8 check,
//! TOML parse, then settings validation. Every stage fails closed, and the
//! guards run before the filesystem is touched so a hostile path cannot
//! trigger oversized reads. An absent path skips the pipeline entirely and
//! yields validated defaults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::error::invalid;
use crate::settings::RepsheetConfig;

// ============================================================================
// SECTION: Guards
// ============================================================================

/// Maximum accepted config path length, in bytes.
const MAX_PATH_LENGTH: usize = 4_096;

/// Maximum accepted path component length, in bytes.
const MAX_COMPONENT_LENGTH: usize = 255;

/// Maximum accepted config file size, in bytes.
const MAX_FILE_SIZE: u64 = 1_048_576;

// ============================================================================
// SECTION: Loading
// ============================================================================

impl RepsheetConfig {
    /// Loads configuration from the given file, or defaults when absent.
    ///
    /// Passing `None` yields the built-in defaults without touching disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the path fails a guard, the file cannot
    /// be read or decoded, the TOML does not parse, or the parsed settings
    /// fail validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        };
        check_path(path)?;
        let bytes = read_limited(path)?;
        let text = String::from_utf8(bytes).map_err(|_| invalid("config file must be utf-8"))?;
        let config: Self = toml::from_str(&text).map_err(|error| ConfigError::Parse {
            reason: error.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Rejects paths that exceed length guards before any filesystem access.
fn check_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_PATH_LENGTH {
        return Err(invalid("config path exceeds max length"));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_COMPONENT_LENGTH {
            return Err(invalid("config path component too long"));
        }
    }
    Ok(())
}

/// Reads the config file while enforcing the size guard.
///
/// The advertised size is checked before the read and the read bytes are
/// checked after, so a file growing mid-read still fails closed.
fn read_limited(path: &Path) -> Result<Vec<u8>, ConfigError> {
    let metadata = fs::metadata(path).map_err(|error| ConfigError::Io {
        reason: format!("config metadata unavailable: {error}"),
    })?;
    if metadata.len() > MAX_FILE_SIZE {
        return Err(invalid("config file exceeds size limit"));
    }
    let bytes = fs::read(path).map_err(|error| ConfigError::Io {
        reason: format!("config read failed: {error}"),
    })?;
    if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > MAX_FILE_SIZE {
        return Err(invalid("config file exceeds size limit"));
    }
    Ok(bytes)
}
