// crates/repsheet-config/src/settings.rs
// ============================================================================
// Module: Config Settings
// Description: Typed configuration sections and their runtime conversions.
// Purpose: Carry validated deployment settings into the core and REST crates.
// Dependencies: repsheet-core, repsheet-store-rest, serde
// ============================================================================

//! ## Overview
//! The configuration model is three TOML sections under one root: `[gateway]`
//! for the REST backend, `[retry]` for the store retry policy, and
//! `[sharing]` for grant behavior. Every field has a default, so an empty
//! file and an absent file mean the same deployment. Each section converts
//! into the runtime type the consuming crate expects; conversions never
//! re-validate, because [`RepsheetConfig::validate`] runs before they are
//! reachable through [`RepsheetConfig::load`].
//!
//! ## Invariants
//! - Unknown TOML fields are rejected at parse time in every section.
//! - The bearer token never appears in the file; `api_key_env` names the
//!   environment variable that holds it.
//! - Validation bounds every numeric field before conversion.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use repsheet_core::RegrantPolicy;
use repsheet_core::RetryPolicy;
use repsheet_core::SharingConfig;
use repsheet_store_rest::RestBackendConfig;
use repsheet_store_rest::RestBackendError;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::error::invalid;

// ============================================================================
// SECTION: Root
// ============================================================================

/// Top-level configuration for a deployment.
///
/// # Invariants
/// - A default-constructed value passes validation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RepsheetConfig {
    /// Gateway connection section.
    pub gateway: GatewaySettings,
    /// Retry policy section.
    pub retry: RetrySettings,
    /// Sharing behavior section.
    pub sharing: SharingSettings,
}

impl RepsheetConfig {
    /// Validates bounds and policy across all sections.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first failed check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.timeout_ms == 0 {
            return Err(invalid("timeout_ms must be greater than zero"));
        }
        if self.gateway.timeout_ms > 600_000 {
            return Err(invalid("timeout_ms must be at most 600000"));
        }
        if self.gateway.max_response_bytes == 0 {
            return Err(invalid("max_response_bytes must be greater than zero"));
        }
        if self.gateway.max_response_bytes > 64 * 1024 * 1024 {
            return Err(invalid("max_response_bytes must be at most 67108864"));
        }
        if let Some(name) = &self.gateway.api_key_env
            && !is_plausible_env_name(name)
        {
            return Err(invalid("api_key_env must be a plausible variable name"));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("max_attempts must be greater than zero"));
        }
        if self.retry.max_attempts > 10 {
            return Err(invalid("max_attempts must be at most 10"));
        }
        if self.retry.base_delay_ms > 60_000 {
            return Err(invalid("base_delay_ms must be at most 60000"));
        }
        if self.sharing.relist_debounce_ms > 60_000 {
            return Err(invalid("relist_debounce_ms must be at most 60000"));
        }
        if self.gateway.base_url.is_some() {
            self.gateway.rest_config(None)?.validate().map_err(|error| match error {
                RestBackendError::InvalidConfig { reason }
                | RestBackendError::Client { reason } => invalid(&reason),
            })?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Gateway Section
// ============================================================================

/// Settings for the `[gateway]` section.
///
/// # Invariants
/// - `base_url` is optional here; constructing the REST backend requires it.
/// - `api_key_env` names a variable, never the credential itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GatewaySettings {
    /// Absolute base URL of the sheet gateway, when configured.
    pub base_url: Option<String>,
    /// Environment variable naming the bearer credential.
    pub api_key_env: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// Allow cleartext HTTP, for local development only.
    pub allow_http: bool,
    /// User agent presented to the gateway.
    pub user_agent: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        let defaults = RestBackendConfig::default();
        Self {
            base_url: None,
            api_key_env: None,
            timeout_ms: defaults.timeout_ms,
            max_response_bytes: defaults.max_response_bytes,
            allow_http: defaults.allow_http,
            user_agent: defaults.user_agent,
        }
    }
}

impl GatewaySettings {
    /// Builds backend settings, attaching the resolved credential.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when no base URL is configured.
    pub fn rest_config(&self, api_key: Option<String>) -> Result<RestBackendConfig, ConfigError> {
        let base_url = self
            .base_url
            .clone()
            .ok_or_else(|| invalid("gateway base_url is required"))?;
        Ok(RestBackendConfig {
            base_url,
            api_key,
            timeout_ms: self.timeout_ms,
            max_response_bytes: self.max_response_bytes,
            allow_http: self.allow_http,
            user_agent: self.user_agent.clone(),
        })
    }

    /// Resolves the bearer credential from the configured variable.
    ///
    /// Returns `None` when no variable is configured or the variable is
    /// unset; an unset credential is a deployment choice, not an error.
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        let name = self.api_key_env.as_deref()?;
        std::env::var(name).ok()
    }
}

/// Returns true when the name can address an environment variable.
fn is_plausible_env_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('=') && !name.chars().any(char::is_whitespace)
}

// ============================================================================
// SECTION: Retry Section
// ============================================================================

/// Settings for the `[retry]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetrySettings {
    /// Attempt ceiling per operation, including the first try.
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds.
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
        }
    }
}

impl RetrySettings {
    /// Builds the policy the retry executor runs with.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }
}

// ============================================================================
// SECTION: Sharing Section
// ============================================================================

/// Settings for the `[sharing]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SharingSettings {
    /// How granting to an already-granted address behaves.
    pub regrant: RegrantPolicy,
    /// Advisory wait after a grant mutation before re-listing, milliseconds.
    pub relist_debounce_ms: u64,
}

impl Default for SharingSettings {
    fn default() -> Self {
        Self {
            regrant: RegrantPolicy::default(),
            relist_debounce_ms: 1_500,
        }
    }
}

impl SharingSettings {
    /// Builds the sharing service configuration.
    #[must_use]
    pub const fn sharing_config(&self) -> SharingConfig {
        SharingConfig {
            regrant: self.regrant,
            relist_debounce: Duration::from_millis(self.relist_debounce_ms),
        }
    }
}
