// crates/repsheet-store-rest/src/config.rs
// ============================================================================
// Module: Rest Backend Configuration
// Description: Connection settings and validation for the sheet gateway client.
// Purpose: Validate gateway endpoints before any request leaves the process.
// Dependencies: reqwest, serde, thiserror
// ============================================================================

//! ## Overview
//! Configuration for the blocking gateway client: base endpoint, bearer
//! credential, timeout, response cap, and scheme policy. Validation runs once
//! at client construction and fails closed, so a backend that constructs
//! successfully can always address its gateway.
//!
//! ## Invariants
//! - `base_url` must parse as an absolute URL with a host and no embedded
//!   credentials.
//! - Cleartext `http://` gateways are rejected unless `allow_http` is set.
//! - `timeout_ms` and `max_response_bytes` must be positive.

// ============================================================================
// SECTION: Imports
// ============================================================================

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while validating settings or constructing the client.
///
/// These cover construction time only; request-time failures surface through
/// the backend error taxonomy in `repsheet-core`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestBackendError {
    /// The settings failed validation before any request was made.
    #[error("invalid gateway config: {reason}")]
    InvalidConfig {
        /// Which check the settings failed.
        reason: String,
    },
    /// The HTTP client could not be built from otherwise valid settings.
    #[error("gateway client build failed: {reason}")]
    Client {
        /// Builder failure description.
        reason: String,
    },
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Connection settings for the sheet gateway.
///
/// # Invariants
/// - `allow_http = false` blocks cleartext `http://` gateways.
/// - `max_response_bytes` is enforced as a hard upper bound on response bodies.
/// - URLs with embedded credentials are rejected.
/// - `timeout_ms` applies to the full request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RestBackendConfig {
    /// Absolute base URL of the sheet gateway.
    pub base_url: String,
    /// Bearer token attached to every request when present.
    pub api_key: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// Allow cleartext HTTP (disabled by default).
    pub allow_http: bool,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for RestBackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            timeout_ms: 10_000,
            max_response_bytes: 1024 * 1024,
            allow_http: false,
            user_agent: "repsheet-store-rest/0.1".to_string(),
        }
    }
}

impl RestBackendConfig {
    /// Validates the settings and returns the parsed gateway base URL.
    ///
    /// # Errors
    ///
    /// Returns [`RestBackendError::InvalidConfig`] when the base URL does not
    /// parse, uses a forbidden scheme, embeds credentials, lacks a host, or a
    /// limit field is zero.
    pub fn validate(&self) -> Result<Url, RestBackendError> {
        let url = Url::parse(&self.base_url)
            .map_err(|_| invalid("gateway base url is not an absolute url"))?;
        match url.scheme() {
            "https" => {}
            "http" if self.allow_http => {}
            "http" => return Err(invalid("cleartext http gateway requires allow_http")),
            _ => return Err(invalid("unsupported gateway url scheme")),
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(invalid("gateway url credentials are not allowed"));
        }
        if url.host_str().is_none() {
            return Err(invalid("gateway url host required"));
        }
        if self.timeout_ms == 0 {
            return Err(invalid("timeout_ms must be positive"));
        }
        if self.max_response_bytes == 0 {
            return Err(invalid("max_response_bytes must be positive"));
        }
        Ok(url)
    }
}

/// Builds an invalid-config error with the given reason.
fn invalid(reason: &str) -> RestBackendError {
    RestBackendError::InvalidConfig {
        reason: reason.to_string(),
    }
}
