// crates/repsheet-store-rest/src/lib.rs
// ============================================================================
// Module: Repsheet Store REST
// Description: Blocking REST backend for the hosted sheet gateway.
// Purpose: Serve the core tabular and sharing seams over HTTP.
// Dependencies: repsheet-core, reqwest, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This crate ships the production backend for `repsheet-core`: a blocking
//! REST client addressing a hosted sheet gateway. It implements both backend
//! seams (tabular rows and sharing grants) plus the readiness probe, maps
//! every HTTP outcome into the core backend error taxonomy, and enforces
//! scheme, credential, timeout, and response-size policy from one validated
//! configuration.
//!
//! ## Invariants
//! - Construction validates the gateway settings; a built client never
//!   re-validates per request.
//! - Responses are size-capped and redirects are never followed.
//! - No `reqwest` error type appears in the public surface.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::RestBackend;
pub use config::RestBackendConfig;
pub use config::RestBackendError;

#[cfg(test)]
mod tests;
