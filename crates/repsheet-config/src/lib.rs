// crates/repsheet-config/src/lib.rs
// ============================================================================
// Module: Repsheet Config
// Description: Deployment configuration model, loading, and validation.
// Purpose: Turn one TOML file into validated settings for every crate.
// Dependencies: repsheet-core, repsheet-store-rest, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! This crate owns the deployment configuration: a TOML file with `[gateway]`,
//! `[retry]`, and `[sharing]` sections, loaded through fail-closed guards
//! (path length, file size, UTF-8) and validated before anything consumes it.
//! Each section converts into the runtime type its consumer expects, so the
//! core and REST crates never parse TOML themselves.
//!
//! ## Invariants
//! - `load` never returns settings that fail `validate`.
//! - Unknown fields anywhere in the file are a parse error.
//! - Credentials are resolved from the environment, never stored in files.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod error;
pub mod load;
pub mod settings;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::ConfigError;
pub use settings::GatewaySettings;
pub use settings::RepsheetConfig;
pub use settings::RetrySettings;
pub use settings::SharingSettings;
