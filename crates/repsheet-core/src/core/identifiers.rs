// crates/repsheet-core/src/core/identifiers.rs
// ============================================================================
// Module: Repsheet Identifiers
// Description: Canonical opaque identifiers for tenants, sheets, records, and grants.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout Repsheet.
//! Identifiers are opaque strings assigned by external systems (the auth
//! provider for tenants, the sheet gateway for sheets and grants) and
//! serialize transparently on the wire. No normalization or validation is
//! applied at construction; equality is exact string equality.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Tenant identifier: one user's logical data partition.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
/// - Assigned by the auth provider; never synthesized by the core.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TenantId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Sheet identifier for a tenant's backing spreadsheet document.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
/// - Assigned by the sheet gateway when the backing document is created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetId(String);

impl SheetId {
    /// Creates a new sheet identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SheetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SheetId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Record identifier, unique within its table and tenant scope.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
/// - Generated by the caller before insert; collision avoidance is the
///   caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new record identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Permission grant identifier used for revocation.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
/// - Assigned by the sharing backend when a grant is created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantId(String);

impl GrantId {
    /// Creates a new grant identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for GrantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for GrantId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Table identifier naming a row collection inside a backing sheet.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
/// - Well-known values are bound by [`crate::core::record::TableRecord`]
///   implementations (`profiles`, `weight_history`, `workouts`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    /// Creates a new table identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TableId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TableId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
