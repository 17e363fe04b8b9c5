// crates/repsheet-core/src/interfaces/mod.rs
// ============================================================================
// Module: Repsheet Interfaces
// Description: Backend-agnostic seams for tabular storage and sharing.
// Purpose: Define the contract surfaces used by the record store runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the record store integrates with a backing store
//! without embedding transport details. Implementations must fail closed:
//! anything they cannot classify maps into [`BackendError`], and the runtime
//! converts that into the public [`StoreError`] taxonomy exactly once at the
//! store boundary. Raw transport errors never reach callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::GrantId;
use crate::core::identifiers::SheetId;
use crate::core::identifiers::TableId;
use crate::core::identifiers::TenantId;
use crate::core::model::GrantRole;
use crate::core::model::PermissionGrant;
use crate::core::query::EqFilter;
use crate::core::query::SelectQuery;
use crate::core::record::RawRow;
use crate::core::record::RowPatch;
use crate::core::record::RowShapeError;

// ============================================================================
// SECTION: Error Taxonomy
// ============================================================================

/// Public error taxonomy for every record store and sharing operation.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Only `RemoteUnavailable` is retryable; all other kinds propagate
///   immediately through the retry executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Operation attempted before the store completed its startup handshake,
    /// or identity resolution ran without a loaded context.
    #[error("record store is not ready")]
    NotReady,
    /// Transient transport failure reaching the backing store.
    #[error("backing store unavailable: {reason}")]
    RemoteUnavailable {
        /// Human-readable transport failure description.
        reason: String,
    },
    /// A read that requires presence matched no row.
    #[error("no row matched in table {table}")]
    NotFound {
        /// Table the read addressed.
        table: TableId,
    },
    /// The backing store rejected the request, or the request failed a
    /// local admissibility check before reaching it.
    #[error("request denied: {reason}")]
    PermissionDenied {
        /// Rejection description surfaced verbatim to the caller.
        reason: String,
    },
    /// A row failed the typed boundary, or a write disagreed with the
    /// addressed tenant.
    #[error("row in table {table} violates expected shape: {detail}")]
    SchemaViolation {
        /// Table whose row or write failed the check.
        table: TableId,
        /// Human-readable description of the violation.
        detail: String,
    },
}

impl StoreError {
    /// Returns true when bounded retry may recover the operation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable { .. })
    }

    /// Converts a backend failure into the public taxonomy, attributing
    /// malformed payloads to the addressed table.
    #[must_use]
    pub fn from_backend(table: &TableId, error: BackendError) -> Self {
        match error {
            BackendError::Unavailable { reason } => Self::RemoteUnavailable { reason },
            BackendError::Denied { reason } => Self::PermissionDenied { reason },
            BackendError::Malformed { detail } => Self::SchemaViolation {
                table: table.clone(),
                detail,
            },
        }
    }
}

impl From<RowShapeError> for StoreError {
    fn from(error: RowShapeError) -> Self {
        Self::SchemaViolation {
            table: error.table,
            detail: error.detail,
        }
    }
}

/// Transport-level failure reported by backend implementations.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Implementations classify every failure; nothing escapes unmapped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backing store could not be reached or timed out.
    #[error("backing store unreachable: {reason}")]
    Unavailable {
        /// Transport failure description.
        reason: String,
    },
    /// The backing store rejected the request (authorization or validation).
    #[error("backing store rejected the request: {reason}")]
    Denied {
        /// Rejection description.
        reason: String,
    },
    /// The backing store answered with a payload that cannot be decoded.
    #[error("backing store returned a malformed response: {detail}")]
    Malformed {
        /// Decode failure description.
        detail: String,
    },
}

// ============================================================================
// SECTION: Tabular Backend
// ============================================================================

/// Row-oriented backing store addressed by tenant and table.
///
/// Implementations provide equality filtering, single-column ordering,
/// append, partial update by filter match, and delete by filter match. They
/// do not retry and they do not interpret row contents.
pub trait TabularBackend: Send + Sync {
    /// Returns the rows matching the query, ordered when requested.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the store cannot be reached or answers
    /// with an undecodable payload.
    fn select(
        &self,
        tenant: &TenantId,
        table: &TableId,
        query: &SelectQuery,
    ) -> Result<Vec<RawRow>, BackendError>;

    /// Appends one row to the table.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the store cannot be reached or rejects
    /// the row.
    fn insert(&self, tenant: &TenantId, table: &TableId, row: RawRow)
    -> Result<(), BackendError>;

    /// Merges the patch into every row matching the filter and returns the
    /// matched-row count. Zero is a valid outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the store cannot be reached or rejects
    /// the update.
    fn update(
        &self,
        tenant: &TenantId,
        table: &TableId,
        patch: &RowPatch,
        filter: &EqFilter,
    ) -> Result<u64, BackendError>;

    /// Removes every row matching the filter and returns the removed count.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the store cannot be reached or rejects
    /// the delete.
    fn delete(
        &self,
        tenant: &TenantId,
        table: &TableId,
        filter: &EqFilter,
    ) -> Result<u64, BackendError>;

    /// Reports backend readiness for the startup handshake.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Sharing Backend
// ============================================================================

/// ACL surface of a backing sheet, addressed by sheet id.
pub trait SharingBackend: Send + Sync {
    /// Lists every grant on the sheet.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the store cannot be reached or answers
    /// with an undecodable payload.
    fn list_grants(&self, sheet: &SheetId) -> Result<Vec<PermissionGrant>, BackendError>;

    /// Creates a grant for the email with the given role and returns it with
    /// its backend-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the store cannot be reached or rejects
    /// the grant.
    fn create_grant(
        &self,
        sheet: &SheetId,
        email: &str,
        role: GrantRole,
    ) -> Result<PermissionGrant, BackendError>;

    /// Removes the grant by id. Deleting an id the sheet does not hold is a
    /// success, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the store cannot be reached or rejects
    /// the revocation for a present grant.
    fn delete_grant(&self, sheet: &SheetId, grant: &GrantId) -> Result<(), BackendError>;
}
