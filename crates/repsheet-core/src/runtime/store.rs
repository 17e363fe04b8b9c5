// crates/repsheet-core/src/runtime/store.rs
// ============================================================================
// Module: Repsheet Record Store
// Description: Readiness-gated typed CRUD over a tabular backend.
// Purpose: Enforce the store lifecycle and tenant scoping for every call.
// Dependencies: crate::core, crate::interfaces, serde
// ============================================================================

//! ## Overview
//! [`RecordStore`] is the single entry point for table reads and writes. It
//! owns the store lifecycle ([`StorePhase`]) and refuses every operation
//! until the backend has been probed and found ready. Rows cross the seam as
//! raw JSON objects; this layer decodes them into typed records at the
//! boundary and rejects malformed rows instead of passing them through.
//!
//! ## Invariants
//! - Every operation is gated on [`StorePhase::Ready`]; before that it
//!   fails with [`StoreError::NotReady`] without touching the backend.
//! - Operation failures do not change the phase. Only initialization and
//!   an explicit [`RecordStore::fail`] move it, so one flaky call cannot
//!   take the store down.
//! - A failed store stays failed until the owner re-initializes it; there
//!   is no background recovery.
//! - Writes are scoped to the tenant resolved for the current operation; a
//!   record claiming a different owner is rejected before it reaches the
//!   backend.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::TenantId;
use crate::core::query::EqFilter;
use crate::core::query::SelectQuery;
use crate::core::record::RowPatch;
use crate::core::record::TableRecord;
use crate::core::record::decode_rows;
use crate::core::record::encode_row;
use crate::interfaces::BackendError;
use crate::interfaces::StoreError;
use crate::interfaces::TabularBackend;

// ============================================================================
// SECTION: Store Phase
// ============================================================================

/// Lifecycle phase of the record store.
///
/// # Invariants
/// - Phases only move through initialization or [`RecordStore::fail`];
///   individual operation failures never change the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorePhase {
    /// No initialization has been attempted yet.
    Uninitialized,
    /// An initialization probe is in flight.
    Initializing,
    /// The backend answered its readiness probe; operations are allowed.
    Ready,
    /// Initialization failed or the owner marked the store down.
    Failed,
}

impl StorePhase {
    /// Returns the canonical wire name for the phase.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    /// True once the store accepts operations.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// True while an initialization probe is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Initializing)
    }
}

// ============================================================================
// SECTION: Record Store
// ============================================================================

/// Readiness-gated typed CRUD facade over a [`TabularBackend`].
pub struct RecordStore {
    /// Backend that holds the actual rows.
    backend: Arc<dyn TabularBackend>,
    /// Current lifecycle phase.
    phase: Mutex<StorePhase>,
}

impl RecordStore {
    /// Creates an uninitialized store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn TabularBackend>) -> Self {
        Self {
            backend,
            phase: Mutex::new(StorePhase::Uninitialized),
        }
    }

    /// Returns the current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> StorePhase {
        *self.lock_phase()
    }

    /// True once initialization has completed successfully.
    #[must_use]
    pub fn initialized(&self) -> bool {
        self.phase().is_ready()
    }

    /// True while an initialization probe is in flight.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.phase().is_loading()
    }

    /// Probes the backend and moves the store to ready.
    ///
    /// May be called again after a failure; a successful probe moves the
    /// phase back to [`StorePhase::Ready`].
    ///
    /// # Errors
    ///
    /// Returns the mapped probe error and leaves the store in
    /// [`StorePhase::Failed`] when the backend is not reachable or rejects
    /// the probe.
    pub fn initialize(&self) -> Result<(), StoreError> {
        *self.lock_phase() = StorePhase::Initializing;
        match self.backend.readiness() {
            Ok(()) => {
                *self.lock_phase() = StorePhase::Ready;
                Ok(())
            }
            Err(error) => {
                *self.lock_phase() = StorePhase::Failed;
                Err(map_probe_error(error))
            }
        }
    }

    /// Marks the store failed until the owner re-initializes it.
    pub fn fail(&self) {
        *self.lock_phase() = StorePhase::Failed;
    }

    /// Reads every matching record from the tenant's table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotReady`] before initialization, a mapped
    /// backend error on transport or authorization failure, and
    /// [`StoreError::SchemaViolation`] when a returned row does not decode
    /// into `T`.
    pub fn select<T: TableRecord>(
        &self,
        tenant: &TenantId,
        query: &SelectQuery,
    ) -> Result<Vec<T>, StoreError> {
        self.ensure_ready()?;
        let table = T::table();
        let rows = self
            .backend
            .select(tenant, &table, query)
            .map_err(|error| StoreError::from_backend(&table, error))?;
        Ok(decode_rows(rows)?)
    }

    /// Reads the first matching record, requiring it to exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, in addition to
    /// every error [`RecordStore::select`] can return.
    pub fn select_one<T: TableRecord>(
        &self,
        tenant: &TenantId,
        query: &SelectQuery,
    ) -> Result<T, StoreError> {
        self.select::<T>(tenant, query)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound { table: T::table() })
    }

    /// Appends a record to the tenant's table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SchemaViolation`] when the record claims an
    /// owner other than the resolved tenant, plus readiness and backend
    /// errors.
    pub fn insert<T: TableRecord>(
        &self,
        tenant: &TenantId,
        record: &T,
    ) -> Result<(), StoreError> {
        self.ensure_ready()?;
        let table = T::table();
        if record.tenant_id() != *tenant {
            return Err(StoreError::SchemaViolation {
                table,
                detail: "record owner does not match the resolved tenant".to_string(),
            });
        }
        let row = encode_row(record)?;
        self.backend
            .insert(tenant, &table, row)
            .map_err(|error| StoreError::from_backend(&table, error))
    }

    /// Patches every row matching the filter in the tenant's table.
    ///
    /// Returns the number of rows changed; a miss is zero, not an error.
    /// An empty patch is a no-op that reports zero without a backend call.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SchemaViolation`] when the patch reassigns the
    /// owner column, plus readiness and backend errors.
    pub fn update<T: TableRecord>(
        &self,
        tenant: &TenantId,
        patch: &RowPatch,
        filter: &EqFilter,
    ) -> Result<u64, StoreError> {
        self.ensure_ready()?;
        if patch.is_empty() {
            return Ok(0);
        }
        let table = T::table();
        if let Some(owner) = patch.get(T::owner_column())
            && owner.as_str() != Some(tenant.as_str())
        {
            return Err(StoreError::SchemaViolation {
                table,
                detail: "patch reassigns the owner column".to_string(),
            });
        }
        self.backend
            .update(tenant, &table, patch, filter)
            .map_err(|error| StoreError::from_backend(&table, error))
    }

    /// Deletes every row matching the filter in the tenant's table.
    ///
    /// Returns the number of rows removed; a miss is zero, not an error.
    ///
    /// # Errors
    ///
    /// Returns readiness and mapped backend errors.
    pub fn delete<T: TableRecord>(
        &self,
        tenant: &TenantId,
        filter: &EqFilter,
    ) -> Result<u64, StoreError> {
        self.ensure_ready()?;
        let table = T::table();
        self.backend
            .delete(tenant, &table, filter)
            .map_err(|error| StoreError::from_backend(&table, error))
    }

    /// Rejects the operation unless the store is ready.
    fn ensure_ready(&self) -> Result<(), StoreError> {
        if self.phase().is_ready() {
            Ok(())
        } else {
            Err(StoreError::NotReady)
        }
    }

    /// Locks the phase, recovering from poisoning.
    ///
    /// The phase is a single copyable flag, so a panicked initializer
    /// cannot leave it structurally inconsistent.
    fn lock_phase(&self) -> MutexGuard<'_, StorePhase> {
        match self.phase.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// ============================================================================
// SECTION: Probe Error Mapping
// ============================================================================

/// Maps a readiness-probe failure onto the store error surface.
///
/// Probe failures carry no table context, so malformed probe responses are
/// reported as unavailability rather than a schema violation.
fn map_probe_error(error: BackendError) -> StoreError {
    match error {
        BackendError::Unavailable { reason } => StoreError::RemoteUnavailable { reason },
        BackendError::Denied { reason } => StoreError::PermissionDenied { reason },
        BackendError::Malformed { detail } => StoreError::RemoteUnavailable { reason: detail },
    }
}
