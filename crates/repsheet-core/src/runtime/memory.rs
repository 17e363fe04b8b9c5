// crates/repsheet-core/src/runtime/memory.rs
// ============================================================================
// Module: Repsheet Memory Backend
// Description: In-memory tabular and sharing backend with fault injection.
// Purpose: Deterministic backend for tests, examples, and offline use.
// Dependencies: crate::core, crate::interfaces, serde_json
// ============================================================================

//! ## Overview
//! [`MemoryBackend`] keeps every tenant's tables and every sheet's grant
//! list in process memory and implements both backend seams. Fault
//! injection queues backend errors that the next calls return, which lets
//! tests drive the retry and projection paths without a network.
//!
//! ## Invariants
//! - Tables are isolated per `(tenant, table)` pair; one tenant's rows are
//!   invisible to another's queries.
//! - Injected faults are consumed strictly in FIFO order, one per backend
//!   call, before the call touches any state.
//! - Grant ids are unique for the lifetime of the backend and never reused.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::MutexGuard;

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
use crate::interfaces::BackendError;
use crate::interfaces::SharingBackend;
use crate::interfaces::TabularBackend;

// ============================================================================
// SECTION: Backend State
// ============================================================================

/// Mutable state behind the backend mutex.
struct MemoryState {
    /// Rows keyed by `(tenant, table)`.
    tables: BTreeMap<(String, String), Vec<RawRow>>,
    /// Grants keyed by sheet id.
    grants: BTreeMap<String, Vec<PermissionGrant>>,
    /// Next grant id to allocate.
    next_grant: u64,
    /// Pending fault schedule, consumed FIFO one entry per call; `None`
    /// entries let the call through.
    faults: VecDeque<Option<BackendError>>,
}

// ============================================================================
// SECTION: Memory Backend
// ============================================================================

/// In-memory backend implementing both the tabular and sharing seams.
pub struct MemoryBackend {
    /// Backend state shared across the trait entry points.
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    /// Creates an empty backend with no tables, grants, or faults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                tables: BTreeMap::new(),
                grants: BTreeMap::new(),
                next_grant: 1,
                faults: VecDeque::new(),
            }),
        }
    }

    /// Queues `calls` copies of the given fault.
    ///
    /// Each subsequent backend call consumes one schedule entry and fails
    /// with the fault before touching any state.
    pub fn inject_failures(&self, error: &BackendError, calls: u32) {
        let mut state = self.lock_state();
        for _ in 0..calls {
            state.faults.push_back(Some(error.clone()));
        }
    }

    /// Lets the next `calls` backend calls pass before queued faults apply.
    ///
    /// Used to schedule a fault for the Nth call of a multi-step operation.
    pub fn pass_calls(&self, calls: u32) {
        let mut state = self.lock_state();
        for _ in 0..calls {
            state.faults.push_back(None);
        }
    }

    /// Seeds a row directly, bypassing the fault queue.
    pub fn seed_row(&self, tenant: &TenantId, table: &TableId, row: RawRow) {
        let mut state = self.lock_state();
        state
            .tables
            .entry(table_key(tenant, table))
            .or_default()
            .push(row);
    }

    /// Returns the number of rows in the tenant's table.
    #[must_use]
    pub fn row_count(&self, tenant: &TenantId, table: &TableId) -> usize {
        let state = self.lock_state();
        state
            .tables
            .get(&table_key(tenant, table))
            .map_or(0, Vec::len)
    }

    /// Returns the number of grants on the sheet.
    #[must_use]
    pub fn grant_count(&self, sheet: &SheetId) -> usize {
        let state = self.lock_state();
        state.grants.get(sheet.as_str()).map_or(0, Vec::len)
    }

    /// Pops the next schedule entry, yielding its fault if one is queued.
    fn take_fault(&self) -> Option<BackendError> {
        self.lock_state().faults.pop_front().flatten()
    }

    /// Locks the state, recovering from poisoning.
    ///
    /// Every mutation here is a single map edit, so a panicked caller
    /// cannot leave the maps half-written.
    fn lock_state(&self) -> MutexGuard<'_, MemoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the `(tenant, table)` key for the table map.
fn table_key(tenant: &TenantId, table: &TableId) -> (String, String) {
    (tenant.as_str().to_string(), table.as_str().to_string())
}

// ============================================================================
// SECTION: Tabular Seam
// ============================================================================

impl TabularBackend for MemoryBackend {
    fn select(
        &self,
        tenant: &TenantId,
        table: &TableId,
        query: &SelectQuery,
    ) -> Result<Vec<RawRow>, BackendError> {
        if let Some(fault) = self.take_fault() {
            return Err(fault);
        }
        let rows = {
            let state = self.lock_state();
            state
                .tables
                .get(&table_key(tenant, table))
                .cloned()
                .unwrap_or_default()
        };
        Ok(query.apply(rows))
    }

    fn insert(
        &self,
        tenant: &TenantId,
        table: &TableId,
        row: RawRow,
    ) -> Result<(), BackendError> {
        if let Some(fault) = self.take_fault() {
            return Err(fault);
        }
        let mut state = self.lock_state();
        state
            .tables
            .entry(table_key(tenant, table))
            .or_default()
            .push(row);
        Ok(())
    }

    fn update(
        &self,
        tenant: &TenantId,
        table: &TableId,
        patch: &RowPatch,
        filter: &EqFilter,
    ) -> Result<u64, BackendError> {
        if let Some(fault) = self.take_fault() {
            return Err(fault);
        }
        let mut state = self.lock_state();
        let mut changed = 0_u64;
        if let Some(rows) = state.tables.get_mut(&table_key(tenant, table)) {
            for row in rows.iter_mut() {
                if filter.matches(row) {
                    patch.apply(row);
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    fn delete(
        &self,
        tenant: &TenantId,
        table: &TableId,
        filter: &EqFilter,
    ) -> Result<u64, BackendError> {
        if let Some(fault) = self.take_fault() {
            return Err(fault);
        }
        let mut state = self.lock_state();
        let mut removed = 0_u64;
        if let Some(rows) = state.tables.get_mut(&table_key(tenant, table)) {
            let before = rows.len();
            rows.retain(|row| !filter.matches(row));
            removed = u64::try_from(before - rows.len()).unwrap_or(u64::MAX);
        }
        Ok(removed)
    }

    fn readiness(&self) -> Result<(), BackendError> {
        if let Some(fault) = self.take_fault() {
            return Err(fault);
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Sharing Seam
// ============================================================================

impl SharingBackend for MemoryBackend {
    fn list_grants(&self, sheet: &SheetId) -> Result<Vec<PermissionGrant>, BackendError> {
        if let Some(fault) = self.take_fault() {
            return Err(fault);
        }
        let state = self.lock_state();
        Ok(state.grants.get(sheet.as_str()).cloned().unwrap_or_default())
    }

    fn create_grant(
        &self,
        sheet: &SheetId,
        email: &str,
        role: GrantRole,
    ) -> Result<PermissionGrant, BackendError> {
        if let Some(fault) = self.take_fault() {
            return Err(fault);
        }
        let mut state = self.lock_state();
        let id = GrantId::new(format!("grant-{}", state.next_grant));
        state.next_grant += 1;
        let grant = PermissionGrant {
            id,
            email_address: email.to_string(),
            role,
            display_name: None,
        };
        state
            .grants
            .entry(sheet.as_str().to_string())
            .or_default()
            .push(grant.clone());
        Ok(grant)
    }

    fn delete_grant(&self, sheet: &SheetId, grant: &GrantId) -> Result<(), BackendError> {
        if let Some(fault) = self.take_fault() {
            return Err(fault);
        }
        let mut state = self.lock_state();
        if let Some(grants) = state.grants.get_mut(sheet.as_str()) {
            grants.retain(|entry| entry.id != *grant);
        }
        Ok(())
    }
}
