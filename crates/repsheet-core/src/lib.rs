// crates/repsheet-core/src/lib.rs
// ============================================================================
// Module: Repsheet Core
// Description: Typed record store, retry, sharing, and sync over a sheet backend.
// Purpose: Provide database-like semantics over a spreadsheet-style tenant store.
// Dependencies: serde, serde_json, thiserror, bigdecimal, time
// ============================================================================

//! ## Overview
//! Repsheet Core is the data-access and sharing layer for a sheet-backed
//! multi-tenant record store. It layers typed queries (equality filtering,
//! stable ordering), a bounded-retry executor, per-operation tenant identity
//! resolution, a grant-based sharing registry, and a best-effort dual-write
//! synchronizer on top of a backend that natively guarantees none of those.
//!
//! ## Layer Responsibilities
//! - `core` holds pure data types: identifiers, records, queries, models.
//! - `interfaces` defines the backend seams and the public error taxonomy.
//! - `runtime` implements the store facade, retry, sessions, events, sync,
//!   sharing, and the in-memory reference backend.
//!
//! ## Invariants
//! - No raw transport error crosses the store boundary; every failure maps
//!   into [`StoreError`].
//! - Every write addresses exactly one tenant; owner columns that disagree
//!   with the addressed tenant are rejected before the backend sees them.
//! - The core never reads wall-clock time; callers supply timestamps.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::identifiers::GrantId;
pub use crate::core::identifiers::RecordId;
pub use crate::core::identifiers::SheetId;
pub use crate::core::identifiers::TableId;
pub use crate::core::identifiers::TenantId;
pub use crate::core::model::GrantRole;
pub use crate::core::model::PermissionGrant;
pub use crate::core::model::Profile;
pub use crate::core::model::ProfileRole;
pub use crate::core::model::WeightSample;
pub use crate::core::model::Workout;
pub use crate::core::query::EqFilter;
pub use crate::core::query::OrderBy;
pub use crate::core::query::SelectQuery;
pub use crate::core::record::RawRow;
pub use crate::core::record::RowPatch;
pub use crate::core::record::TableRecord;
pub use crate::core::time::Timestamp;
pub use crate::interfaces::BackendError;
pub use crate::interfaces::SharingBackend;
pub use crate::interfaces::StoreError;
pub use crate::interfaces::TabularBackend;
pub use crate::runtime::events::ChangeBus;
pub use crate::runtime::events::ChangeEvent;
pub use crate::runtime::events::Subscription;
pub use crate::runtime::memory::MemoryBackend;
pub use crate::runtime::retry::RetryAttempt;
pub use crate::runtime::retry::RetryExecutor;
pub use crate::runtime::retry::RetryPolicy;
pub use crate::runtime::session::SessionView;
pub use crate::runtime::session::resolve_tenant_id;
pub use crate::runtime::sharing::RegrantPolicy;
pub use crate::runtime::sharing::SharingConfig;
pub use crate::runtime::sharing::SharingService;
pub use crate::runtime::store::RecordStore;
pub use crate::runtime::store::StorePhase;
pub use crate::runtime::sync::LatestWeight;
pub use crate::runtime::sync::NewWeightSample;
pub use crate::runtime::sync::ProjectionOutcome;
pub use crate::runtime::sync::WeightService;
pub use crate::runtime::sync::WeightSource;
pub use crate::runtime::sync::WeightWriteReceipt;
