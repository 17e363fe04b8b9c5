// crates/repsheet-core/src/core/mod.rs
// ============================================================================
// Module: Repsheet Core Types
// Description: Pure data types shared across the record store runtime.
// Purpose: Keep identifiers, records, queries, and models free of I/O concerns.
// Dependencies: serde, serde_json, bigdecimal, time
// ============================================================================

//! ## Overview
//! Pure data types for the record store: opaque identifiers, raw and typed
//! records, query descriptors with deterministic value ordering, domain
//! models, and caller-supplied timestamps. Nothing in this module performs
//! I/O or reads ambient state.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod identifiers;
pub mod model;
pub mod query;
pub mod record;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::GrantId;
pub use identifiers::RecordId;
pub use identifiers::SheetId;
pub use identifiers::TableId;
pub use identifiers::TenantId;
pub use model::GrantRole;
pub use model::PermissionGrant;
pub use model::Profile;
pub use model::ProfileRole;
pub use model::WeightSample;
pub use model::Workout;
pub use query::EqFilter;
pub use query::OrderBy;
pub use query::SelectQuery;
pub use record::RawRow;
pub use record::RowPatch;
pub use record::TableRecord;
pub use time::Timestamp;
