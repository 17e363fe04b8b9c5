// crates/repsheet-core/src/core/model.rs
// ============================================================================
// Module: Repsheet Domain Models
// Description: Typed records for profiles, weight history, workouts, and grants.
// Purpose: Bind the well-known tables to strongly typed row shapes.
// Dependencies: crate::core::{identifiers, record, time}, serde
// ============================================================================

//! ## Overview
//! Typed records for the well-known tables. `Profile` is the per-tenant
//! "current snapshot" projection (its row id equals the tenant id);
//! `WeightSample` and `Workout` are append-only history rows owned by a
//! tenant through their `user_id` column. `PermissionGrant` is the sharing
//! surface's ACL entry and is not table-backed.
//!
//! Rows may carry extra columns beyond these shapes; decoding ignores them.
//! Missing optional columns decode as `None`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::GrantId;
use crate::core::identifiers::RecordId;
use crate::core::identifiers::SheetId;
use crate::core::identifiers::TableId;
use crate::core::identifiers::TenantId;
use crate::core::record::TableRecord;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Profile Snapshot
// ============================================================================

/// Role a profile plays in the sharing model.
///
/// # Invariants
/// - Variants are stable for serialization and wire compatibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    /// Regular user tracking their own data.
    #[default]
    Student,
    /// Trainer who may hold grants into student sheets.
    Trainer,
}

impl ProfileRole {
    /// Returns the stable wire label for the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Trainer => "trainer",
        }
    }
}

/// Per-tenant profile snapshot: the canonical "current value" projection.
///
/// # Invariants
/// - The row id equals the owning tenant id; there is at most one profile
///   row per tenant under non-racing writers.
/// - `weight_kg` mirrors the most recent `weight_history` sample on a
///   best-effort basis and may be transiently stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Tenant identifier doubling as the row id.
    pub id: TenantId,
    /// Contact email, when known.
    pub email: Option<String>,
    /// Display name, when known.
    pub display_name: Option<String>,
    /// Sharing-model role; absent columns decode as student.
    #[serde(default)]
    pub role: ProfileRole,
    /// Latest known body weight in kilograms.
    pub weight_kg: Option<f64>,
    /// Height in centimeters, when recorded.
    pub height_cm: Option<f64>,
    /// Backing sheet owned by this tenant, once provisioned.
    pub sheet_id: Option<SheetId>,
    /// Timestamp of the event that last refreshed this snapshot.
    pub updated_at: Option<Timestamp>,
}

impl Profile {
    /// Creates an empty snapshot for a tenant, with all fields unset.
    #[must_use]
    pub fn new(id: TenantId) -> Self {
        Self {
            id,
            email: None,
            display_name: None,
            role: ProfileRole::default(),
            weight_kg: None,
            height_cm: None,
            sheet_id: None,
            updated_at: None,
        }
    }
}

impl TableRecord for Profile {
    fn table() -> TableId {
        TableId::new("profiles")
    }

    fn owner_column() -> &'static str {
        "id"
    }

    fn record_id(&self) -> RecordId {
        RecordId::new(self.id.as_str())
    }

    fn tenant_id(&self) -> TenantId {
        self.id.clone()
    }
}

// ============================================================================
// SECTION: Weight History
// ============================================================================

/// One append-only body-weight measurement.
///
/// # Invariants
/// - `recorded_at` orders samples within a tenant's history; ties resolve by
///   the backing store's stable sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSample {
    /// Record identifier generated by the caller.
    pub id: RecordId,
    /// Owning tenant.
    pub user_id: TenantId,
    /// Measured weight in kilograms.
    pub weight_kg: f64,
    /// When the measurement was taken, caller supplied.
    pub recorded_at: Timestamp,
}

impl TableRecord for WeightSample {
    fn table() -> TableId {
        TableId::new("weight_history")
    }

    fn owner_column() -> &'static str {
        "user_id"
    }

    fn record_id(&self) -> RecordId {
        self.id.clone()
    }

    fn tenant_id(&self) -> TenantId {
        self.user_id.clone()
    }
}

// ============================================================================
// SECTION: Workouts
// ============================================================================

/// One workout entry in a tenant's plan.
///
/// # Invariants
/// - `completed` defaults to false for rows that predate the column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    /// Record identifier generated by the caller.
    pub id: RecordId,
    /// Owning tenant.
    pub user_id: TenantId,
    /// Workout title shown to the user.
    pub title: String,
    /// Scheduled time, when planned ahead.
    pub scheduled_for: Option<Timestamp>,
    /// Whether the workout has been completed.
    #[serde(default)]
    pub completed: bool,
}

impl TableRecord for Workout {
    fn table() -> TableId {
        TableId::new("workouts")
    }

    fn owner_column() -> &'static str {
        "user_id"
    }

    fn record_id(&self) -> RecordId {
        self.id.clone()
    }

    fn tenant_id(&self) -> TenantId {
        self.user_id.clone()
    }
}

// ============================================================================
// SECTION: Permission Grants
// ============================================================================

/// Role attached to a sharing grant.
///
/// # Invariants
/// - Variants are stable for serialization and wire compatibility.
/// - The default role for new grants is writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantRole {
    /// Read-only access to the shared sheet.
    Reader,
    /// Read-write access to the shared sheet.
    #[default]
    Writer,
}

impl GrantRole {
    /// Returns the stable wire label for the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reader => "reader",
            Self::Writer => "writer",
        }
    }
}

/// One ACL entry on a tenant's backing sheet.
///
/// # Invariants
/// - `id` is the only handle for revocation; emails are display metadata
///   plus the grantee key, never a revocation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// Opaque grant identifier assigned by the sharing backend.
    pub id: GrantId,
    /// Grantee email address.
    pub email_address: String,
    /// Granted role.
    pub role: GrantRole,
    /// Grantee display name, when the backend knows one.
    pub display_name: Option<String>,
}
