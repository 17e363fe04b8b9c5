// crates/repsheet-core/src/runtime/sync.rs
// ============================================================================
// Module: Repsheet Weight Sync
// Description: Dual-write pipeline for weight history and its projection.
// Purpose: Keep the append-only history authoritative and the profile
//          projection eventually consistent.
// Dependencies: crate::core, crate::interfaces, crate::runtime, serde
// ============================================================================

//! ## Overview
//! Recording a weight is a dual write. The append-only `weight_history` row
//! is the primary write and the only one that can fail the operation; the
//! denormalized `weight_kg` on the profile row is a best-effort projection
//! refresh whose outcome is reported, never raised. Reads prefer history and
//! fall back to the projection when history is empty, so a tenant coming
//! from an older data shape still sees a current weight.
//!
//! ## Invariants
//! - The history insert either fully succeeds or the operation aborts with
//!   no events and no projection attempt.
//! - A projection failure after a successful history insert is recorded in
//!   the receipt as [`ProjectionOutcome::Stale`]; there is no rollback.
//! - [`ChangeEvent::WeightAdded`] is published exactly once per successful
//!   history insert; [`ChangeEvent::ProfileUpdated`] only when the
//!   projection actually changed a row.
//! - Tenant identity is resolved from the session view at call time, once
//!   per operation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::RecordId;
use crate::core::identifiers::TenantId;
use crate::core::model::Profile;
use crate::core::model::WeightSample;
use crate::core::query::EqFilter;
use crate::core::query::SelectQuery;
use crate::core::record::RowPatch;
use crate::core::record::TableRecord;
use crate::core::time::Timestamp;
use crate::interfaces::StoreError;
use crate::runtime::events::ChangeBus;
use crate::runtime::events::ChangeEvent;
use crate::runtime::session::SessionView;
use crate::runtime::session::resolve_tenant_id;
use crate::runtime::store::RecordStore;

// ============================================================================
// SECTION: Write Inputs
// ============================================================================

/// Caller-supplied fields for a new weight sample.
///
/// The owning tenant is stamped by the service from the session view, so a
/// caller cannot address another tenant's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWeightSample {
    /// Unique id for the new history row.
    pub id: RecordId,
    /// Measured weight in kilograms.
    pub weight_kg: f64,
    /// Instant the measurement was taken.
    pub recorded_at: Timestamp,
}

// ============================================================================
// SECTION: Write Outcomes
// ============================================================================

/// Outcome of the best-effort projection refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionOutcome {
    /// No projection row existed; one was created.
    Created,
    /// The existing projection row was patched.
    Updated,
    /// The projection was left stale; the reason says why.
    Stale {
        /// Why the refresh did not land.
        reason: String,
    },
}

impl ProjectionOutcome {
    /// True when the projection row was created or patched.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

/// Receipt for a recorded weight sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightWriteReceipt {
    /// Tenant the sample was recorded under.
    pub tenant_id: TenantId,
    /// Id of the appended history row.
    pub sample_id: RecordId,
    /// What happened to the profile projection.
    pub projection: ProjectionOutcome,
}

// ============================================================================
// SECTION: Read Outcomes
// ============================================================================

/// Where a reported latest weight came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightSource {
    /// The newest `weight_history` row.
    History,
    /// The denormalized profile field; history was empty.
    Profile,
    /// Neither history nor profile held a weight.
    Missing,
}

/// Latest known weight for a tenant, with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatestWeight {
    /// Most recent weight in kilograms, when one is known.
    pub current: Option<f64>,
    /// Second most recent history weight, for trend display.
    pub previous: Option<f64>,
    /// Which layer supplied `current`.
    pub source: WeightSource,
}

// ============================================================================
// SECTION: Weight Service
// ============================================================================

/// Dual-write service for weight history and the profile projection.
pub struct WeightService {
    /// Readiness-gated store the writes go through.
    store: Arc<RecordStore>,
    /// Bus notified after successful writes.
    bus: Arc<ChangeBus>,
}

impl WeightService {
    /// Creates the service over a store and a change bus.
    #[must_use]
    pub fn new(store: Arc<RecordStore>, bus: Arc<ChangeBus>) -> Self {
        Self { store, bus }
    }

    /// Records a weight sample for the session's resolved tenant.
    ///
    /// Appends the history row first; only that write can fail the call.
    /// The profile projection is then refreshed best-effort and its outcome
    /// reported in the receipt. Events fire after the history insert:
    /// [`ChangeEvent::WeightAdded`] always, [`ChangeEvent::ProfileUpdated`]
    /// when the projection changed a row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotReady`] when the session or store is not
    /// ready, and any store error raised by the history insert. Projection
    /// failures never surface as errors.
    pub fn record_sample(
        &self,
        view: &SessionView,
        sample: NewWeightSample,
    ) -> Result<WeightWriteReceipt, StoreError> {
        let tenant = resolve_tenant_id(view)?;
        let record = WeightSample {
            id: sample.id.clone(),
            user_id: tenant.clone(),
            weight_kg: sample.weight_kg,
            recorded_at: sample.recorded_at,
        };
        self.store.insert(&tenant, &record)?;
        let projection = self.refresh_projection(&tenant, &sample);
        self.bus.publish(ChangeEvent::WeightAdded);
        if projection.is_applied() {
            self.bus.publish(ChangeEvent::ProfileUpdated);
        }
        Ok(WeightWriteReceipt {
            tenant_id: tenant,
            sample_id: sample.id,
            projection,
        })
    }

    /// Returns the latest known weight for the session's resolved tenant.
    ///
    /// History is authoritative: the newest row supplies `current` and the
    /// one before it `previous`. When history is empty the profile's
    /// denormalized weight is reported with no `previous`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotReady`] when the session or store is not
    /// ready, and any store error raised while reading.
    pub fn latest_weight(&self, view: &SessionView) -> Result<LatestWeight, StoreError> {
        let tenant = resolve_tenant_id(view)?;
        let history = SelectQuery::new()
            .with_eq(WeightSample::owner_column(), tenant.as_str())
            .with_order("recorded_at", false);
        let samples: Vec<WeightSample> = self.store.select(&tenant, &history)?;
        if let Some(newest) = samples.first() {
            return Ok(LatestWeight {
                current: Some(newest.weight_kg),
                previous: samples.get(1).map(|sample| sample.weight_kg),
                source: WeightSource::History,
            });
        }
        let profiles: Vec<Profile> = self.store.select(
            &tenant,
            &SelectQuery::new().with_eq(Profile::owner_column(), tenant.as_str()),
        )?;
        let projected = profiles.first().and_then(|profile| profile.weight_kg);
        Ok(LatestWeight {
            current: projected,
            previous: None,
            source: if projected.is_some() {
                WeightSource::Profile
            } else {
                WeightSource::Missing
            },
        })
    }

    /// Refreshes the profile projection for a freshly recorded sample.
    ///
    /// Patches the existing projection row when one exists, creates it when
    /// none does, and reports a stale projection when neither lands.
    fn refresh_projection(
        &self,
        tenant: &TenantId,
        sample: &NewWeightSample,
    ) -> ProjectionOutcome {
        let lookup = SelectQuery::new().with_eq(Profile::owner_column(), tenant.as_str());
        let existing: Vec<Profile> = match self.store.select(tenant, &lookup) {
            Ok(profiles) => profiles,
            Err(error) => {
                return ProjectionOutcome::Stale {
                    reason: error.to_string(),
                }
            }
        };
        if existing.is_empty() {
            let mut profile = Profile::new(tenant.clone());
            profile.weight_kg = Some(sample.weight_kg);
            profile.updated_at = Some(sample.recorded_at);
            return match self.store.insert(tenant, &profile) {
                Ok(()) => ProjectionOutcome::Created,
                Err(error) => ProjectionOutcome::Stale {
                    reason: error.to_string(),
                },
            };
        }
        let patch = RowPatch::new()
            .set("weight_kg", sample.weight_kg)
            .set("updated_at", serde_json::to_value(sample.recorded_at).unwrap_or(Value::Null));
        let filter = EqFilter::new(Profile::owner_column(), tenant.as_str());
        match self.store.update::<Profile>(tenant, &patch, &filter) {
            Ok(0) => ProjectionOutcome::Stale {
                reason: "no projection row matched the owner filter".to_string(),
            },
            Ok(_) => ProjectionOutcome::Updated,
            Err(error) => ProjectionOutcome::Stale {
                reason: error.to_string(),
            },
        }
    }
}
