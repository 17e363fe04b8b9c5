// crates/repsheet-core/examples/minimal.rs
// ============================================================================
// Module: Repsheet Minimal Example
// Description: Minimal end-to-end data-layer run using the in-memory backend.
// Purpose: Demonstrate store startup, dual-write recording, retry, and
//          sharing without a gateway.
// Dependencies: repsheet-core
// ============================================================================

//! ## Overview
//! Initializes the record store over the in-memory backend, records weight
//! samples through the dual-write service, reads the latest weight back,
//! manages a sharing grant, and wraps a flaky read in the retry executor.
//! This example is backend-agnostic and suitable for quick verification.

use std::sync::Arc;
use std::time::Duration;

use repsheet_core::BackendError;
use repsheet_core::ChangeBus;
use repsheet_core::GrantRole;
use repsheet_core::MemoryBackend;
use repsheet_core::NewWeightSample;
use repsheet_core::RecordId;
use repsheet_core::RecordStore;
use repsheet_core::RetryExecutor;
use repsheet_core::RetryPolicy;
use repsheet_core::SelectQuery;
use repsheet_core::SessionView;
use repsheet_core::SharingService;
use repsheet_core::SheetId;
use repsheet_core::TenantId;
use repsheet_core::Timestamp;
use repsheet_core::WeightSample;
use repsheet_core::WeightService;
use repsheet_core::WeightSource;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let backend = Arc::new(MemoryBackend::new());
    let store = Arc::new(RecordStore::new(backend.clone()));
    store.initialize()?;

    let bus = Arc::new(ChangeBus::new());
    let events = bus.subscribe();

    let view = SessionView::new(TenantId::new("user-1"))
        .with_owned_sheet(SheetId::new("sheet-own"));

    let weights = WeightService::new(store.clone(), bus.clone());
    weights.record_sample(
        &view,
        NewWeightSample {
            id: RecordId::new("w-1"),
            weight_kg: 80.5,
            recorded_at: Timestamp::UnixMillis(1_700_000_000_000),
        },
    )?;
    let receipt = weights.record_sample(
        &view,
        NewWeightSample {
            id: RecordId::new("w-2"),
            weight_kg: 81.2,
            recorded_at: Timestamp::UnixMillis(1_700_086_400_000),
        },
    )?;
    if !receipt.projection.is_applied() {
        return Err("projection refresh should land in memory".into());
    }

    let latest = weights.latest_weight(&view)?;
    if latest.source != WeightSource::History || latest.current != Some(81.2) {
        return Err("latest weight should come from history".into());
    }

    let sharing = SharingService::new(backend.clone(), bus);
    let grant = sharing.grant_access(&view, "coach@example.com", GrantRole::default())?;
    if sharing.list_permissions(&view)?.len() != 1 {
        return Err("sheet should hold exactly one grant".into());
    }
    sharing.revoke_access(&view, &grant.id)?;

    // A transient fault absorbed by the retry executor: one failure, then
    // the history read succeeds on the second attempt.
    backend.inject_failures(
        &BackendError::Unavailable {
            reason: "transient gateway hiccup".to_string(),
        },
        1,
    );
    let executor = RetryExecutor::new(RetryPolicy::new(3, Duration::from_millis(1)));
    let tenant = TenantId::new("user-1");
    let history = executor.run(|_| store.select::<WeightSample>(&tenant, &SelectQuery::new()))?;
    match history {
        Some(rows) if rows.len() == 2 => {}
        Some(_) => return Err("history should hold two samples".into()),
        None => return Err("retry should not exhaust".into()),
    }

    let _ = events.drain();
    Ok(())
}
