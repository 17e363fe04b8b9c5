// crates/repsheet-core/tests/session_unit.rs
// ============================================================================
// Module: Session Identity Unit Tests
// Description: Tenant resolution across own-sheet and shared-sheet targets.
// Purpose: Pin the fail-closed identity rules every write depends on.
// ============================================================================

//! ## Overview
//! Exercises tenant resolution from the session view: own-sheet sessions
//! resolve to the account id, shared-sheet sessions to the granted profile
//! id, and anything unresolved fails closed. Resolution is recomputed per
//! call, so a sheet switch takes effect on the next operation.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use repsheet_core::SessionView;
use repsheet_core::SheetId;
use repsheet_core::StoreError;
use repsheet_core::TenantId;
use repsheet_core::resolve_tenant_id;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// View for a user whose own sheet is provisioned.
fn own_view() -> SessionView {
    SessionView::new(TenantId::new("user-1")).with_owned_sheet(SheetId::new("sheet-own"))
}

/// View targeting somebody else's sheet under a granted profile.
fn shared_view() -> SessionView {
    own_view()
        .with_active_sheet(SheetId::new("sheet-shared"))
        .with_profile_id(TenantId::new("profile-9"))
}

// ============================================================================
// SECTION: Resolution Branches
// ============================================================================

/// Targeting one's own sheet resolves to the account id.
#[test]
fn own_sheet_resolves_to_account_id() {
    let view = own_view().with_active_sheet(SheetId::new("sheet-own"));
    assert_eq!(resolve_tenant_id(&view), Ok(TenantId::new("user-1")));
}

/// No explicit target means the own sheet, which resolves to the account id.
#[test]
fn unset_target_defaults_to_own_sheet() {
    assert_eq!(resolve_tenant_id(&own_view()), Ok(TenantId::new("user-1")));
}

/// Targeting a shared sheet resolves to the granted profile id.
#[test]
fn shared_sheet_resolves_to_profile_id() {
    assert_eq!(
        resolve_tenant_id(&shared_view()),
        Ok(TenantId::new("profile-9"))
    );
}

// ============================================================================
// SECTION: Fail-Closed Paths
// ============================================================================

/// An unprovisioned owned sheet blocks resolution entirely.
#[test]
fn missing_owned_sheet_fails_closed() {
    let bare = SessionView::new(TenantId::new("user-1"));
    assert_eq!(resolve_tenant_id(&bare), Err(StoreError::NotReady));

    // Even with an explicit target, the own sheet must be known first.
    let targeted =
        SessionView::new(TenantId::new("user-1")).with_active_sheet(SheetId::new("sheet-x"));
    assert_eq!(resolve_tenant_id(&targeted), Err(StoreError::NotReady));
}

/// A shared target without a loaded profile fails closed.
#[test]
fn shared_sheet_without_profile_fails_closed() {
    let view = own_view().with_active_sheet(SheetId::new("sheet-shared"));
    assert_eq!(resolve_tenant_id(&view), Err(StoreError::NotReady));
}

// ============================================================================
// SECTION: Per-Call Recomputation
// ============================================================================

/// Resolution reflects the view at call time; switching sheets between calls
/// switches the resolved tenant.
#[test]
fn resolution_tracks_sheet_switches() {
    let mut view = shared_view();
    assert_eq!(
        resolve_tenant_id(&view),
        Ok(TenantId::new("profile-9"))
    );

    view.active_sheet_id = Some(SheetId::new("sheet-own"));
    assert_eq!(resolve_tenant_id(&view), Ok(TenantId::new("user-1")));

    view.active_sheet_id = None;
    assert_eq!(resolve_tenant_id(&view), Ok(TenantId::new("user-1")));
}

// ============================================================================
// SECTION: Active Sheet
// ============================================================================

/// The active sheet prefers the explicit target and falls back to the owned
/// sheet.
#[test]
fn active_sheet_prefers_target_then_owned() {
    let shared = shared_view();
    assert_eq!(
        shared.active_sheet().unwrap().as_str(),
        "sheet-shared"
    );

    let own = own_view();
    assert_eq!(own.active_sheet().unwrap().as_str(), "sheet-own");

    let bare = SessionView::new(TenantId::new("user-1"));
    assert_eq!(bare.active_sheet(), Err(StoreError::NotReady));
}
