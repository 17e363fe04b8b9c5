// crates/repsheet-core/src/runtime/session.rs
// ============================================================================
// Module: Repsheet Session View
// Description: Per-operation session snapshot and tenant identity resolution.
// Purpose: Derive the owning tenant for every read and write, fail-closed.
// Dependencies: crate::core, crate::interfaces, serde
// ============================================================================

//! ## Overview
//! Every store operation runs against a [`SessionView`]: the signed-in user,
//! their profile, the sheet they are currently targeting, and the sheet they
//! own. [`resolve_tenant_id`] derives the row-owner tenant from that snapshot
//! on every call, so switching between an own sheet and a shared sheet takes
//! effect immediately without cache invalidation.
//!
//! ## Invariants
//! - Identity is resolved per operation from the view; nothing caches the
//!   result across writes.
//! - An unset owned sheet means the session is not ready; resolution
//!   fails closed with [`StoreError::NotReady`].
//! - Targeting one's own sheet yields the account id; targeting a shared
//!   sheet yields the profile id granted on that sheet.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::SheetId;
use crate::core::identifiers::TenantId;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Session View
// ============================================================================

/// Snapshot of the signed-in session an operation runs under.
///
/// # Invariants
/// - `user_id` is always present; the remaining fields fill in as the
///   session loads.
/// - `active_sheet_id` unset means the user is targeting their own sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    /// Account id of the signed-in user.
    pub user_id: TenantId,
    /// Profile id granted on the active sheet, when one is loaded.
    pub profile_id: Option<TenantId>,
    /// Sheet the session is currently targeting; `None` means own sheet.
    pub active_sheet_id: Option<SheetId>,
    /// Sheet owned by the signed-in user; unset until the session is ready.
    pub owned_sheet_id: Option<SheetId>,
}

impl SessionView {
    /// Creates a view for a signed-in user with nothing else loaded yet.
    #[must_use]
    pub const fn new(user_id: TenantId) -> Self {
        Self {
            user_id,
            profile_id: None,
            active_sheet_id: None,
            owned_sheet_id: None,
        }
    }

    /// Sets the profile id granted on the active sheet.
    #[must_use]
    pub fn with_profile_id(mut self, profile_id: TenantId) -> Self {
        self.profile_id = Some(profile_id);
        self
    }

    /// Sets the sheet the session is targeting.
    #[must_use]
    pub fn with_active_sheet(mut self, sheet_id: SheetId) -> Self {
        self.active_sheet_id = Some(sheet_id);
        self
    }

    /// Sets the sheet owned by the signed-in user.
    #[must_use]
    pub fn with_owned_sheet(mut self, sheet_id: SheetId) -> Self {
        self.owned_sheet_id = Some(sheet_id);
        self
    }

    /// Returns the sheet the session is effectively targeting.
    ///
    /// Falls back to the owned sheet when no explicit target is set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotReady`] when neither an active nor an owned
    /// sheet is known yet.
    pub fn active_sheet(&self) -> Result<&SheetId, StoreError> {
        self.active_sheet_id
            .as_ref()
            .or(self.owned_sheet_id.as_ref())
            .ok_or(StoreError::NotReady)
    }
}

// ============================================================================
// SECTION: Tenant Resolution
// ============================================================================

/// Resolves the tenant that owns rows written under this session.
///
/// When the session targets the user's own sheet the account id is the
/// tenant; when it targets a sheet shared by someone else, the profile id
/// granted on that sheet is. The check runs on every operation so a sheet
/// switch mid-session is picked up immediately.
///
/// # Errors
///
/// Returns [`StoreError::NotReady`] when the owned sheet is not known yet,
/// or when a shared sheet is targeted before its profile has loaded.
pub fn resolve_tenant_id(view: &SessionView) -> Result<TenantId, StoreError> {
    let owned = view.owned_sheet_id.as_ref().ok_or(StoreError::NotReady)?;
    let active = view.active_sheet_id.as_ref().unwrap_or(owned);
    if active == owned {
        Ok(view.user_id.clone())
    } else {
        view.profile_id.clone().ok_or(StoreError::NotReady)
    }
}
