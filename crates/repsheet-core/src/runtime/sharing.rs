// crates/repsheet-core/src/runtime/sharing.rs
// ============================================================================
// Module: Repsheet Sharing Service
// Description: Grant listing, granting, and revocation for the active sheet.
// Purpose: Manage who may read or write a sheet, with explicit re-grant
//          policy and rate-limit-aware relisting.
// Dependencies: crate::core, crate::interfaces, crate::runtime, serde
// ============================================================================

//! ## Overview
//! [`SharingService`] manages the permission grants of the sheet the session
//! is targeting. Grants live in the sharing backend, addressed by sheet id;
//! the service validates grantee addresses, applies the configured re-grant
//! policy, and announces every successful mutation on the change bus.
//!
//! Listing is rate-limit sensitive on real gateways. The service carries a
//! configured debounce interval that callers are expected to wait after a
//! mutating call before re-listing; it is advisory, not enforced here.
//!
//! ## Invariants
//! - Every call resolves the target sheet from the session view at call
//!   time; an unresolved sheet fails closed with [`StoreError::NotReady`].
//! - Revoking an id that no longer exists is a success, so stale UI rows
//!   can always be dismissed.
//! - [`ChangeEvent::PermissionsUpdated`] fires once per successful
//!   mutation, never on reads and never on failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::GrantId;
use crate::core::identifiers::TableId;
use crate::core::model::GrantRole;
use crate::core::model::PermissionGrant;
use crate::interfaces::SharingBackend;
use crate::interfaces::StoreError;
use crate::runtime::events::ChangeBus;
use crate::runtime::events::ChangeEvent;
use crate::runtime::session::SessionView;

// ============================================================================
// SECTION: Sharing Configuration
// ============================================================================

/// What to do when an address that already holds a grant is granted again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegrantPolicy {
    /// Revoke the existing grants held by the address, then create the new
    /// one. One grant per address.
    #[default]
    ReplaceExisting,
    /// Create the new grant regardless; duplicate entries may accumulate.
    AllowDuplicates,
}

/// Tunable sharing behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharingConfig {
    /// Policy applied when granting to an address that already holds one.
    pub regrant: RegrantPolicy,
    /// Interval callers should wait after a mutation before re-listing.
    pub relist_debounce: Duration,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            regrant: RegrantPolicy::default(),
            relist_debounce: Duration::from_millis(1_500),
        }
    }
}

// ============================================================================
// SECTION: Sharing Service
// ============================================================================

/// Grant management for the session's active sheet.
pub struct SharingService {
    /// Backend that stores the grants.
    backend: Arc<dyn SharingBackend>,
    /// Bus notified after successful mutations.
    bus: Arc<ChangeBus>,
    /// Re-grant policy and relist debounce.
    config: SharingConfig,
}

impl SharingService {
    /// Creates the service with the default configuration.
    #[must_use]
    pub fn new(backend: Arc<dyn SharingBackend>, bus: Arc<ChangeBus>) -> Self {
        Self::with_config(backend, bus, SharingConfig::default())
    }

    /// Creates the service with an explicit configuration.
    #[must_use]
    pub fn with_config(
        backend: Arc<dyn SharingBackend>,
        bus: Arc<ChangeBus>,
        config: SharingConfig,
    ) -> Self {
        Self {
            backend,
            bus,
            config,
        }
    }

    /// Returns the active sharing configuration.
    #[must_use]
    pub const fn config(&self) -> &SharingConfig {
        &self.config
    }

    /// Interval callers should wait after a mutation before re-listing.
    ///
    /// Advisory only; the backend's rate limiter is the real enforcement.
    #[must_use]
    pub const fn relist_debounce(&self) -> Duration {
        self.config.relist_debounce
    }

    /// Lists the grants on the session's active sheet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotReady`] when no sheet is resolved and
    /// mapped backend errors otherwise; failures are surfaced, not retried
    /// here.
    pub fn list_permissions(
        &self,
        view: &SessionView,
    ) -> Result<Vec<PermissionGrant>, StoreError> {
        let sheet = view.active_sheet()?;
        self.backend
            .list_grants(sheet)
            .map_err(|error| StoreError::from_backend(&grants_table(), error))
    }

    /// Grants the address access to the session's active sheet.
    ///
    /// Under [`RegrantPolicy::ReplaceExisting`] any grants already held by
    /// the address (ASCII case-insensitive) are revoked first, so granting
    /// is idempotent per address. Publishes
    /// [`ChangeEvent::PermissionsUpdated`] on success.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PermissionDenied`] when the address fails
    /// validation, [`StoreError::NotReady`] when no sheet is resolved, and
    /// mapped backend errors from the revoke and create calls.
    pub fn grant_access(
        &self,
        view: &SessionView,
        email: &str,
        role: GrantRole,
    ) -> Result<PermissionGrant, StoreError> {
        validate_grantee_email(email)?;
        let sheet = view.active_sheet()?;
        if self.config.regrant == RegrantPolicy::ReplaceExisting {
            let existing = self
                .backend
                .list_grants(sheet)
                .map_err(|error| StoreError::from_backend(&grants_table(), error))?;
            for grant in existing {
                if grant.email_address.eq_ignore_ascii_case(email) {
                    self.backend
                        .delete_grant(sheet, &grant.id)
                        .map_err(|error| StoreError::from_backend(&grants_table(), error))?;
                }
            }
        }
        let created = self
            .backend
            .create_grant(sheet, email, role)
            .map_err(|error| StoreError::from_backend(&grants_table(), error))?;
        self.bus.publish(ChangeEvent::PermissionsUpdated);
        Ok(created)
    }

    /// Revokes a grant on the session's active sheet by its opaque id.
    ///
    /// Revoking an id that no longer exists succeeds. Publishes
    /// [`ChangeEvent::PermissionsUpdated`] on success.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotReady`] when no sheet is resolved and
    /// mapped backend errors otherwise.
    pub fn revoke_access(
        &self,
        view: &SessionView,
        grant: &GrantId,
    ) -> Result<(), StoreError> {
        let sheet = view.active_sheet()?;
        self.backend
            .delete_grant(sheet, grant)
            .map_err(|error| StoreError::from_backend(&grants_table(), error))?;
        self.bus.publish(ChangeEvent::PermissionsUpdated);
        Ok(())
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Table id used to attribute sharing backend failures.
fn grants_table() -> TableId {
    TableId::new("permissions")
}

/// Rejects grantee addresses that cannot be a deliverable email.
///
/// The check is shallow: non-empty local and domain parts around an `@`,
/// no whitespace. The gateway performs the real validation.
fn validate_grantee_email(email: &str) -> Result<(), StoreError> {
    let plausible = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && !domain.is_empty()
    }) && !email.chars().any(char::is_whitespace);
    if plausible {
        Ok(())
    } else {
        Err(StoreError::PermissionDenied {
            reason: "grantee email is not a plausible address".to_string(),
        })
    }
}
