// crates/repsheet-core/src/runtime/mod.rs
// ============================================================================
// Module: Repsheet Runtime
// Description: Store facade, retry executor, sessions, events, sync, sharing.
// Purpose: Implement record store semantics over the backend seams.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The runtime turns the backend seams into the public operation surface:
//! a readiness-gated typed store facade, a bounded linear-backoff retry
//! executor, per-operation tenant resolution, a typed change-event bus, the
//! history-plus-projection dual-write synchronizer, and the grant sharing
//! service. An in-memory backend provides the reference semantics used by
//! tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod events;
pub mod memory;
pub mod retry;
pub mod session;
pub mod sharing;
pub mod store;
pub mod sync;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use events::ChangeBus;
pub use events::ChangeEvent;
pub use events::Subscription;
pub use memory::MemoryBackend;
pub use retry::RetryAttempt;
pub use retry::RetryExecutor;
pub use retry::RetryPolicy;
pub use retry::Sleeper;
pub use retry::ThreadSleeper;
pub use session::SessionView;
pub use session::resolve_tenant_id;
pub use sharing::RegrantPolicy;
pub use sharing::SharingConfig;
pub use sharing::SharingService;
pub use store::RecordStore;
pub use store::StorePhase;
pub use sync::LatestWeight;
pub use sync::NewWeightSample;
pub use sync::ProjectionOutcome;
pub use sync::WeightService;
pub use sync::WeightSource;
pub use sync::WeightWriteReceipt;
