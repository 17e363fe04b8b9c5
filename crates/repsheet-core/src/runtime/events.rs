// crates/repsheet-core/src/runtime/events.rs
// ============================================================================
// Module: Repsheet Change Bus
// Description: Typed publish/subscribe bus for data-change notifications.
// Purpose: Let views react to writes without string-keyed global listeners.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Writes publish typed [`ChangeEvent`] values on a [`ChangeBus`]; interested
//! parties hold a [`Subscription`] and poll it at their own pace. Each
//! subscription owns a private queue, so a slow consumer never blocks the
//! publisher or other consumers.
//!
//! ## Invariants
//! - Dropping a [`Subscription`] unsubscribes it; the bus never delivers to
//!   a dropped handle and prunes disconnected queues on publish.
//! - A filtered subscription only receives the topics it registered for.
//! - Publishing never blocks and never fails; it reports how many
//!   subscribers were reached.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::Weak;
use std::sync::mpsc;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Change Events
// ============================================================================

/// Data-change notification emitted after a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A profile projection row changed.
    ProfileUpdated,
    /// A weight history row was appended.
    WeightAdded,
    /// The sharing grant list for the active sheet changed.
    PermissionsUpdated,
}

impl ChangeEvent {
    /// Returns the canonical wire name for the event.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ProfileUpdated => "profile_updated",
            Self::WeightAdded => "weight_added",
            Self::PermissionsUpdated => "permissions_updated",
        }
    }
}

// ============================================================================
// SECTION: Bus State
// ============================================================================

/// Per-subscriber delivery record.
struct SubscriberEntry {
    /// Topics this subscriber receives; `None` means all topics.
    topics: Option<BTreeSet<ChangeEvent>>,
    /// Queue the subscriber polls through its [`Subscription`].
    sender: mpsc::Sender<ChangeEvent>,
}

/// Shared mutable bus state behind the mutex.
struct BusState {
    /// Live subscribers keyed by handle id.
    subscribers: BTreeMap<u64, SubscriberEntry>,
    /// Next handle id to allocate.
    next_id: u64,
}

/// Locks the bus state, recovering from poisoning.
///
/// The state is a plain subscriber map with no cross-field invariant, so a
/// panicked publisher cannot leave it inconsistent.
fn lock_state(state: &Mutex<BusState>) -> MutexGuard<'_, BusState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ============================================================================
// SECTION: Change Bus
// ============================================================================

/// Typed publish/subscribe bus for data-change notifications.
pub struct ChangeBus {
    /// Subscriber table shared with outstanding [`Subscription`] handles.
    state: Arc<Mutex<BusState>>,
}

impl ChangeBus {
    /// Creates an empty bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState {
                subscribers: BTreeMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Subscribes to every topic.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.register(None)
    }

    /// Subscribes to the given topics only.
    #[must_use]
    pub fn subscribe_filtered(
        &self,
        topics: impl IntoIterator<Item = ChangeEvent>,
    ) -> Subscription {
        self.register(Some(topics.into_iter().collect()))
    }

    /// Publishes an event to every live matching subscriber.
    ///
    /// Disconnected subscribers are pruned. Returns the number of
    /// subscribers the event was delivered to.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let mut state = lock_state(&self.state);
        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, entry) in &state.subscribers {
            let wanted = entry
                .topics
                .as_ref()
                .is_none_or(|topics| topics.contains(&event));
            if !wanted {
                continue;
            }
            if entry.sender.send(event).is_ok() {
                delivered += 1;
            } else {
                dead.push(*id);
            }
        }
        for id in dead {
            state.subscribers.remove(&id);
        }
        delivered
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock_state(&self.state).subscribers.len()
    }

    /// Registers a subscriber and hands back its polling handle.
    fn register(&self, topics: Option<BTreeSet<ChangeEvent>>) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        let mut state = lock_state(&self.state);
        let id = state.next_id;
        state.next_id = state.next_id.wrapping_add(1);
        state.subscribers.insert(id, SubscriberEntry { topics, sender });
        Subscription {
            id,
            receiver,
            bus: Arc::downgrade(&self.state),
        }
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Subscription Handle
// ============================================================================

/// Cancellable handle to a bus subscription.
///
/// # Invariants
/// - Dropping the handle removes the subscriber from the bus.
/// - Events queue in publish order and are consumed by polling.
pub struct Subscription {
    /// Handle id inside the bus subscriber table.
    id: u64,
    /// Private event queue for this subscriber.
    receiver: mpsc::Receiver<ChangeEvent>,
    /// Back-reference used to unsubscribe on drop.
    bus: Weak<Mutex<BusState>>,
}

impl Subscription {
    /// Returns the next queued event, if any, without blocking.
    #[must_use]
    pub fn try_next(&self) -> Option<ChangeEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drains every queued event in publish order.
    #[must_use]
    pub fn drain(&self) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.bus.upgrade() {
            lock_state(&state).subscribers.remove(&self.id);
        }
    }
}
