//! External data sources and subscription ownership
//!
//! A data source is a shared, externally owned collaborator. Containers
//! register listeners with it and are told when its contents change; they
//! never assume they are the only listener.
//!
//! # Ownership
//!
//! A [`Subscription`] guard belongs to exactly one container instance. It is
//! not `Clone`, so a handle cannot be shared across instances or survive a
//! remount. Cancelling is idempotent; dropping a guard that was never
//! cancelled releases the handle and emits a [`SubscriptionLeakWarning`].

use crate::error::SubscriptionLeakWarning;
use crate::props::PropValue;
use crate::util::lock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Callback invoked when a data source changes
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Shared data source handle
pub type SharedSource = Arc<dyn DataSource>;

/// Handle returned by [`DataSource::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Minimal contract of an external data source
pub trait DataSource: Send + Sync {
    /// Register a change listener
    fn subscribe(&self, listener: Listener) -> SubscriptionId;

    /// Remove a listener; returns false for unknown handles
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Read accessor available to selectors
    fn get(&self, key: &str) -> Option<PropValue>;
}

// ============================================================================
// Subscription Guard
// ============================================================================

/// Exclusive owner of one subscription handle
pub struct Subscription {
    source: SharedSource,
    id: Option<SubscriptionId>,
    owner: String,
}

impl Subscription {
    /// Subscribe `listener` and take ownership of the returned handle
    pub fn open(source: SharedSource, listener: Listener, owner: impl Into<String>) -> Self {
        let id = source.subscribe(listener);
        let owner = owner.into();
        tracing::debug!(owner = %owner, subscription = id.raw(), "Subscribed to data source");
        Self {
            source,
            id: Some(id),
            owner,
        }
    }

    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    /// Release the handle; later calls do nothing
    pub fn cancel(&mut self) {
        if let Some(id) = self.id.take() {
            if !self.source.unsubscribe(id) {
                tracing::debug!(owner = %self.owner, subscription = id.raw(), "Handle already gone");
            }
            tracing::debug!(owner = %self.owner, subscription = id.raw(), "Unsubscribed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            SubscriptionLeakWarning {
                owner: self.owner.clone(),
                subscription: id.raw(),
            }
            .emit();
            self.cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("owner", &self.owner)
            .field("id", &self.id)
            .finish()
    }
}

// ============================================================================
// In-Memory Source
// ============================================================================

#[derive(Default)]
struct MemoryState {
    values: BTreeMap<String, PropValue>,
    listeners: BTreeMap<SubscriptionId, Listener>,
    /// Last handle handed out; handles are issued as 1..=next_id
    next_id: u64,
    subscribe_calls: usize,
    unsubscribe_calls: usize,
}

/// Key/value data source kept in memory
///
/// Writes notify every listener synchronously, in subscription order. It
/// also keeps an audit trail of handles so tests can check pairing.
#[derive(Default)]
pub struct MemorySource {
    state: Mutex<MemoryState>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<PropValue>,
    {
        let source = Self::new();
        {
            let mut state = lock(&source.state);
            for (k, v) in values {
                state.values.insert(k.into(), v.into());
            }
        }
        source
    }

    /// Store a value and notify listeners
    pub fn set(&self, key: impl Into<String>, value: impl Into<PropValue>) {
        lock(&self.state).values.insert(key.into(), value.into());
        self.notify();
    }

    /// Call every listener
    ///
    /// Listeners are collected first and run without the internal lock, so a
    /// listener may read from the source.
    pub fn notify(&self) {
        let listeners: Vec<Listener> = lock(&self.state).listeners.values().cloned().collect();
        tracing::trace!(listeners = listeners.len(), "Notifying data source listeners");
        for listener in listeners {
            listener();
        }
    }

    pub fn active_subscriptions(&self) -> usize {
        lock(&self.state).listeners.len()
    }

    pub fn subscribe_count(&self) -> usize {
        lock(&self.state).subscribe_calls
    }

    pub fn unsubscribe_count(&self) -> usize {
        lock(&self.state).unsubscribe_calls
    }

    /// Whether `id` was ever handed out by this source
    ///
    /// Answered from the handle counter, so the audit costs no memory per
    /// subscription.
    pub fn was_issued(&self, id: SubscriptionId) -> bool {
        (1..=lock(&self.state).next_id).contains(&id.raw())
    }
}

impl DataSource for MemorySource {
    fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        state.listeners.insert(id, listener);
        state.subscribe_calls += 1;
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = lock(&self.state);
        state.unsubscribe_calls += 1;
        state.listeners.remove(&id).is_some()
    }

    fn get(&self, key: &str) -> Option<PropValue> {
        lock(&self.state).values.get(key).cloned()
    }
}

impl fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("MemorySource")
            .field("values", &state.values)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_listener() -> (Listener, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        (
            Arc::new(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
            count,
        )
    }

    #[test]
    fn test_set_notifies_all_listeners() {
        let source = MemorySource::new();
        let (a, a_count) = counting_listener();
        let (b, b_count) = counting_listener();
        source.subscribe(a);
        source.subscribe(b);

        source.set("1", "A");

        assert_eq!(a_count.load(Ordering::SeqCst), 1);
        assert_eq!(b_count.load(Ordering::SeqCst), 1);
        assert_eq!(source.get("1"), Some(PropValue::from("A")));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let source = Arc::new(MemorySource::new());
        let (listener, count) = counting_listener();
        let mut sub = Subscription::open(source.clone(), listener, "test");
        let id = sub.id().unwrap();

        sub.cancel();
        sub.cancel();

        assert!(!sub.is_active());
        assert!(source.was_issued(id));
        assert_eq!(source.active_subscriptions(), 0);
        assert_eq!(source.unsubscribe_count(), 1);

        source.notify();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_was_issued_tracks_handed_out_handles() {
        let source = Arc::new(MemorySource::new());
        assert!(!source.was_issued(SubscriptionId::new(1)));

        for _ in 0..100 {
            let (listener, _) = counting_listener();
            let id = source.subscribe(listener);
            assert!(source.unsubscribe(id));
        }

        assert!(source.was_issued(SubscriptionId::new(1)));
        assert!(source.was_issued(SubscriptionId::new(100)));
        assert!(!source.was_issued(SubscriptionId::new(0)));
        assert!(!source.was_issued(SubscriptionId::new(101)));
    }

    #[test]
    fn test_drop_releases_handle() {
        let source = Arc::new(MemorySource::new());
        let (listener, _) = counting_listener();
        {
            let _sub = Subscription::open(source.clone(), listener, "leaky");
            assert_eq!(source.active_subscriptions(), 1);
        }
        assert_eq!(source.active_subscriptions(), 0);
        assert_eq!(source.subscribe_count(), source.unsubscribe_count());
    }

    #[test]
    fn test_listener_may_read_source() {
        let source = Arc::new(MemorySource::with_values([("k", 1)]));
        let seen = Arc::new(Mutex::new(None));
        let reader = source.clone();
        let sink = seen.clone();
        source.subscribe(Arc::new(move || {
            *lock(&sink) = reader.get("k");
        }));

        source.set("k", 2);
        assert_eq!(*lock(&seen), Some(PropValue::from(2)));
    }
}
