//! Ordered subscriber registry shared by every subscribable type.

#[cfg(feature = "no_std")]
use alloc::boxed::Box;
#[cfg(feature = "no_std")]
use alloc::vec::Vec;

use core::fmt;

use portable_atomic_util::Arc;
use spin::Mutex;

/// Token returned by `subscribe`, used to unsubscribe later.
///
/// Ids come from a per-registry counter, so they are only unique within the
/// registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Callback<V: ?Sized, E: ?Sized>(Box<dyn Fn(&V, &E) + Send + Sync>);

struct Records<V: ?Sized, E: ?Sized> {
    last_id: u64,
    entries: Vec<(SubscriptionId, Arc<Callback<V, E>>)>,
}

/// An ordered collection of `(id, callback)` pairs.
///
/// Callbacks receive the notified value plus an `extra` argument: the
/// previous snapshot for a [`Store`](crate::Store), the channel name for an
/// [`Event`](crate::Event).
///
/// [`notify`](Self::notify) works on the list as it was when the call
/// started and holds no lock while callbacks run, so a callback may freely
/// subscribe, unsubscribe or notify again. Changes made that way take effect
/// on the next pass.
pub struct Subscribers<V: ?Sized, E: ?Sized> {
    records: Mutex<Records<V, E>>,
}

impl<V: ?Sized, E: ?Sized> Default for Subscribers<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ?Sized, E: ?Sized> fmt::Debug for Subscribers<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.count())
            .finish()
    }
}

impl<V: ?Sized, E: ?Sized> Subscribers<V, E> {
    /// An empty list.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Records {
                last_id: 0,
                entries: Vec::new(),
            }),
        }
    }

    /// Append a callback; it is notified after every earlier subscriber.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&V, &E) + Send + Sync + 'static,
    {
        let mut records = self.records.lock();
        records.last_id += 1;
        let id = SubscriptionId(records.last_id);
        records
            .entries
            .push((id, Arc::new(Callback(Box::new(callback)))));
        id
    }

    /// Remove the callback registered under `id`. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.records
            .lock()
            .entries
            .retain(|(entry_id, _)| *entry_id != id);
    }

    /// Remove every callback.
    pub fn unsubscribe_all(&self) {
        self.records.lock().entries.clear();
    }

    /// Number of live callbacks.
    pub fn count(&self) -> usize {
        self.records.lock().entries.len()
    }

    /// Call every callback, in subscription order, with `(value, extra)`.
    ///
    /// A panicking callback aborts the pass; later subscribers are not called.
    pub fn notify(&self, value: &V, extra: &E) {
        let pass: Vec<Arc<Callback<V, E>>> = self
            .records
            .lock()
            .entries
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in pass {
            (callback.0)(value, extra);
        }
    }
}
