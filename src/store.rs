//! The state atom: a single slot holding the current snapshot.

use core::fmt;

use portable_atomic_util::Arc;
use spin::Mutex;

use crate::snapshot::{Merge, Snapshot};
use crate::subscribers::{SubscriptionId, Subscribers};

struct StoreInner<S> {
    current: Mutex<S>,
    subscribers: Subscribers<S, S>,
}

/// Shared handle to the application state.
///
/// A `Store` holds exactly one snapshot. The only way to change it is
/// [`update`](Self::update) with a pure transform; every call notifies the
/// subscribers with `(new, old)`, even when the transform returned the old
/// snapshot unchanged. Deciding whether a transition matters is left to the
/// subscriber.
///
/// Cloning the handle shares the same state.
pub struct Store<S> {
    inner: Arc<StoreInner<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("current", &*self.inner.current.lock())
            .field("subscribers", &self.inner.subscribers.count())
            .finish()
    }
}

impl<S: Snapshot> Store<S> {
    /// Create a store holding `initial`, with no subscribers.
    pub fn new(initial: S) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                current: Mutex::new(initial),
                subscribers: Subscribers::new(),
            }),
        }
    }

    /// The current snapshot. Cloning a snapshot is a reference copy.
    pub fn get(&self) -> S {
        self.inner.current.lock().clone()
    }

    /// Replace the current snapshot with `transform(current)` and notify
    /// subscribers with `(new, old)`.
    ///
    /// The transform runs without any lock held, so it may read the store.
    /// Two updates racing from different threads each see the snapshot that
    /// was current when they started; the last one to store wins.
    pub fn update<F>(&self, transform: F)
    where
        F: FnOnce(&S) -> S,
    {
        let old = self.get();
        let new = transform(&old);
        *self.inner.current.lock() = new.clone();

        tracing::trace!(changed = !new.same(&old), "state transition");
        self.inner.subscribers.notify(&new, &old);
    }

    /// Replace the whole snapshot with `value`.
    pub fn reset(&self, value: S) {
        self.update(move |_| value);
    }

    /// Merge `value` into the current snapshot.
    pub fn merge(&self, value: S)
    where
        S: Merge,
    {
        self.update(move |current| current.merge(value));
    }

    /// Be told about every transition as `(new, old)`.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&S, &S) + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(callback)
    }

    /// Remove one subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.subscribers.unsubscribe(id);
    }

    /// Remove every subscriber, including the render loop's.
    pub fn unsubscribe_all(&self) {
        self.inner.subscribers.unsubscribe_all();
    }

    /// How many subscribers are registered right now.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.count()
    }
}
