//! Named state transitions.

#[cfg(feature = "no_std")]
use alloc::boxed::Box;
#[cfg(feature = "no_std")]
use alloc::string::String;

use core::fmt;
use core::time::Duration;

use portable_atomic_util::Arc;

use crate::deferred::{Deferrer, TaskHandle};
use crate::snapshot::Snapshot;
use crate::store::Store;

struct MutatorInner<S, P> {
    name: String,
    apply: Box<dyn Fn(&Store<S>, P) + Send + Sync>,
    store: Store<S>,
    deferrer: Deferrer,
}

/// A named operation that moves the store to a new snapshot.
///
/// Most mutators are written as pure `(snapshot, params) -> snapshot`
/// functions and registered with [`Mutator::new`], which adapts them through
/// [`state_updater`]. The transform always receives the snapshot current at
/// the moment it runs, so two mutators run one after the other in the same
/// handler compose. Transitions that must be atomic belong in one transform.
pub struct Mutator<S, P> {
    inner: Arc<MutatorInner<S, P>>,
}

impl<S, P> Clone for Mutator<S, P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S, P> fmt::Debug for Mutator<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutator")
            .field("name", &self.inner.name)
            .finish()
    }
}

/// Adapt a pure transform into a store-level mutator body.
pub fn state_updater<S, P, F>(transform: F) -> impl Fn(&Store<S>, P) + Send + Sync
where
    S: Snapshot,
    F: Fn(&S, P) -> S + Send + Sync + 'static,
{
    move |store: &Store<S>, params: P| store.update(|current| transform(current, params))
}

impl<S, P> Mutator<S, P> {
    /// The name the mutator was registered under.
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl<S: Snapshot + 'static, P: 'static> Mutator<S, P> {
    /// Register a pure transform.
    pub fn new<F>(
        name: impl Into<String>,
        store: Store<S>,
        deferrer: Deferrer,
        transform: F,
    ) -> Self
    where
        F: Fn(&S, P) -> S + Send + Sync + 'static,
    {
        Self::from_fn(name, store, deferrer, state_updater(transform))
    }

    /// Register a body that drives the store itself, e.g. to run several
    /// updates or none at all.
    pub fn from_fn<F>(
        name: impl Into<String>,
        store: Store<S>,
        deferrer: Deferrer,
        apply: F,
    ) -> Self
    where
        F: Fn(&Store<S>, P) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(MutatorInner {
                name: name.into(),
                apply: Box::new(apply),
                store,
                deferrer,
            }),
        }
    }

    /// Apply the mutator to the store right now.
    pub fn run(&self, params: P) {
        tracing::trace!(mutator = %self.inner.name, "run");
        (self.inner.apply)(&self.inner.store, params);
    }

    /// Run once `delay` has elapsed on the host timer.
    ///
    /// Useful to let every handler of the current dispatch finish before a
    /// piece of state they might read goes away.
    pub fn run_after(&self, params: P, delay: Duration) -> TaskHandle
    where
        S: Send,
        P: Send,
    {
        let mutator = self.clone();
        self.inner
            .deferrer
            .schedule(delay, move || mutator.run(params))
    }
}
