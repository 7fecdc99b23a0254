//! Named read projections over the store.

#[cfg(feature = "no_std")]
use alloc::boxed::Box;
#[cfg(feature = "no_std")]
use alloc::string::String;

use core::fmt;

use portable_atomic_util::Arc;

use crate::snapshot::Snapshot;
use crate::store::Store;

struct QueryInner<S, P, R> {
    name: String,
    project: Box<dyn Fn(&S, P) -> R + Send + Sync>,
    store: Store<S>,
}

/// A named, read-only function of the current snapshot.
///
/// Queries are meant to extract the small projection a render function
/// needs, so that memoized renders can compare it field by field.
pub struct Query<S, P, R> {
    inner: Arc<QueryInner<S, P, R>>,
}

impl<S, P, R> Clone for Query<S, P, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S, P, R> fmt::Debug for Query<S, P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").field("name", &self.inner.name).finish()
    }
}

impl<S, P, R> Query<S, P, R> {
    /// The name the query was registered under.
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl<S: Snapshot, P, R> Query<S, P, R> {
    /// Create a query named `name` projecting the current snapshot of `store`.
    ///
    /// # Arguments
    ///
    /// * `name` - The registry key.
    /// * `store` - The store read on every [`run`](Self::run).
    /// * `project` - Maps the snapshot and the call's params to the result.
    pub fn new<F>(name: impl Into<String>, store: Store<S>, project: F) -> Self
    where
        F: Fn(&S, P) -> R + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(QueryInner {
                name: name.into(),
                project: Box::new(project),
                store,
            }),
        }
    }

    /// Evaluate against the snapshot current right now.
    pub fn run(&self, params: P) -> R {
        tracing::trace!(query = %self.inner.name, "run");
        let snapshot = self.inner.store.get();
        (self.inner.project)(&snapshot, params)
    }
}
