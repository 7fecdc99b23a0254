//! Named event channels carrying user intent.

#[cfg(feature = "no_std")]
use alloc::collections::BTreeMap;
#[cfg(feature = "no_std")]
use alloc::string::{String, ToString};
#[cfg(not(feature = "no_std"))]
use std::collections::BTreeMap;

use core::fmt;
use core::time::Duration;

use portable_atomic_util::Arc;

use crate::deferred::{Deferrer, TaskHandle};
use crate::host::{UiEvent, COMMIT_KEY};
use crate::subscribers::{SubscriptionId, Subscribers};

struct EventInner<P> {
    name: String,
    subscribers: Subscribers<P, str>,
    deferrer: Deferrer,
}

/// A named channel for dispatching parameters to subscribers.
///
/// The name is only used for logging and introspection; subscribers receive
/// it as their second argument. Cloning the handle shares the channel.
///
/// # Example
///
/// ```rust
/// use oxide_flux::{Deferrer, Event, Task};
/// use std::time::Duration;
///
/// let deferrer = Deferrer::new(|_delay: Duration, task: Task| task());
/// let clicked: Event<u32> = Event::new("clicked", deferrer);
///
/// clicked.subscribe(|times, name| println!("{name} x{times}"));
/// clicked.dispatch(2);
/// ```
pub struct Event<P> {
    inner: Arc<EventInner<P>>,
}

impl<P> Clone for Event<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P> fmt::Debug for Event<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.inner.name)
            .field("subscribers", &self.inner.subscribers.count())
            .finish()
    }
}

impl<P: 'static> Event<P> {
    /// Create an event channel called `name`.
    ///
    /// # Arguments
    ///
    /// * `name` - Passed to every handler and used as the registry key.
    /// * `deferrer` - Schedules [`dispatch_after`](Self::dispatch_after).
    pub fn new(name: impl Into<String>, deferrer: Deferrer) -> Self {
        Self {
            inner: Arc::new(EventInner {
                name: name.into(),
                subscribers: Subscribers::new(),
                deferrer,
            }),
        }
    }

    /// The channel name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Subscribe a handler; it receives the params and the channel name.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&P, &str) + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(handler)
    }

    /// Remove one handler. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.subscribers.unsubscribe(id);
    }

    /// Number of handlers. Zero means the channel is registered but unused.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.count()
    }

    /// Notify every handler synchronously, in subscription order.
    pub fn dispatch(&self, params: P) {
        tracing::trace!(event = %self.inner.name, "dispatch");
        self.inner.subscribers.notify(&params, &self.inner.name);
    }

    /// Dispatch once `delay` has elapsed on the host timer.
    ///
    /// `Duration::ZERO` runs after the current call stack, never inline.
    /// The task is cancelled by the returned handle or by stopping the
    /// [`App`](crate::App) that owns the channel.
    pub fn dispatch_after(&self, params: P, delay: Duration) -> TaskHandle
    where
        P: Send,
    {
        let event = self.clone();
        self.inner
            .deferrer
            .schedule(delay, move || event.dispatch(params))
    }

    /// A callback that dispatches a copy of `params` each time it is called.
    pub fn dispatch_cb(&self, params: P) -> impl Fn() + Send + Sync + 'static
    where
        P: Clone + Send + Sync,
    {
        let event = self.clone();
        move || event.dispatch(params.clone())
    }

    /// A change handler: dispatches a copy of `params` whose `"value"` field
    /// holds the input's value. `params` itself is never modified.
    pub fn dispatch_change_cb<U>(&self, params: P) -> impl Fn(&U) + Send + Sync
    where
        P: FieldSet + Clone + Send + Sync,
        U: UiEvent + ?Sized,
    {
        self.dispatch_change_cb_field(params, "value")
    }

    /// Like [`dispatch_change_cb`](Self::dispatch_change_cb), writing into
    /// `field` instead of `"value"`.
    pub fn dispatch_change_cb_field<U>(
        &self,
        params: P,
        field: impl Into<String>,
    ) -> impl Fn(&U) + Send + Sync
    where
        P: FieldSet + Clone + Send + Sync,
        U: UiEvent + ?Sized,
    {
        let field = field.into();
        self.dispatch_change_cb_with(params, move |params: &mut P, value: &str| {
            params.set_field(&field, value)
        })
    }

    /// A change handler for typed params: `setter` writes the input's value
    /// into a fresh copy of `params`, which is then dispatched.
    pub fn dispatch_change_cb_with<U, F>(
        &self,
        params: P,
        setter: F,
    ) -> impl Fn(&U) + Send + Sync
    where
        P: Clone + Send + Sync,
        U: UiEvent + ?Sized,
        F: Fn(&mut P, &str) + Send + Sync + 'static,
    {
        let event = self.clone();
        move |ui_event: &U| {
            let mut changed = params.clone();
            setter(&mut changed, ui_event.value());
            event.dispatch(changed);
        }
    }

    /// A key handler that dispatches `params` only for the commit key
    /// ([`COMMIT_KEY`]); every other key is ignored.
    pub fn dispatch_enter_cb<U>(&self, params: P) -> impl Fn(&U) + Send + Sync
    where
        P: Clone + Send + Sync,
        U: UiEvent + ?Sized,
    {
        let event = self.clone();
        move |ui_event: &U| {
            if ui_event.key() == Some(COMMIT_KEY) {
                event.dispatch(params.clone());
            }
        }
    }
}

/// Params whose fields can be addressed by name, for
/// [`Event::dispatch_change_cb`].
pub trait FieldSet {
    fn set_field(&mut self, field: &str, value: &str);
}

impl FieldSet for BTreeMap<String, String> {
    fn set_field(&mut self, field: &str, value: &str) {
        self.insert(field.to_string(), value.to_string());
    }
}

#[cfg(not(feature = "no_std"))]
impl<H: core::hash::BuildHasher> FieldSet for std::collections::HashMap<String, String, H> {
    fn set_field(&mut self, field: &str, value: &str) {
        self.insert(field.to_string(), value.to_string());
    }
}

#[cfg(feature = "im")]
impl<H: core::hash::BuildHasher> FieldSet for im::HashMap<String, String, H> {
    fn set_field(&mut self, field: &str, value: &str) {
        self.insert(field.to_string(), value.to_string());
    }
}
