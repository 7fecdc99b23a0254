//! The application controller: render scheduling and lifecycle.

#[cfg(feature = "no_std")]
use alloc::boxed::Box;
#[cfg(feature = "no_std")]
use alloc::format;
#[cfg(feature = "no_std")]
use alloc::string::String;
#[cfg(feature = "no_std")]
use alloc::vec::Vec;

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use portable_atomic_util::Arc;
use spin::Mutex;

use crate::config::AppBuilder;
use crate::deferred::Deferrer;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::hooks::{Lifecycle, FOCUS_ATTEMPTS, MOUNT_ATTEMPTS};
use crate::host::{FrameClock, Timer};
use crate::mutator::Mutator;
use crate::query::Query;
use crate::registry::Registries;
use crate::renderer::{Completion, Container, Focusable, Renderer};
use crate::snapshot::Snapshot;
use crate::store::Store;
use crate::subscribers::SubscriptionId;

/// Prefix used by [`App::next_element_id`] when callers pass an empty one.
pub const DEFAULT_ID_PREFIX: &str = "flux";

pub(crate) type RootRender<S, V, C> = Box<dyn Fn(&App<S, V, C>) -> V + Send + Sync>;

/// Where the render scheduler currently is.
///
/// ```text
/// Idle ──change──▶ Dirty ──frame──▶ Rendering ──complete──▶ Idle | Dirty
/// ```
///
/// Any phase moves to `Stopped` on [`App::stop`], and stays there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The last committed render reflects the last observed state.
    Idle,
    /// A frame was requested and no render ran since.
    Dirty,
    /// A render was handed to the renderer and has not completed yet.
    Rendering,
    /// [`App::stop`] ran; nothing renders again.
    Stopped,
}

struct Scheduler<S> {
    phase: Phase,
    last_rendered: Option<S>,
    observed: S,
}

impl<S: Snapshot> Scheduler<S> {
    fn changed(&self) -> bool {
        self.last_rendered
            .as_ref()
            .map_or(true, |last| !last.same(&self.observed))
    }
}

/// Resets a scheduler left in `Rendering` by a commit that unwound before
/// the renderer took the completion.
///
/// The scheduler goes back to `Idle` with nothing recorded as rendered, so
/// the next transition requests a frame again.
struct CommitGuard<'a, S> {
    scheduler: &'a Mutex<Scheduler<S>>,
    armed: bool,
}

impl<S> Drop for CommitGuard<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut scheduler = self.scheduler.lock();
        if scheduler.phase == Phase::Rendering {
            scheduler.phase = Phase::Idle;
            scheduler.last_rendered = None;
            tracing::warn!("render unwound before it was committed");
        }
    }
}

struct AppInner<S, V, C: Container> {
    store: Store<S>,
    registries: Mutex<Registries>,
    root: RootRender<S, V, C>,
    renderer: Mutex<Box<dyn Renderer<V, C> + Send>>,
    container: C,
    frame_clock: Box<dyn FrameClock + Send + Sync>,
    deferrer: Deferrer,
    lifecycle: Lifecycle<C::Node>,
    scheduler: Mutex<Scheduler<S>>,
    loop_subscription: Mutex<Option<SubscriptionId>>,
    element_ids: AtomicUsize,
}

/// The running application.
///
/// An `App` owns the store, the registries, the root render function and
/// the host seams (renderer, container, frame clock, timer). It observes the
/// store and turns any number of state transitions between two frames into
/// a single render.
///
/// Build one with [`AppBuilder`]. Cloning the handle shares the application.
///
/// Nothing here holds a lock while user code runs: transforms, subscribers,
/// the root render function, the renderer and lifecycle hooks may all call
/// back into the app.
pub struct App<S, V, C: Container> {
    inner: Arc<AppInner<S, V, C>>,
}

impl<S, V, C: Container> Clone for App<S, V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S, V, C: Container> fmt::Debug for App<S, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("phase", &self.inner.scheduler.lock().phase)
            .field("registries", &*self.inner.registries.lock())
            .field("deferrer", &self.inner.deferrer)
            .finish()
    }
}

impl<S, V, C> App<S, V, C>
where
    S: Snapshot + Send + Sync + 'static,
    V: 'static,
    C: Container + Send + Sync + 'static,
    C::Node: Send + 'static,
{
    /// Start configuring an application around `initial_state`.
    pub fn builder<T>(initial_state: S, timer: T) -> AppBuilder<S, V, C>
    where
        T: Timer + Send + Sync + 'static,
    {
        AppBuilder::new(initial_state, timer)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble<R, F>(
        store: Store<S>,
        deferrer: Deferrer,
        registries: Registries,
        root: RootRender<S, V, C>,
        renderer: R,
        container: C,
        frame_clock: F,
    ) -> Self
    where
        R: Renderer<V, C> + Send + 'static,
        F: FrameClock + Send + Sync + 'static,
    {
        let observed = store.get();
        let renderer: Box<dyn Renderer<V, C> + Send> = Box::new(renderer);
        Self {
            inner: Arc::new(AppInner {
                store,
                registries: Mutex::new(registries),
                root,
                renderer: Mutex::new(renderer),
                container,
                frame_clock: Box::new(frame_clock),
                deferrer,
                lifecycle: Lifecycle::new(),
                scheduler: Mutex::new(Scheduler {
                    phase: Phase::Idle,
                    last_rendered: None,
                    observed,
                }),
                loop_subscription: Mutex::new(None),
                element_ids: AtomicUsize::new(0),
            }),
        }
    }

    /// The store holding the application state.
    pub fn store(&self) -> &Store<S> {
        &self.inner.store
    }

    /// Shorthand for `self.store().get()`.
    pub fn state(&self) -> S {
        self.inner.store.get()
    }

    /// The deferrer shared by events and mutators; closed by [`stop`](Self::stop).
    pub fn deferrer(&self) -> &Deferrer {
        &self.inner.deferrer
    }

    /// The container renders are committed into.
    pub fn container(&self) -> &C {
        &self.inner.container
    }

    /// Where the render scheduler is right now.
    pub fn phase(&self) -> Phase {
        self.inner.scheduler.lock().phase
    }

    /// Look up a registered event.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownEvent`] if nothing is registered under `name`, and
    /// [`Error::TypeMismatch`] if the event carries other params than `P`.
    pub fn event<P: 'static>(&self, name: &str) -> Result<Event<P>> {
        self.inner.registries.lock().event(name)
    }

    /// Look up a registered query, see [`event`](Self::event) for the errors.
    pub fn query<P: 'static, R: 'static>(&self, name: &str) -> Result<Query<S, P, R>> {
        self.inner.registries.lock().query(name)
    }

    /// Look up a registered mutator, see [`event`](Self::event) for the errors.
    pub fn mutator<P: 'static>(&self, name: &str) -> Result<Mutator<S, P>> {
        self.inner.registries.lock().mutator(name)
    }

    /// Create and register an event after the app was built.
    pub fn add_event<P: 'static>(&self, name: &str) -> Event<P> {
        let event = Event::new(name, self.inner.deferrer.clone());
        self.inner.registries.lock().add_event(event.clone());
        event
    }

    /// Create and register a query after the app was built.
    ///
    /// # Arguments
    ///
    /// * `name` - The registry key; an existing query of that name is replaced.
    /// * `project` - Maps the current snapshot and params to the result.
    pub fn add_query<P, R, F>(&self, name: &str, project: F) -> Query<S, P, R>
    where
        P: 'static,
        R: 'static,
        F: Fn(&S, P) -> R + Send + Sync + 'static,
    {
        let query = Query::new(name, self.inner.store.clone(), project);
        self.inner.registries.lock().add_query(query.clone());
        query
    }

    /// Create and register a mutator after the app was built.
    ///
    /// # Arguments
    ///
    /// * `name` - The registry key; an existing mutator of that name is replaced.
    /// * `transform` - Pure function from the current snapshot and params to
    ///   the next snapshot.
    pub fn add_mutator<P, F>(&self, name: &str, transform: F) -> Mutator<S, P>
    where
        P: 'static,
        F: Fn(&S, P) -> S + Send + Sync + 'static,
    {
        let mutator = Mutator::new(
            name,
            self.inner.store.clone(),
            self.inner.deferrer.clone(),
            transform,
        );
        self.inner.registries.lock().add_mutator(mutator.clone());
        mutator
    }

    /// Names of registered events without subscribers.
    pub fn orphaned_events(&self) -> Vec<String> {
        self.inner.registries.lock().orphaned_events()
    }

    /// Subscribe to the store and render once, unconditionally.
    ///
    /// From then on every state transition that yields a new snapshot
    /// schedules a render on the next frame. Calling this again only renders.
    pub fn start_render_loop(&self) -> Result<()> {
        if self.phase() == Phase::Stopped {
            return Err(Error::Stopped);
        }
        {
            let mut subscription = self.inner.loop_subscription.lock();
            if subscription.is_none() {
                let weak = Arc::downgrade(&self.inner);
                *subscription = Some(self.inner.store.subscribe(move |new: &S, _old: &S| {
                    if let Some(inner) = weak.upgrade() {
                        App { inner }.observe(new.clone());
                    }
                }));
                tracing::debug!("render loop started");
            }
        }
        self.render()
    }

    /// Render the current state now, whether or not it changed.
    ///
    /// A panic in the root render function or the renderer propagates to
    /// the caller. The scheduler is left idle and renders again on the next
    /// transition.
    pub fn render(&self) -> Result<()> {
        {
            let mut scheduler = self.inner.scheduler.lock();
            if scheduler.phase == Phase::Stopped {
                return Err(Error::Stopped);
            }
            let current = self.inner.store.get();
            scheduler.observed = current.clone();
            scheduler.last_rendered = Some(current);
            scheduler.phase = Phase::Rendering;
        }
        self.commit();
        Ok(())
    }

    /// Render synchronously if the observed state differs from the last
    /// rendered one. Returns whether a render ran.
    ///
    /// Does nothing while a render is still waiting for completion.
    pub fn render_now(&self) -> Result<bool> {
        if self.phase() == Phase::Stopped {
            return Err(Error::Stopped);
        }
        Ok(self.check_render(false))
    }

    /// Tear down: drop every store subscriber, cancel deferred work and
    /// ignore frames that are still in flight.
    ///
    /// This removes all subscribers of the store, not only the render loop,
    /// since the store belongs to this application.
    pub fn stop(&self) -> Result<()> {
        {
            let mut scheduler = self.inner.scheduler.lock();
            if scheduler.phase == Phase::Stopped {
                return Err(Error::Stopped);
            }
            scheduler.phase = Phase::Stopped;
        }
        self.inner.store.unsubscribe_all();
        *self.inner.loop_subscription.lock() = None;
        self.inner.deferrer.close();
        self.inner.lifecycle.clear();
        tracing::debug!("render loop stopped");
        Ok(())
    }

    /// Focus the element with `id` once a render committed it, selecting
    /// its content if `select` is set.
    pub fn focus_after_render(&self, id: impl Into<String>, select: bool)
    where
        C::Node: Focusable,
    {
        self.inner
            .lifecycle
            .after_render(id.into(), FOCUS_ATTEMPTS, move |node: &C::Node| {
                node.focus();
                if select {
                    node.select();
                }
            });
    }

    /// Run `callback` with the node carrying `id` after the render that
    /// mounts it. Dropped without a call if it never shows up.
    pub fn on_mount<O, F>(&self, id: impl Into<String>, options: O, callback: F)
    where
        O: Send + 'static,
        F: FnOnce(&C::Node, &O) + Send + 'static,
    {
        self.inner
            .lifecycle
            .after_render(id.into(), MOUNT_ATTEMPTS, move |node: &C::Node| {
                callback(node, &options)
            });
    }

    /// Run `callback` after the first render that leaves `node` outside the
    /// container.
    pub fn on_unmount<O, F>(&self, node: C::Node, options: O, callback: F)
    where
        O: Send + 'static,
        F: FnOnce(&C::Node, &O) + Send + 'static,
    {
        self.inner
            .lifecycle
            .watch_unmount(node, move |node: &C::Node| callback(node, &options));
    }

    /// After-render hooks still waiting for their element.
    pub fn pending_hooks(&self) -> usize {
        self.inner.lifecycle.pending_hooks()
    }

    /// Unmount watches whose node is still mounted.
    pub fn watched_unmounts(&self) -> usize {
        self.inner.lifecycle.watched_unmounts()
    }

    /// A fresh element id, unique within this application.
    pub fn next_element_id(&self, prefix: &str) -> String {
        let prefix = if prefix.is_empty() {
            DEFAULT_ID_PREFIX
        } else {
            prefix
        };
        let n = self.inner.element_ids.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}{n}")
    }

    fn observe(&self, snapshot: S) {
        let request = {
            let mut scheduler = self.inner.scheduler.lock();
            match scheduler.phase {
                Phase::Stopped => return,
                Phase::Idle => {
                    scheduler.observed = snapshot;
                    if scheduler.changed() {
                        scheduler.phase = Phase::Dirty;
                        true
                    } else {
                        false
                    }
                }
                Phase::Dirty | Phase::Rendering => {
                    scheduler.observed = snapshot;
                    false
                }
            }
        };
        if request {
            self.request_frame();
        }
    }

    fn request_frame(&self) {
        tracing::trace!("frame requested");
        let weak = Arc::downgrade(&self.inner);
        self.inner.frame_clock.request_frame(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                App { inner }.check_render(true);
            }
        }));
    }

    /// Frames only act on a dirty scheduler; a synchronous `render_now`
    /// may also start from idle.
    fn check_render(&self, from_frame: bool) -> bool {
        {
            let mut scheduler = self.inner.scheduler.lock();
            match scheduler.phase {
                Phase::Dirty => {}
                Phase::Idle if !from_frame => {}
                phase => {
                    tracing::trace!(?phase, "render skipped");
                    return false;
                }
            }
            if !scheduler.changed() {
                scheduler.phase = Phase::Idle;
                return false;
            }
            scheduler.last_rendered = Some(scheduler.observed.clone());
            scheduler.phase = Phase::Rendering;
        }
        self.commit();
        true
    }

    fn commit(&self) {
        let mut guard = CommitGuard {
            scheduler: &self.inner.scheduler,
            armed: true,
        };
        let view = (self.inner.root)(self);

        let weak = Arc::downgrade(&self.inner);
        let (done, commit) = Completion::pair(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                App { inner }.completed();
            }
        }));

        tracing::trace!("committing render");
        self.inner
            .renderer
            .lock()
            .render(view, &self.inner.container, done);
        guard.armed = false;
        commit.rendered();
    }

    fn completed(&self) {
        if self.phase() == Phase::Stopped {
            return;
        }
        self.inner.lifecycle.run(&self.inner.container);

        let request = {
            let mut scheduler = self.inner.scheduler.lock();
            if scheduler.phase != Phase::Rendering {
                false
            } else if scheduler.changed() {
                scheduler.phase = Phase::Dirty;
                true
            } else {
                scheduler.phase = Phase::Idle;
                false
            }
        };
        if request {
            self.request_frame();
        }
    }
}
