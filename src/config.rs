//! Application configuration.

#[cfg(feature = "no_std")]
use alloc::boxed::Box;
#[cfg(feature = "no_std")]
use alloc::vec::Vec;

use core::fmt;

use crate::deferred::Deferrer;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::host::{FrameClock, Timer};
use crate::mutator::Mutator;
use crate::query::Query;
use crate::registry::{Kind, Registries};
use crate::renderer::{Container, Renderer};
use crate::runtime::{App, RootRender};
use crate::snapshot::Snapshot;
use crate::store::Store;

/// Collects everything an [`App`] is made of before it starts.
///
/// Events, queries and mutators are created here so their handles can be
/// captured by the root render function and by each other. The host seams
/// (renderer, container, frame clock) are only needed by [`build`](Self::build).
///
/// ```rust
/// use oxide_flux::{App, AppBuilder, Task, TestContainer, TestRenderer};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// type State = Arc<i64>;
///
/// let mut builder: AppBuilder<State, String, TestContainer> =
///     App::builder(Arc::new(0), |_: Duration, task: Task| task());
///
/// let increment = builder.event::<()>("increment");
/// let add = builder.mutator("add", |count: &State, n: i64| Arc::new(**count + n));
/// increment.subscribe(move |_, _| add.run(1));
///
/// let clicked = increment.clone();
/// builder.render(move |app: &App<State, String, TestContainer>| {
///     let _on_click = clicked.dispatch_cb(());
///     format!("count: {}", app.state())
/// });
///
/// let app = builder
///     .build(TestRenderer::new(), TestContainer::new(), |frame: Task| frame())
///     .unwrap();
/// app.start_render_loop().unwrap();
/// increment.dispatch(());
/// assert_eq!(*app.state(), 1);
/// ```
pub struct AppBuilder<S, V, C: Container> {
    store: Store<S>,
    deferrer: Deferrer,
    registries: Registries,
    render: Option<RootRender<S, V, C>>,
}

impl<S, V, C: Container> fmt::Debug for AppBuilder<S, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppBuilder")
            .field("registries", &self.registries)
            .field("render", &self.render.is_some())
            .finish()
    }
}

impl<S, V, C> AppBuilder<S, V, C>
where
    S: Snapshot + Send + Sync + 'static,
    V: 'static,
    C: Container + Send + Sync + 'static,
    C::Node: Send + 'static,
{
    /// Start a builder around `initial_state`.
    ///
    /// # Arguments
    ///
    /// * `initial_state` - The snapshot the store starts with.
    /// * `timer` - The host timer behind every delayed dispatch and mutation.
    pub fn new<T>(initial_state: S, timer: T) -> Self
    where
        T: Timer + Send + Sync + 'static,
    {
        Self {
            store: Store::new(initial_state),
            deferrer: Deferrer::new(timer),
            registries: Registries::new(),
            render: None,
        }
    }

    /// The store the built app will own.
    pub fn store(&self) -> &Store<S> {
        &self.store
    }

    /// The deferrer handed to every event and mutator.
    pub fn deferrer(&self) -> &Deferrer {
        &self.deferrer
    }

    /// Create and register an event.
    pub fn event<P: 'static>(&mut self, name: &str) -> Event<P> {
        let event = Event::new(name, self.deferrer.clone());
        self.registries.add_event(event.clone());
        event
    }

    /// Create one event per name, all with the same parameter type.
    pub fn events<P: 'static>(&mut self, names: &[&str]) -> Vec<Event<P>> {
        names.iter().map(|name| self.event(name)).collect()
    }

    /// Create and register a query over the store.
    pub fn query<P, R, F>(&mut self, name: &str, project: F) -> Query<S, P, R>
    where
        P: 'static,
        R: 'static,
        F: Fn(&S, P) -> R + Send + Sync + 'static,
    {
        let query = Query::new(name, self.store.clone(), project);
        self.registries.add_query(query.clone());
        query
    }

    /// Create and register a mutator from a pure transform.
    pub fn mutator<P, F>(&mut self, name: &str, transform: F) -> Mutator<S, P>
    where
        P: 'static,
        F: Fn(&S, P) -> S + Send + Sync + 'static,
    {
        let mutator = Mutator::new(name, self.store.clone(), self.deferrer.clone(), transform);
        self.registries.add_mutator(mutator.clone());
        mutator
    }

    /// Create and register a mutator that drives the store itself.
    pub fn mutator_fn<P, F>(&mut self, name: &str, apply: F) -> Mutator<S, P>
    where
        P: 'static,
        F: Fn(&Store<S>, P) + Send + Sync + 'static,
    {
        let mutator = Mutator::from_fn(name, self.store.clone(), self.deferrer.clone(), apply);
        self.registries.add_mutator(mutator.clone());
        mutator
    }

    /// Set the root render function. A later call replaces an earlier one.
    pub fn render<F>(&mut self, render: F) -> &mut Self
    where
        F: Fn(&App<S, V, C>) -> V + Send + Sync + 'static,
    {
        self.render = Some(Box::new(render));
        self
    }

    /// Attach the host seams and create the application.
    ///
    /// The app is idle until [`App::start_render_loop`].
    pub fn build<R, F>(self, renderer: R, container: C, frame_clock: F) -> Result<App<S, V, C>>
    where
        R: Renderer<V, C> + Send + 'static,
        F: FrameClock + Send + Sync + 'static,
    {
        let root = self.render.ok_or(Error::MissingRender)?;
        tracing::debug!(
            events = self.registries.names(Kind::Event).len(),
            queries = self.registries.names(Kind::Query).len(),
            mutators = self.registries.names(Kind::Mutator).len(),
            "application built"
        );
        Ok(App::assemble(
            self.store,
            self.deferrer,
            self.registries,
            root,
            renderer,
            container,
            frame_clock,
        ))
    }
}
