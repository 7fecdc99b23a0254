#![cfg_attr(feature = "no_std", no_std)]

//! A small unidirectional data flow runtime for UI applications, with
//! `no_std` support.
//!
//! State lives in a single [`Store`] holding an immutable snapshot. User
//! intent enters through named [`Event`]s, state changes only through
//! [`Mutator`]s (pure `old -> new` transforms), and views read state through
//! [`Query`]s. The [`App`] observes the store and turns any number of
//! transitions between two frames into one render, handed to a pluggable
//! [`Renderer`]. Expensive render functions can be wrapped in a [`Memo`]
//! keyed on reference-stable fields.
//!
//! The runtime never owns a loop. The host supplies a [`FrameClock`] and a
//! [`Timer`], usually thin closures over its own event loop.
//!
//! ## Example
//!
//! ```rust
//! use oxide_flux::{App, InputEvent, ManualFrameClock, ManualTimer, TestContainer, TestRenderer};
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! #[derive(Clone, Default)]
//! struct Model {
//!     title: String,
//!     count: i64,
//! }
//!
//! type State = Arc<Model>;
//! type Params = BTreeMap<String, String>;
//!
//! struct View {
//!     label: String,
//!     on_title_change: Box<dyn Fn(&InputEvent) + Send + Sync>,
//! }
//!
//! let timer = ManualTimer::new();
//! let frames = ManualFrameClock::new();
//! let renderer = TestRenderer::new();
//!
//! let mut builder = App::builder(State::default(), timer);
//! let title_changed = builder.event::<Params>("titleChanged");
//! let set_title = builder.mutator("setTitle", |state: &State, title: String| {
//!     Arc::new(Model { title, ..(**state).clone() })
//! });
//! let label = builder.query("label", |state: &State, ()| {
//!     format!("{} ({})", state.title, state.count)
//! });
//!
//! title_changed.subscribe(move |params, _| {
//!     set_title.run(params.get("value").cloned().unwrap_or_default())
//! });
//!
//! let on_change = title_changed.clone();
//! builder.render(move |_app: &App<State, View, TestContainer>| View {
//!     label: label.run(()),
//!     on_title_change: Box::new(on_change.dispatch_change_cb::<InputEvent>(Params::new())),
//! });
//!
//! let app = builder
//!     .build(renderer.clone(), TestContainer::new(), frames.clone())
//!     .unwrap();
//! app.start_render_loop().unwrap();
//!
//! // The host feeds an input event into the rendered callback...
//! renderer.with_renders(|views| (views[0].on_title_change)(&InputEvent::change("Inbox")));
//! // ...and renders on its next frame.
//! frames.tick();
//!
//! renderer.with_renders(|views| assert_eq!(views[1].label, "Inbox (0)"));
//! ```

#[cfg(feature = "no_std")]
extern crate alloc;

// Module declarations
mod config;
mod deferred;
mod error;
mod event;
mod hooks;
mod host;
mod memo;
mod mutator;
mod query;
mod registry;
mod renderer;
mod runtime;
mod snapshot;
mod store;
mod subscribers;
#[cfg(any(test, feature = "testing"))]
mod testing;

// Public re-exports
pub use config::AppBuilder;
pub use deferred::{Deferrer, TaskHandle};
pub use error::{Error, Result};
pub use event::{Event, FieldSet};
pub use hooks::{FOCUS_ATTEMPTS, MOUNT_ATTEMPTS};
pub use host::{FrameClock, InputEvent, Task, Timer, UiEvent, COMMIT_KEY};
pub use memo::{Field, Memo, Projection};
pub use mutator::{state_updater, Mutator};
pub use query::Query;
pub use registry::{Kind, Registries};
pub use renderer::{Completion, Container, Focusable, Renderer};
pub use runtime::{App, Phase, DEFAULT_ID_PREFIX};
pub use snapshot::{Merge, Snapshot};
pub use store::Store;
pub use subscribers::{Subscribers, SubscriptionId};

// Test utilities (only available with 'testing' feature or during tests)
#[cfg(any(test, feature = "testing"))]
pub use renderer::TestRenderer;
#[cfg(any(test, feature = "testing"))]
pub use testing::{ManualFrameClock, ManualTimer, NodeAction, TestContainer, TestNode};
