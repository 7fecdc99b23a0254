//! Renderer abstraction: committing render results into a UI container.

#[cfg(feature = "no_std")]
use alloc::vec::Vec;

use core::fmt;

use portable_atomic_util::Arc;
use spin::Mutex;

use crate::host::Task;

/// The UI container an application renders into.
///
/// The runtime only needs two questions answered after each commit: which
/// node carries a given element id (for after-render hooks), and whether a
/// node is still mounted (for unmount watches).
pub trait Container {
    type Node;

    fn find_by_id(&self, id: &str) -> Option<Self::Node>;

    fn contains(&self, node: &Self::Node) -> bool;
}

/// Nodes that can take input focus, see
/// [`App::focus_after_render`](crate::App::focus_after_render).
pub trait Focusable {
    fn focus(&self);

    /// Select the node's content, for inputs. Does nothing by default.
    fn select(&self) {}
}

/// Renderer abstraction for committing render results.
///
/// Implement this trait to plug your UI toolkit (DOM bridge, terminal,
/// embedded display, ...) into the runtime. [`render`](Self::render) receives
/// the value produced by the root render function and must call
/// [`Completion::complete`] exactly once when the result is committed,
/// either before returning or later from the host's own loop.
///
/// # Example
///
/// ```rust
/// use oxide_flux::{Completion, Container, Renderer};
///
/// struct Screen;
///
/// impl Container for Screen {
///     type Node = ();
///     fn find_by_id(&self, _id: &str) -> Option<()> { None }
///     fn contains(&self, _node: &()) -> bool { false }
/// }
///
/// struct ConsoleRenderer;
///
/// impl Renderer<String, Screen> for ConsoleRenderer {
///     fn render(&mut self, view: String, _screen: &Screen, done: Completion) {
///         println!("{view}");
///         done.complete();
///     }
/// }
/// ```
pub trait Renderer<View, C: Container> {
    fn render(&mut self, view: View, container: &C, done: Completion);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    /// `render` has not returned yet.
    Committing,
    /// `complete` was called before `render` returned.
    CompletedEarly,
    /// `render` returned, waiting for `complete`.
    Waiting,
    Done,
}

struct CompletionInner {
    signal: Mutex<Signal>,
    on_complete: Mutex<Option<Task>>,
}

impl CompletionInner {
    fn fire(&self) {
        let task = self.on_complete.lock().take();
        if let Some(task) = task {
            task();
        }
    }
}

/// One-shot signal that a render result was committed.
///
/// Completing from inside [`Renderer::render`] is allowed; the runtime then
/// runs its post-render work right after `render` returns, so no renderer
/// state is borrowed while hooks run.
pub struct Completion {
    inner: Arc<CompletionInner>,
    completed: bool,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("signal", &*self.inner.signal.lock())
            .finish()
    }
}

impl Completion {
    pub(crate) fn pair(on_complete: Task) -> (Self, Commit) {
        let inner = Arc::new(CompletionInner {
            signal: Mutex::new(Signal::Committing),
            on_complete: Mutex::new(Some(on_complete)),
        });
        (
            Self {
                inner: inner.clone(),
                completed: false,
            },
            Commit { inner },
        )
    }

    /// Signal that the render result is committed.
    pub fn complete(mut self) {
        self.completed = true;
        let fire = {
            let mut signal = self.inner.signal.lock();
            match *signal {
                Signal::Committing => {
                    *signal = Signal::CompletedEarly;
                    false
                }
                Signal::Waiting => {
                    *signal = Signal::Done;
                    true
                }
                Signal::CompletedEarly | Signal::Done => false,
            }
        };
        if fire {
            self.inner.fire();
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if !self.completed {
            tracing::warn!("render completion dropped without being completed");
        }
    }
}

/// The runtime's side of a [`Completion`].
pub(crate) struct Commit {
    inner: Arc<CompletionInner>,
}

impl Commit {
    /// Called once `Renderer::render` returned.
    pub(crate) fn rendered(self) {
        let fire = {
            let mut signal = self.inner.signal.lock();
            match *signal {
                Signal::Committing => {
                    *signal = Signal::Waiting;
                    false
                }
                Signal::CompletedEarly => {
                    *signal = Signal::Done;
                    true
                }
                Signal::Waiting | Signal::Done => false,
            }
        };
        if fire {
            self.inner.fire();
        }
    }
}

#[cfg(any(test, feature = "testing"))]
/// Test renderer that captures every committed view for assertions.
///
/// Only available with the `testing` feature.
///
/// By default each render completes immediately. With
/// [`deferred`](Self::deferred) the completions are held until
/// [`complete_pending`](Self::complete_pending), which mimics a renderer that
/// commits asynchronously.
pub struct TestRenderer<View> {
    renders: Arc<Mutex<Vec<View>>>,
    held: Option<Arc<Mutex<Vec<Completion>>>>,
}

#[cfg(any(test, feature = "testing"))]
impl<View> Clone for TestRenderer<View> {
    fn clone(&self) -> Self {
        Self {
            renders: self.renders.clone(),
            held: self.held.clone(),
        }
    }
}

#[cfg(any(test, feature = "testing"))]
impl<View> Default for TestRenderer<View> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "testing"))]
impl<View, C: Container> Renderer<View, C> for TestRenderer<View> {
    fn render(&mut self, view: View, _container: &C, done: Completion) {
        self.renders.lock().push(view);
        match &self.held {
            Some(held) => held.lock().push(done),
            None => done.complete(),
        }
    }
}

#[cfg(any(test, feature = "testing"))]
impl<View> TestRenderer<View> {
    /// A renderer that completes every render immediately.
    pub fn new() -> Self {
        Self {
            renders: Arc::new(Mutex::new(Vec::new())),
            held: None,
        }
    }

    /// A renderer that holds completions until
    /// [`complete_pending`](Self::complete_pending).
    pub fn deferred() -> Self {
        Self {
            renders: Arc::new(Mutex::new(Vec::new())),
            held: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Get the number of renders that have occurred.
    pub fn count(&self) -> usize {
        self.renders.lock().len()
    }

    /// Number of renders waiting for completion.
    pub fn pending(&self) -> usize {
        self.held.as_ref().map_or(0, |held| held.lock().len())
    }

    /// Complete every held render, oldest first. Returns how many completed.
    pub fn complete_pending(&self) -> usize {
        let Some(held) = &self.held else {
            return 0;
        };
        let completions: Vec<Completion> = held.lock().drain(..).collect();
        let completed = completions.len();
        for done in completions {
            done.complete();
        }
        completed
    }

    /// Access the captured views with a closure.
    pub fn with_renders<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Vec<View>) -> R,
    {
        let renders = self.renders.lock();
        f(&renders)
    }
}
