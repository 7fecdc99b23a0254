//! Deterministic host doubles for tests.
//!
//! Only available with the `testing` feature or during tests.
//!
//! Frames and timers are queued instead of fired, so a test decides exactly
//! when the runtime gets to render:
//!
//! ```rust
//! use oxide_flux::{App, ManualFrameClock, ManualTimer, TestContainer, TestRenderer};
//! use std::sync::Arc;
//!
//! let frames = ManualFrameClock::new();
//! let renderer = TestRenderer::new();
//!
//! let mut builder = App::builder(Arc::new(0i64), ManualTimer::new());
//! builder.render(|app: &App<Arc<i64>, i64, TestContainer>| *app.state());
//! let app = builder
//!     .build(renderer.clone(), TestContainer::new(), frames.clone())
//!     .unwrap();
//!
//! app.start_render_loop().unwrap();
//! app.store().update(|n| Arc::new(**n + 1));
//! app.store().update(|n| Arc::new(**n + 1));
//! assert_eq!(renderer.count(), 1);
//!
//! frames.tick();
//! assert_eq!(renderer.count(), 2);
//! ```

#[cfg(feature = "no_std")]
use alloc::collections::BTreeMap;
#[cfg(feature = "no_std")]
use alloc::string::String;
#[cfg(feature = "no_std")]
use alloc::vec::Vec;
#[cfg(not(feature = "no_std"))]
use std::collections::BTreeMap;

use core::fmt;
use core::time::Duration;

use flume::{Receiver, Sender};
use portable_atomic_util::Arc;
use spin::Mutex;

use crate::host::{FrameClock, Task, Timer};
use crate::renderer::{Container, Focusable};

/// A frame clock that queues callbacks until [`tick`](Self::tick).
///
/// Clones share the queue, so one clone can go into the app while the test
/// keeps another.
#[derive(Clone)]
pub struct ManualFrameClock {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

impl Default for ManualFrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManualFrameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualFrameClock")
            .field("pending", &self.pending())
            .finish()
    }
}

impl ManualFrameClock {
    /// A clock with no frames requested yet.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    /// Frame callbacks waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Run the callbacks queued so far. Frames they request wait for the
    /// next tick. Returns how many ran.
    pub fn tick(&self) -> usize {
        let due: Vec<Task> = self.receiver.try_iter().collect();
        let ran = due.len();
        for frame in due {
            frame();
        }
        ran
    }
}

impl FrameClock for ManualFrameClock {
    fn request_frame(&self, callback: Task) {
        // Both ends live in self, the channel cannot be disconnected.
        let _ = self.sender.send(callback);
    }
}

/// A timer that queues tasks until [`run_pending`](Self::run_pending).
#[derive(Clone)]
pub struct ManualTimer {
    sender: Sender<(Duration, Task)>,
    receiver: Receiver<(Duration, Task)>,
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTimer")
            .field("pending", &self.pending())
            .finish()
    }
}

impl ManualTimer {
    /// A timer with nothing scheduled.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    /// Tasks waiting for [`run_pending`](Self::run_pending).
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Fire every queued task, shortest delay first, scheduling order
    /// among equal delays. Tasks scheduled meanwhile stay queued.
    pub fn run_pending(&self) -> usize {
        let mut due: Vec<(Duration, Task)> = self.receiver.try_iter().collect();
        due.sort_by_key(|(delay, _)| *delay);
        let ran = due.len();
        for (_, task) in due {
            task();
        }
        ran
    }
}

impl Timer for ManualTimer {
    fn schedule(&self, delay: Duration, task: Task) {
        let _ = self.sender.send((delay, task));
    }
}

/// What happened to a [`TestNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAction {
    Focused(String),
    Selected(String),
}

/// A node handed out by [`TestContainer`].
///
/// Mounting the same id again yields a different node, so a watch on the
/// old one sees it unmounted.
#[derive(Clone)]
pub struct TestNode {
    id: String,
    serial: u64,
    actions: Arc<Mutex<Vec<NodeAction>>>,
}

impl fmt::Debug for TestNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestNode")
            .field("id", &self.id)
            .field("serial", &self.serial)
            .finish()
    }
}

impl PartialEq for TestNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.serial == other.serial
    }
}

impl Eq for TestNode {}

impl TestNode {
    /// The element id the node was mounted under.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Focusable for TestNode {
    fn focus(&self) {
        self.actions.lock().push(NodeAction::Focused(self.id.clone()));
    }

    fn select(&self) {
        self.actions.lock().push(NodeAction::Selected(self.id.clone()));
    }
}

#[derive(Default)]
struct Mounted {
    nodes: BTreeMap<String, TestNode>,
    next_serial: u64,
}

/// An in-memory container of id-addressed nodes.
///
/// Tests (or a test renderer) mount and unmount ids directly; every node
/// records focus and selection into a log shared by the container.
#[derive(Clone, Default)]
pub struct TestContainer {
    mounted: Arc<Mutex<Mounted>>,
    actions: Arc<Mutex<Vec<NodeAction>>>,
}

impl fmt::Debug for TestContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContainer")
            .field("mounted", &self.ids())
            .finish()
    }
}

impl TestContainer {
    /// An empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a fresh node under `id`, replacing any node already there.
    pub fn mount(&self, id: &str) -> TestNode {
        let mut mounted = self.mounted.lock();
        mounted.next_serial += 1;
        let node = TestNode {
            id: id.into(),
            serial: mounted.next_serial,
            actions: self.actions.clone(),
        };
        mounted.nodes.insert(id.into(), node.clone());
        node
    }

    /// Remove the node under `id`, returning it if there was one.
    pub fn unmount(&self, id: &str) -> Option<TestNode> {
        self.mounted.lock().nodes.remove(id)
    }

    /// Mounted ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.mounted.lock().nodes.keys().cloned().collect()
    }

    /// Every focus and selection so far, in order.
    pub fn actions(&self) -> Vec<NodeAction> {
        self.actions.lock().clone()
    }
}

impl Container for TestContainer {
    type Node = TestNode;

    fn find_by_id(&self, id: &str) -> Option<TestNode> {
        self.mounted.lock().nodes.get(id).cloned()
    }

    fn contains(&self, node: &TestNode) -> bool {
        self.mounted.lock().nodes.get(&node.id) == Some(node)
    }
}
