//! Post-render lifecycle: after-render hooks and unmount watches.

#[cfg(feature = "no_std")]
use alloc::boxed::Box;
#[cfg(feature = "no_std")]
use alloc::string::String;
#[cfg(feature = "no_std")]
use alloc::vec::Vec;

use core::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

use crate::renderer::Container;

/// Retry budget for [`App::focus_after_render`](crate::App::focus_after_render).
pub const FOCUS_ATTEMPTS: u32 = 2;

/// Retry budget for [`App::on_mount`](crate::App::on_mount).
pub const MOUNT_ATTEMPTS: u32 = 5;

type NodeCallback<N> = Box<dyn FnOnce(&N) + Send>;

struct AfterRender<N> {
    target_id: String,
    callback: NodeCallback<N>,
    attempts: u32,
    max_attempts: u32,
}

struct UnmountWatch<N> {
    node: N,
    callback: NodeCallback<N>,
}

/// Work the controller runs after every completed render.
///
/// After-render hooks wait for an element id to show up in the container;
/// a commit does not always make nested or conditional content available
/// right away, so each hook gets a bounded number of completions before it
/// is dropped. Unmount watches fire once their node left the container and
/// otherwise stay registered for the lifetime of the controller.
///
/// Once [`clear`](Self::clear)ed nothing runs or registers again, including
/// the rest of a pass that was in progress when it was called.
pub(crate) struct Lifecycle<N> {
    after_render: Mutex<Vec<AfterRender<N>>>,
    unmount_watches: Mutex<Vec<UnmountWatch<N>>>,
    closed: AtomicBool,
}

impl<N> Lifecycle<N> {
    pub(crate) fn new() -> Self {
        Self {
            after_render: Mutex::new(Vec::new()),
            unmount_watches: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn after_render<F>(&self, target_id: String, max_attempts: u32, callback: F)
    where
        F: FnOnce(&N) + Send + 'static,
    {
        if self.is_closed() {
            return;
        }
        self.after_render.lock().push(AfterRender {
            target_id,
            callback: Box::new(callback),
            attempts: 0,
            max_attempts,
        });
    }

    pub(crate) fn watch_unmount<F>(&self, node: N, callback: F)
    where
        F: FnOnce(&N) + Send + 'static,
    {
        if self.is_closed() {
            return;
        }
        self.unmount_watches.lock().push(UnmountWatch {
            node,
            callback: Box::new(callback),
        });
    }

    pub(crate) fn pending_hooks(&self) -> usize {
        self.after_render.lock().len()
    }

    pub(crate) fn watched_unmounts(&self) -> usize {
        self.unmount_watches.lock().len()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Drop everything pending and refuse new entries.
    pub(crate) fn clear(&self) {
        self.closed.store(true, Ordering::Release);
        self.after_render.lock().clear();
        self.unmount_watches.lock().clear();
    }

    /// Process both lists against the freshly committed container.
    ///
    /// Callbacks run without any lock held. Entries they register are kept
    /// for the next completion, behind the survivors of this one.
    pub(crate) fn run<C>(&self, container: &C)
    where
        C: Container<Node = N>,
    {
        self.run_after_render(container);
        self.run_unmount_watches(container);
    }

    fn run_after_render<C>(&self, container: &C)
    where
        C: Container<Node = N>,
    {
        let queue = core::mem::take(&mut *self.after_render.lock());
        let mut retained = Vec::with_capacity(queue.len());

        for mut hook in queue {
            if self.is_closed() {
                return;
            }
            match container.find_by_id(&hook.target_id) {
                Some(node) => (hook.callback)(&node),
                None => {
                    hook.attempts += 1;
                    if hook.attempts < hook.max_attempts {
                        retained.push(hook);
                    } else {
                        tracing::debug!(
                            target_id = %hook.target_id,
                            attempts = hook.attempts,
                            "dropping after-render hook, target never appeared"
                        );
                    }
                }
            }
        }

        let mut queue = self.after_render.lock();
        if self.is_closed() {
            return;
        }
        retained.append(&mut queue);
        *queue = retained;
    }

    fn run_unmount_watches<C>(&self, container: &C)
    where
        C: Container<Node = N>,
    {
        let watches = core::mem::take(&mut *self.unmount_watches.lock());
        let mut retained = Vec::with_capacity(watches.len());

        for watch in watches {
            if self.is_closed() {
                return;
            }
            if container.contains(&watch.node) {
                retained.push(watch);
            } else {
                (watch.callback)(&watch.node);
            }
        }

        let mut watches = self.unmount_watches.lock();
        if self.is_closed() {
            return;
        }
        retained.append(&mut watches);
        *watches = retained;
    }
}
