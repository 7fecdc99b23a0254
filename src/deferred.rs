//! Cancellable deferred work on top of the host [`Timer`].

#[cfg(feature = "no_std")]
use alloc::boxed::Box;
#[cfg(feature = "no_std")]
use alloc::vec::Vec;

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use portable_atomic_util::{Arc, Weak};
use spin::Mutex;

use crate::host::Timer;

#[derive(Default)]
struct TaskState {
    cancelled: AtomicBool,
    finished: AtomicBool,
}

impl TaskState {
    fn is_live(&self) -> bool {
        !self.cancelled.load(Ordering::Acquire) && !self.finished.load(Ordering::Acquire)
    }
}

/// Handle to a task scheduled through a [`Deferrer`].
///
/// Dropping the handle does not cancel the task.
pub struct TaskHandle {
    state: Arc<TaskState>,
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl TaskHandle {
    /// Prevent the task from running. No effect once it ran.
    pub fn cancel(&self) {
        if self.is_finished() {
            return;
        }
        self.state.cancelled.store(true, Ordering::Release);
    }

    /// Whether [`cancel`](Self::cancel) stopped the task before it ran.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Whether the task body already ran.
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Acquire)
    }
}

struct DeferrerInner {
    timer: Box<dyn Timer + Send + Sync>,
    pending: Mutex<Vec<Weak<TaskState>>>,
    closed: AtomicBool,
}

/// Schedules work on the host timer and remembers it until it runs, so the
/// owner can cancel everything at once on teardown.
///
/// Cloning shares the timer and the set of pending tasks.
#[derive(Clone)]
pub struct Deferrer {
    inner: Arc<DeferrerInner>,
}

impl fmt::Debug for Deferrer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferrer")
            .field("pending", &self.pending())
            .finish()
    }
}

impl Deferrer {
    /// Create a deferrer that hands its tasks to `timer`.
    ///
    /// # Arguments
    ///
    /// * `timer` - The host timer; it receives each task and its delay.
    pub fn new<T>(timer: T) -> Self
    where
        T: Timer + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(DeferrerInner {
                timer: Box::new(timer),
                pending: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Run `task` after `delay` unless it is cancelled first.
    ///
    /// Once the deferrer is [closed](Self::close) the task is dropped and the
    /// returned handle reports it as cancelled.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let state = Arc::new(TaskState::default());
        if self.is_closed() {
            tracing::trace!("deferrer closed, dropping task");
            state.cancelled.store(true, Ordering::Release);
            return TaskHandle { state };
        }
        {
            let mut pending = self.inner.pending.lock();
            pending.retain(|weak| weak.upgrade().is_some_and(|state| state.is_live()));
            pending.push(Arc::downgrade(&state));
        }

        let running = state.clone();
        self.inner.timer.schedule(
            delay,
            Box::new(move || {
                if running.cancelled.load(Ordering::Acquire) {
                    tracing::trace!("skipping cancelled deferred task");
                    return;
                }
                running.finished.store(true, Ordering::Release);
                task();
            }),
        );

        TaskHandle { state }
    }

    /// Cancel every task that has not run yet.
    pub fn cancel_all(&self) {
        let pending = core::mem::take(&mut *self.inner.pending.lock());
        let mut cancelled = 0usize;
        for state in pending.iter().filter_map(Weak::upgrade) {
            if state.is_live() {
                state.cancelled.store(true, Ordering::Release);
                cancelled += 1;
            }
        }
        tracing::debug!(cancelled, "cancelled deferred tasks");
    }

    /// Cancel everything pending and refuse new tasks.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.cancel_all();
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Number of scheduled tasks that have neither run nor been cancelled.
    pub fn pending(&self) -> usize {
        self.inner
            .pending
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|state| state.is_live())
            .count()
    }
}
