//! Host primitives the runtime is driven by.
//!
//! The runtime never spins its own loop. A host hands it a frame clock (to
//! schedule renders) and a timer (for deferred dispatch), and feeds UI input
//! events into the callbacks produced by [`Event`](crate::Event).

#[cfg(feature = "no_std")]
use alloc::boxed::Box;
#[cfg(feature = "no_std")]
use alloc::string::String;

use core::time::Duration;

/// A unit of deferred work handed to the host.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// The host's frame clock.
///
/// The runtime keeps at most one frame request outstanding at a time. The
/// callback must run on the host's next frame tick.
///
/// Closures with a matching signature implement this trait, so a host can
/// pass `|task| queue.push(task)` directly.
pub trait FrameClock {
    fn request_frame(&self, callback: Task);
}

impl<F> FrameClock for F
where
    F: Fn(Task),
{
    fn request_frame(&self, callback: Task) {
        self(callback)
    }
}

/// The host's timer.
///
/// `Duration::ZERO` means "as soon as the current call stack finished", not
/// "now". The host does not need to support cancellation; the runtime wraps
/// every task so that cancelled ones do nothing when they fire.
pub trait Timer {
    fn schedule(&self, delay: Duration, task: Task);
}

impl<F> Timer for F
where
    F: Fn(Duration, Task),
{
    fn schedule(&self, delay: Duration, task: Task) {
        self(delay, task)
    }
}

/// Key identifier that commits an input, see
/// [`Event::dispatch_enter_cb`](crate::Event::dispatch_enter_cb).
pub const COMMIT_KEY: &str = "Enter";

/// The part of a UI input event the event callback factories read.
pub trait UiEvent {
    /// Current value of the input that fired the event.
    fn value(&self) -> &str;

    /// Key identifier for keyboard events, `None` otherwise.
    fn key(&self) -> Option<&str>;
}

/// A plain [`UiEvent`], for hosts without their own event type and for tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputEvent {
    pub value: String,
    pub key: Option<String>,
}

impl InputEvent {
    /// A change event carrying `value`.
    pub fn change(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            key: None,
        }
    }

    /// A key event for `key`.
    pub fn key_press(key: impl Into<String>) -> Self {
        Self {
            value: String::new(),
            key: Some(key.into()),
        }
    }
}

impl UiEvent for InputEvent {
    fn value(&self) -> &str {
        &self.value
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}
