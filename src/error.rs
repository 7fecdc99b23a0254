//! Error type for registry lookups and controller lifecycle.

#[cfg(feature = "no_std")]
use alloc::string::String;

use crate::registry::Kind;

/// Errors surfaced by the runtime.
///
/// Most of the runtime is infallible by contract: subscriber panics,
/// transform panics and render panics propagate to the caller untouched.
/// The variants below cover the few places where the runtime itself can
/// refuse a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No event is registered under the name.
    #[error("unknown event `{0}`")]
    UnknownEvent(String),

    /// No query is registered under the name.
    #[error("unknown query `{0}`")]
    UnknownQuery(String),

    /// No mutator is registered under the name.
    #[error("unknown mutator `{0}`")]
    UnknownMutator(String),

    /// The name is registered, but with different parameter or result types
    /// than the ones requested.
    #[error("{kind} `{name}` is registered with different types")]
    TypeMismatch { kind: Kind, name: String },

    /// [`AppBuilder::build`](crate::AppBuilder::build) was called without a
    /// root render function.
    #[error("no root render function configured")]
    MissingRender,

    /// The controller was stopped.
    #[error("application is stopped")]
    Stopped,
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

impl Error {
    pub(crate) fn unknown(kind: Kind, name: &str) -> Self {
        match kind {
            Kind::Event => Self::UnknownEvent(name.into()),
            Kind::Query => Self::UnknownQuery(name.into()),
            Kind::Mutator => Self::UnknownMutator(name.into()),
        }
    }
}
