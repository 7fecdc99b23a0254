//! Name-keyed tables of events, queries and mutators.

#[cfg(feature = "no_std")]
use alloc::boxed::Box;
#[cfg(feature = "no_std")]
use alloc::collections::BTreeMap;
#[cfg(feature = "no_std")]
use alloc::string::{String, ToString};
#[cfg(feature = "no_std")]
use alloc::vec::Vec;
#[cfg(not(feature = "no_std"))]
use std::collections::BTreeMap;

use core::any::Any;
use core::fmt;

use crate::error::{Error, Result};
use crate::event::Event;
use crate::mutator::Mutator;
use crate::query::Query;

/// Which table a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Event,
    Query,
    Mutator,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Event => "event",
            Kind::Query => "query",
            Kind::Mutator => "mutator",
        })
    }
}

/// A type-erased registered handle.
trait Entry: Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Subscriber count, for entries that have subscribers.
    fn listeners(&self) -> Option<usize> {
        None
    }
}

impl<P: 'static> Entry for Event<P> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn listeners(&self) -> Option<usize> {
        Some(self.subscriber_count())
    }
}

impl<S: Send + 'static, P: 'static, R: 'static> Entry for Query<S, P, R> {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<S: Send + 'static, P: 'static> Entry for Mutator<S, P> {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct Table {
    kind: Kind,
    entries: BTreeMap<String, Box<dyn Entry>>,
}

impl Table {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    fn insert<T: Entry + 'static>(&mut self, name: &str, handle: T) {
        if self
            .entries
            .insert(name.to_string(), Box::new(handle))
            .is_some()
        {
            tracing::debug!(kind = %self.kind, name, "overwrote registration");
        } else {
            tracing::debug!(kind = %self.kind, name, "registered");
        }
    }

    fn get<T: Clone + 'static>(&self, name: &str) -> Result<T> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| Error::unknown(self.kind, name))?;
        entry
            .as_any()
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| Error::TypeMismatch {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// The application's events, queries and mutators, by name.
///
/// Registering a name twice replaces the earlier handle. Handles already
/// given out keep working; they are just no longer reachable by name.
pub struct Registries {
    events: Table,
    queries: Table,
    mutators: Table,
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registries")
            .field("events", &self.events.names())
            .field("queries", &self.queries.names())
            .field("mutators", &self.mutators.names())
            .finish()
    }
}

impl Registries {
    /// Empty tables.
    pub fn new() -> Self {
        Self {
            events: Table::new(Kind::Event),
            queries: Table::new(Kind::Query),
            mutators: Table::new(Kind::Mutator),
        }
    }

    /// Register `event` under its own name.
    pub fn add_event<P: 'static>(&mut self, event: Event<P>) {
        let name = event.name().to_string();
        self.events.insert(&name, event);
    }

    /// Register `query` under its own name.
    pub fn add_query<S, P, R>(&mut self, query: Query<S, P, R>)
    where
        S: Send + 'static,
        P: 'static,
        R: 'static,
    {
        let name = query.name().to_string();
        self.queries.insert(&name, query);
    }

    /// Register `mutator` under its own name.
    pub fn add_mutator<S, P>(&mut self, mutator: Mutator<S, P>)
    where
        S: Send + 'static,
        P: 'static,
    {
        let name = mutator.name().to_string();
        self.mutators.insert(&name, mutator);
    }

    /// The event registered as `name`, if it carries `P`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownEvent`] for an unregistered name,
    /// [`Error::TypeMismatch`] for other params.
    pub fn event<P: 'static>(&self, name: &str) -> Result<Event<P>> {
        self.events.get(name)
    }

    /// The query registered as `name`, with the same errors as [`event`](Self::event).
    pub fn query<S, P, R>(&self, name: &str) -> Result<Query<S, P, R>>
    where
        S: Send + 'static,
        P: 'static,
        R: 'static,
    {
        self.queries.get(name)
    }

    /// The mutator registered as `name`, with the same errors as [`event`](Self::event).
    pub fn mutator<S, P>(&self, name: &str) -> Result<Mutator<S, P>>
    where
        S: Send + 'static,
        P: 'static,
    {
        self.mutators.get(name)
    }

    /// Registered names of one kind, sorted.
    pub fn names(&self, kind: Kind) -> Vec<String> {
        match kind {
            Kind::Event => self.events.names(),
            Kind::Query => self.queries.names(),
            Kind::Mutator => self.mutators.names(),
        }
    }

    /// Events nobody subscribed to, usually leftovers worth deleting.
    pub fn orphaned_events(&self) -> Vec<String> {
        self.events
            .entries
            .iter()
            .filter(|(_, entry)| entry.listeners() == Some(0))
            .map(|(name, _)| name.clone())
            .collect()
    }
}
