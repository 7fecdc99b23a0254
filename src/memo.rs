//! Memoized render functions keyed on reference-stable projections.

#[cfg(feature = "no_std")]
use alloc::boxed::Box;
#[cfg(feature = "no_std")]
use alloc::string::String;

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use spin::Mutex;

/// One field of a [`Projection`].
///
/// Structured values compare by reference, plain values (numbers, strings)
/// by value, since they are immutable anyway.
pub trait Field {
    fn same_field(&self, previous: &Self) -> bool;
}

macro_rules! field_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Field for $ty {
                fn same_field(&self, previous: &Self) -> bool {
                    self == previous
                }
            }
        )*
    };
}

field_by_value!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
    String, &'static str,
);

#[cfg(not(feature = "no_std"))]
impl<T: ?Sized> Field for std::sync::Arc<T> {
    fn same_field(&self, previous: &Self) -> bool {
        std::sync::Arc::ptr_eq(self, previous)
    }
}

#[cfg(feature = "no_std")]
impl<T: ?Sized> Field for alloc::sync::Arc<T> {
    fn same_field(&self, previous: &Self) -> bool {
        alloc::sync::Arc::ptr_eq(self, previous)
    }
}

impl<T> Field for portable_atomic_util::Arc<T> {
    fn same_field(&self, previous: &Self) -> bool {
        portable_atomic_util::Arc::ptr_eq(self, previous)
    }
}

impl<T: Field> Field for Option<T> {
    fn same_field(&self, previous: &Self) -> bool {
        match (self, previous) {
            (Some(current), Some(previous)) => current.same_field(previous),
            (None, None) => true,
            _ => false,
        }
    }
}

#[cfg(feature = "im")]
mod persistent {
    use super::Field;
    use crate::snapshot::Snapshot;
    use core::hash::{BuildHasher, Hash};

    impl<K: Hash + Eq + Clone, V: Clone, S: BuildHasher> Field for im::HashMap<K, V, S> {
        fn same_field(&self, previous: &Self) -> bool {
            self.same(previous)
        }
    }

    impl<K: Ord + Clone, V: Clone> Field for im::OrdMap<K, V> {
        fn same_field(&self, previous: &Self) -> bool {
            self.same(previous)
        }
    }

    impl<A: Clone> Field for im::Vector<A> {
        fn same_field(&self, previous: &Self) -> bool {
            self.same(previous)
        }
    }
}

/// The small, flat read model a memoized render function depends on.
///
/// Implemented for tuples of [`Field`]s; implement it for your own structs by
/// comparing each field with [`Field::same_field`]. A projection holding
/// structured values rebuilt on every query never compares equal, so every
/// call recomputes.
pub trait Projection {
    /// Whether every field is the same as in `previous`.
    fn unchanged(&self, previous: &Self) -> bool;
}

macro_rules! tuple_projection {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Field),+> Projection for ($($name,)+) {
            fn unchanged(&self, previous: &Self) -> bool {
                $(self.$idx.same_field(&previous.$idx))&&+
            }
        }
    };
}

tuple_projection!(A: 0);
tuple_projection!(A: 0, B: 1);
tuple_projection!(A: 0, B: 1, C: 2);
tuple_projection!(A: 0, B: 1, C: 2, D: 3);
tuple_projection!(A: 0, B: 1, C: 2, D: 3, E: 4);
tuple_projection!(A: 0, B: 1, C: 2, D: 3, E: 4, G: 5);

type RenderFn<P, C, R> = Box<dyn Fn(&P, &C) -> R + Send + Sync>;

/// Caches the last result of a render function together with the projection
/// that produced it.
///
/// [`call`](Self::call) returns the cached result when every field of the
/// new projection is the same as the cached one, and recomputes otherwise.
/// The second argument (`ctx`, usually the event handles or the app) is not
/// part of the cache key.
///
/// ```rust
/// use oxide_flux::Memo;
/// use std::sync::Arc;
///
/// let render_title = Memo::new("title", |(title,): &(Arc<str>,), _: &()| {
///     format!("<h1>{title}</h1>")
/// });
///
/// let title: Arc<str> = Arc::from("Inbox");
/// assert_eq!(render_title.call((title.clone(),), &()), "<h1>Inbox</h1>");
/// render_title.call((title,), &());
/// assert_eq!(render_title.hits(), 1);
/// ```
pub struct Memo<P, C: ?Sized, R> {
    name: String,
    render: RenderFn<P, C, R>,
    cache: Mutex<Option<(P, R)>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<P, C: ?Sized, R> fmt::Debug for Memo<P, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("name", &self.name)
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}

impl<P, C: ?Sized, R> Memo<P, C, R> {
    /// Calls answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Calls that ran the render function.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

impl<P: Projection, C: ?Sized, R: Clone> Memo<P, C, R> {
    /// Wrap `render` under `name`, which only shows up in traces.
    pub fn new<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&P, &C) -> R + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            render: Box::new(render),
            cache: Mutex::new(None),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Return the cached result if `projection` is unchanged, else render.
    pub fn call(&self, projection: P, ctx: &C) -> R {
        if let Some((previous, result)) = self.cache.lock().as_ref() {
            if projection.unchanged(previous) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(memo = %self.name, "hit");
                return result.clone();
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(memo = %self.name, "miss");
        let result = (self.render)(&projection, ctx);
        *self.cache.lock() = Some((projection, result.clone()));
        result
    }

    /// Drop the cached result; the next call recomputes.
    pub fn invalidate(&self) {
        *self.cache.lock() = None;
    }
}
