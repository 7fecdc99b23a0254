//! Contracts the runtime needs from the immutable state value.

#[cfg(feature = "no_std")]
use alloc::collections::BTreeMap;
#[cfg(feature = "no_std")]
use alloc::sync::Arc as SharedArc;
#[cfg(not(feature = "no_std"))]
use std::collections::BTreeMap;
#[cfg(not(feature = "no_std"))]
use std::sync::Arc as SharedArc;

/// An immutable, structurally shared state value.
///
/// Cloning must be cheap and must preserve identity: a clone is the *same*
/// snapshot. [`same`](Self::same) is the only equality the render scheduler
/// uses, and it must mean reference identity rather than deep equality, so
/// a transform that returns its input unchanged is recognized as "nothing
/// to render".
pub trait Snapshot: Clone {
    /// Whether `self` and `other` are the same snapshot by reference.
    fn same(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Snapshot for SharedArc<T> {
    fn same(&self, other: &Self) -> bool {
        SharedArc::ptr_eq(self, other)
    }
}

impl<T> Snapshot for portable_atomic_util::Arc<T> {
    fn same(&self, other: &Self) -> bool {
        portable_atomic_util::Arc::ptr_eq(self, other)
    }
}

/// Snapshots that support a structural merge.
///
/// Used by [`Store::merge`](crate::Store::merge). Entries of `incoming` win
/// over entries of `self`.
pub trait Merge: Snapshot {
    /// A new snapshot holding `self` overlaid with `incoming`.
    fn merge(&self, incoming: Self) -> Self;
}

impl<K: Ord + Clone, V: Clone> Merge for SharedArc<BTreeMap<K, V>> {
    fn merge(&self, incoming: Self) -> Self {
        if incoming.is_empty() {
            return self.clone();
        }
        let mut merged = BTreeMap::clone(self);
        merged.extend(incoming.iter().map(|(k, v)| (k.clone(), v.clone())));
        SharedArc::new(merged)
    }
}

#[cfg(not(feature = "no_std"))]
impl<K, V, H> Merge for SharedArc<std::collections::HashMap<K, V, H>>
where
    K: Eq + core::hash::Hash + Clone,
    V: Clone,
    H: core::hash::BuildHasher + Clone,
{
    fn merge(&self, incoming: Self) -> Self {
        if incoming.is_empty() {
            return self.clone();
        }
        let mut merged = std::collections::HashMap::clone(self);
        merged.extend(incoming.iter().map(|(k, v)| (k.clone(), v.clone())));
        SharedArc::new(merged)
    }
}

#[cfg(feature = "im")]
mod persistent {
    use super::{Merge, Snapshot};
    use core::hash::{BuildHasher, Hash};

    impl<K, V, S> Snapshot for im::HashMap<K, V, S>
    where
        K: Hash + Eq + Clone,
        V: Clone,
        S: BuildHasher,
    {
        fn same(&self, other: &Self) -> bool {
            self.ptr_eq(other)
        }
    }

    impl<K, V, S> Merge for im::HashMap<K, V, S>
    where
        K: Hash + Eq + Clone,
        V: Clone,
        S: BuildHasher,
    {
        fn merge(&self, incoming: Self) -> Self {
            if incoming.is_empty() {
                return self.clone();
            }
            let mut merged = self.clone();
            for (key, value) in incoming {
                merged.insert(key, value);
            }
            merged
        }
    }

    impl<K: Ord + Clone, V: Clone> Snapshot for im::OrdMap<K, V> {
        fn same(&self, other: &Self) -> bool {
            self.ptr_eq(other)
        }
    }

    impl<K: Ord + Clone, V: Clone> Merge for im::OrdMap<K, V> {
        fn merge(&self, incoming: Self) -> Self {
            if incoming.is_empty() {
                return self.clone();
            }
            let mut merged = self.clone();
            for (key, value) in incoming {
                merged.insert(key, value);
            }
            merged
        }
    }

    impl<A: Clone> Snapshot for im::Vector<A> {
        fn same(&self, other: &Self) -> bool {
            self.ptr_eq(other)
        }
    }
}
