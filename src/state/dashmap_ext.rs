use dashmap::DashMap;
use std::borrow::Borrow;
use std::hash::Hash;

/// Helpers for `DashMap` that release shard locks before the caller continues.
///
/// Anything that may later await or take the room directory lock must work
/// from clones, never from a live `Ref`.
pub trait DashMapExt<K, V> {
    /// Clone the value for `key`, dropping the guard immediately.
    fn get_cloned<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone;

    /// Clone every value, dropping guards immediately.
    fn values_cloned(&self) -> Vec<V>
    where
        V: Clone;

    /// Clone the first value matching `pred`.
    fn find_cloned(&self, pred: impl FnMut(&V) -> bool) -> Option<V>
    where
        V: Clone;
}

impl<K, V> DashMapExt<K, V> for DashMap<K, V>
where
    K: Eq + Hash,
{
    fn get_cloned<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get(key).map(|r| r.value().clone())
    }

    fn values_cloned(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.iter().map(|e| e.value().clone()).collect()
    }

    fn find_cloned(&self, mut pred: impl FnMut(&V) -> bool) -> Option<V>
    where
        V: Clone,
    {
        self.iter()
            .find(|e| pred(e.value()))
            .map(|e| e.value().clone())
    }
}
