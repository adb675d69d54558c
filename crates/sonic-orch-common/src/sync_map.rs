//! Ordered map wrapper that never creates entries implicitly.
//!
//! Lookups return `Option`, mutation of an existing entry goes through
//! [`SyncMap::update`] which reports a missing key as an error, and the
//! only creating accessor is the explicitly named
//! [`SyncMap::get_or_insert_with`]. Iteration is in key order, so sweeps
//! over the map are deterministic.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use thiserror::Error;

/// Error type for SyncMap operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncMapError {
    #[error("Key not found: {0}")]
    KeyNotFound(String),
}

/// # Example
///
/// ```
/// use sonic_orch_common::SyncMap;
///
/// let mut map: SyncMap<String, u64> = SyncMap::new();
/// assert!(map.get("Ethernet0").is_none());
/// assert!(map.update("Ethernet0", |v| *v += 1).is_err());
/// assert!(map.is_empty());
///
/// *map.get_or_insert_with("Ethernet0".to_string(), || 0) += 1;
/// assert_eq!(map.get("Ethernet0"), Some(&1));
/// ```
#[derive(Debug, Clone)]
pub struct SyncMap<K, V> {
    inner: BTreeMap<K, V>,
}

impl<K: Ord, V> Default for SyncMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> SyncMap<K, V> {
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.contains_key(key)
    }

    /// **This never creates entries.**
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.get(key)
    }

    /// **This never creates entries.**
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.get_mut(key)
    }

    /// Applies `f` to an existing entry.
    pub fn update<Q, F, R>(&mut self, key: &Q, f: F) -> Result<R, SyncMapError>
    where
        K: Borrow<Q>,
        Q: Ord + ToString + ?Sized,
        F: FnOnce(&mut V) -> R,
    {
        match self.inner.get_mut(key) {
            Some(value) => Ok(f(value)),
            None => Err(SyncMapError::KeyNotFound(key.to_string())),
        }
    }

    /// Returns the old value if the key was already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.inner.insert(key, value)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.remove(key)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.inner.values_mut()
    }

    /// Gets the value for a key, inserting `f()` if not present.
    ///
    /// Unlike `get()`, this method **will** create an entry.
    pub fn get_or_insert_with<F>(&mut self, key: K, f: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        self.inner.entry(key).or_insert_with(f)
    }
}
