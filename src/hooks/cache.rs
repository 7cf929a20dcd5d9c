//! Keyed cache shared by the elements under one provider.
//!
//! The store is an explicit map owned by the provider element and handed
//! down through context; there is no global cache. Insertion order is kept
//! so consumers can list previous lookups, and an optional capacity evicts
//! the oldest entry first.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::hash::Hash;
use std::rc::Rc;

use super::context::{provide_context, use_context};
use crate::element::{ElementId, ElementTree};
use crate::error::HookError;

/// Handle to a provider-owned cache.
pub type SharedCache<K, V> = Rc<RefCell<CacheStore<K, V>>>;

/// Insertion-ordered map with optional capacity.
#[derive(Debug, Clone)]
pub struct CacheStore<K, V> {
    entries: HashMap<K, V>,
    order: VecDeque<K>,
    capacity: Option<usize>,
}

impl<K: Eq + Hash + Clone, V> CacheStore<K, V> {
    /// Unbounded store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: None,
        }
    }

    /// Store holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new()
        }
    }

    /// Insert or overwrite. Overwriting keeps the key's original position.
    ///
    /// Returns the previous value for `key`, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.entries.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
        if let Some(capacity) = self.capacity {
            while self.order.len() > capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
        }
        None
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(value)
    }

    /// Keys, oldest insertion first.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl<K: Eq + Hash + Clone, V> Default for CacheStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Make element `id` the owner of a fresh cache for its subtree.
pub fn provide_cache<K, V>(
    tree: &mut ElementTree,
    id: ElementId,
    capacity: Option<usize>,
) -> Result<SharedCache<K, V>, HookError>
where
    K: Eq + Hash + Clone + 'static,
    V: 'static,
{
    let store = match capacity {
        Some(capacity) => CacheStore::with_capacity(capacity),
        None => CacheStore::new(),
    };
    provide_context(tree, id, RefCell::new(store))
}

/// The nearest cache of this key/value type at or above `id`.
pub fn use_cache<K, V>(tree: &ElementTree, id: ElementId) -> Result<SharedCache<K, V>, HookError>
where
    K: Eq + Hash + Clone + 'static,
    V: 'static,
{
    use_context::<RefCell<CacheStore<K, V>>>(tree, id)
}

/// Serve `key` from `cache`, or run `operation` and store its value.
///
/// A hit resolves without calling `operation`. Failures are not cached.
pub async fn cached<K, V, E, F, Fut>(
    cache: SharedCache<K, V>,
    key: K,
    operation: F,
) -> Result<V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
{
    let hit = cache.borrow().get(&key).cloned();
    if let Some(value) = hit {
        return Ok(value);
    }
    let value = operation().await?;
    cache.borrow_mut().insert(key, value.clone());
    Ok(value)
}
