//! String-keyed bags of arbitrary typed values

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

type Value = Arc<dyn Any + Send + Sync>;

/// Thread-safe map from string keys to values of any `Send + Sync` type.
///
/// Backs both the host [`Environment`](crate::Environment) and the
/// request-scoped [`Items`] bag. Reads hand out `Arc` clones, so a value can
/// be replaced while an older reader still holds the previous one.
#[derive(Default)]
pub(crate) struct AnyMap {
    values: RwLock<HashMap<String, Value>>,
}

impl AnyMap {
    pub(crate) fn insert<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) -> bool {
        self.write().insert(key.into(), Arc::new(value)).is_some()
    }

    pub(crate) fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let value = self.read().get(key).cloned()?;
        value.downcast::<T>().ok()
    }

    pub(crate) fn remove(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub(crate) fn len(&self) -> usize {
        self.read().len()
    }

    pub(crate) fn clear(&self) {
        self.write().clear();
    }

    // A panicking writer cannot leave a HashMap half-updated in a way that
    // matters here, so poisoning is ignored.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Value>> {
        self.values.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.values.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for AnyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

/// Request-scoped bag for passing data between components.
///
/// Always present and empty when the view is created. Nothing in the view
/// reads from it, so inserting or removing items never changes a derived
/// value.
///
/// ```rust
/// use hostview_core::Items;
///
/// let items = Items::new();
/// items.insert("tenant", String::from("acme"));
/// items.insert("attempt", 3u32);
///
/// assert_eq!(items.get::<String>("tenant").as_deref().map(String::as_str), Some("acme"));
/// assert_eq!(items.get::<u32>("attempt").as_deref(), Some(&3));
/// assert!(items.get::<u64>("attempt").is_none()); // wrong type
/// ```
#[derive(Debug, Default)]
pub struct Items {
    map: AnyMap,
}

impl Items {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`. Returns true if a previous value was replaced.
    pub fn insert<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) -> bool {
        self.map.insert(key, value)
    }

    /// Fetch the value under `key` if it has type `T`
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.map.get(key)
    }

    /// Remove `key`. Returns true if it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.map.remove(key)
    }

    /// Whether `key` is present, whatever its type
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Keys currently stored, sorted
    pub fn keys(&self) -> Vec<String> {
        self.map.keys()
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when the bag is empty
    pub fn is_empty(&self) -> bool {
        self.map.len() == 0
    }

    /// Remove every item
    pub fn clear(&self) {
        self.map.clear();
    }
}
