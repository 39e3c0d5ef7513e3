//! Ordered multi-value collections

use std::collections::HashMap;

/// How a [`ParamMap`] compares keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCase {
    /// `Page` and `page` are different keys
    Sensitive,
    /// ASCII case is ignored; the first spelling seen is kept
    Insensitive,
}

/// Ordered multimap of string keys to string values.
///
/// Keys keep the order in which they were first added; values keep the order
/// in which they were appended. Used for query parameters, form fields,
/// headers and server variables.
///
/// ```rust
/// use hostview_core::{KeyCase, ParamMap};
///
/// let mut headers = ParamMap::new(KeyCase::Insensitive);
/// headers.append("Accept", "text/html");
/// headers.append("accept", "application/json");
///
/// assert_eq!(headers.get("ACCEPT"), Some("text/html"));
/// assert_eq!(headers.get_all("Accept"), ["text/html", "application/json"]);
/// assert_eq!(headers.keys().collect::<Vec<_>>(), ["Accept"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamMap {
    case: KeyCase,
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl ParamMap {
    /// Create an empty map with the given key comparison
    pub fn new(case: KeyCase) -> Self {
        Self {
            case,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a map by appending every pair in order
    pub fn from_pairs<K, V>(case: KeyCase, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::new(case);
        for (key, value) in pairs {
            map.append(key, value);
        }
        map
    }

    /// Key comparison used by this map
    pub fn key_case(&self) -> KeyCase {
        self.case
    }

    /// Add a value under `key`, after any existing values
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&self.fold(&key)) {
            Some(&slot) => self.entries[slot].1.push(value),
            None => {
                self.index.insert(self.fold(&key), self.entries.len());
                self.entries.push((key, vec![value]));
            }
        }
    }

    /// Replace every value under `key` with `value`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.index.get(&self.fold(&key)) {
            Some(&slot) => self.entries[slot].1 = vec![value.into()],
            None => self.append(key, value),
        }
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    /// Every value for `key`, in insertion order
    pub fn get_all(&self, key: &str) -> &[String] {
        self.index
            .get(&self.fold(key))
            .map_or(&[], |&slot| self.entries[slot].1.as_slice())
    }

    /// Values for `key` joined with `,`, the way HTTP folds repeated headers
    pub fn joined(&self, key: &str) -> Option<String> {
        let values = self.get_all(key);
        (!values.is_empty()).then(|| values.join(","))
    }

    /// Whether `key` has at least one value
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(&self.fold(key))
    }

    /// Distinct keys, in first-seen order and spelling
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Keys with their values
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Flattened `(key, value)` pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no key is present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fold(&self, key: &str) -> String {
        match self.case {
            KeyCase::Sensitive => key.to_owned(),
            KeyCase::Insensitive => key.to_ascii_lowercase(),
        }
    }
}

impl Default for ParamMap {
    fn default() -> Self {
        Self::new(KeyCase::Sensitive)
    }
}
