//! Loosely-typed parameter bags.
//!
//! A [`ParamBag`] carries named values whose types are only known at the
//! point of use: request body fields, explicit constructor parameters
//! handed to the container, and middleware configuration. Values are
//! [`serde_json::Value`] so strings, numbers, and booleans all travel
//! through the same bag.

use std::collections::HashMap;

use serde_json::Value;

/// A named bag of loosely-typed values.
#[derive(Debug, Clone, Default)]
pub struct ParamBag {
    inner: HashMap<String, Value>,
}

impl ParamBag {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner.insert(key.into(), value.into());
        self
    }

    /// Insert a value, replacing any previous one under the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.insert(key.into(), value.into());
    }

    /// Get the raw value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    /// Get a value or fall back to a default.
    #[must_use]
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.inner.get(key).cloned().unwrap_or_else(|| default.into())
    }

    /// Get a string value; `None` if absent or not a string.
    #[must_use]
    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.inner.get(key).and_then(Value::as_str)
    }

    /// Get an integer value; `None` if absent or not an integer.
    #[must_use]
    pub fn i64_value(&self, key: &str) -> Option<i64> {
        self.inner.get(key).and_then(Value::as_i64)
    }

    /// True if the bag holds a value for `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Remove a value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.inner.remove(key)
    }

    /// A copy of the bag without the given keys.
    #[must_use]
    pub fn except(&self, keys: &[&str]) -> Self {
        let inner = self
            .inner
            .iter()
            .filter(|(k, _)| !keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { inner }
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParamBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let inner = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors() {
        let bag = ParamBag::new().with("name", "ada").with("age", 36);
        assert_eq!(bag.str_value("name"), Some("ada"));
        assert_eq!(bag.i64_value("age"), Some(36));
        assert_eq!(bag.str_value("age"), None);
        assert_eq!(bag.i64_value("missing"), None);
    }

    #[test]
    fn get_or_falls_back() {
        let bag = ParamBag::new().with("locale", "en");
        assert_eq!(bag.get_or("locale", "de"), Value::from("en"));
        assert_eq!(bag.get_or("theme", "light"), Value::from("light"));
    }

    #[test]
    fn except_filters_keys() {
        let bag = ParamBag::new()
            .with("a", 1)
            .with("b", 2)
            .with("_csrf_token", "tok");
        let filtered = bag.except(&["_csrf_token"]);
        assert_eq!(filtered.len(), 2);
        assert!(!filtered.contains("_csrf_token"));
        assert!(bag.contains("_csrf_token"));
    }
}
