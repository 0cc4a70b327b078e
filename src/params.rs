//! Parameter identifiers and per-dispatch bindings.
//!
//! A binding maps a [`ParamName`] to the captured segment, or to `None` when
//! the name was declared but nothing was captured for it.

use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Maximum number of bindings kept inline before spilling to the heap.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Identifier of a bound parameter.
///
/// `:name` segments produce [`ParamName::Named`]; wildcards and surplus
/// capture groups produce [`ParamName::Positional`] indexes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamName {
    Named(Arc<str>),
    Positional(usize),
}

impl ParamName {
    /// The name as it appears in diagnostics and templates.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }

    #[must_use]
    pub fn is_positional(&self) -> bool {
        matches!(self, ParamName::Positional(_))
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamName::Named(name) => f.write_str(name),
            ParamName::Positional(idx) => write!(f, "{idx}"),
        }
    }
}

/// A name made only of ASCII digits is a positional index, so `"0"` in a
/// config file addresses the first wildcard.
impl From<&str> for ParamName {
    fn from(name: &str) -> Self {
        match name.parse::<usize>() {
            Ok(idx) if name.bytes().all(|b| b.is_ascii_digit()) => ParamName::Positional(idx),
            _ => ParamName::Named(Arc::from(name)),
        }
    }
}

impl From<String> for ParamName {
    fn from(name: String) -> Self {
        ParamName::from(name.as_str())
    }
}

impl From<usize> for ParamName {
    fn from(idx: usize) -> Self {
        ParamName::Positional(idx)
    }
}

/// Inline storage for bindings, in insertion order.
pub type BindingVec = SmallVec<[(ParamName, Option<String>); MAX_INLINE_PARAMS]>;

/// Ordered parameter bindings for one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamBindings {
    entries: BindingVec,
}

impl ParamBindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing an existing binding in place or
    /// appending a new one.
    pub fn insert(&mut self, name: impl Into<ParamName>, value: Option<String>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Overlay a captured value. A `None` never clobbers an existing binding.
    pub fn overlay(&mut self, name: ParamName, value: Option<String>) {
        if value.is_none() && self.contains(&name) {
            return;
        }
        self.insert(name, value);
    }

    /// Merge every binding of `other` over this one.
    pub fn extend_from(&mut self, other: &ParamBindings) {
        for (name, value) in &other.entries {
            self.insert(name.clone(), value.clone());
        }
    }

    #[must_use]
    pub fn contains(&self, name: &ParamName) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    /// Value bound to `name`. Outer `None` means "not bound at all".
    #[must_use]
    pub fn lookup(&self, name: &ParamName) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_deref())
    }

    /// Value of a parameter by name, flattening "unbound" and "bound to
    /// null". Digit-only names address positional parameters.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.lookup(&ParamName::from(name)).flatten()
    }

    /// Value of a positional parameter.
    #[inline]
    #[must_use]
    pub fn positional(&self, idx: usize) -> Option<&str> {
        self.lookup(&ParamName::Positional(idx)).flatten()
    }

    /// Values for `names`, in that order. Unbound names yield `None`.
    #[must_use]
    pub fn values_for(&self, names: &[ParamName]) -> Vec<Option<String>> {
        names
            .iter()
            .map(|name| self.lookup(name).flatten().map(str::to_owned))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamName, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k, v.as_deref()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K, V> FromIterator<(K, V)> for ParamBindings
where
    K: Into<ParamName>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bindings = ParamBindings::new();
        for (k, v) in iter {
            bindings.insert(k, Some(v.into()));
        }
        bindings
    }
}

impl Serialize for ParamBindings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(&k.to_string(), v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut b: ParamBindings = [("a", "1"), ("b", "2")].into_iter().collect();
        b.insert("a", Some("3".into()));
        let keys: Vec<String> = b.iter().map(|(k, _)| k.key()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(b.get("a"), Some("3"));
    }

    #[test]
    fn test_overlay_none_keeps_default() {
        let mut b: ParamBindings = [("page", "1")].into_iter().collect();
        b.overlay(ParamName::from("page"), None);
        assert_eq!(b.get("page"), Some("1"));
        b.overlay(ParamName::from("page"), Some(String::new()));
        assert_eq!(b.get("page"), Some(""));
    }

    #[test]
    fn test_digit_names_are_positional() {
        assert_eq!(ParamName::from("0"), ParamName::Positional(0));
        assert_eq!(ParamName::from("12"), ParamName::Positional(12));
        assert!(!ParamName::from("+1").is_positional());
        assert!(!ParamName::from("id").is_positional());
    }

    #[test]
    fn test_serialize_as_map() {
        let mut b = ParamBindings::new();
        b.insert(0usize, Some("x".into()));
        b.insert("id", None);
        let v = serde_json::to_value(&b).unwrap();
        assert_eq!(v, serde_json::json!({ "0": "x", "id": null }));
    }
}
