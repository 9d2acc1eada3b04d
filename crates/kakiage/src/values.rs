/*
 * values.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The caller-supplied value map.

use std::collections::HashMap;

/// Symbol name to replacement text, read-only during expansion.
///
/// ```
/// use kakiage::Values;
///
/// let values: Values = [("name", "Taro"), ("age", "24")].into_iter().collect();
/// assert_eq!(values.get("name"), Some("Taro"));
/// assert_eq!(values.get("missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    entries: HashMap<String, String>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Values::new();
        for (name, value) in iter {
            values.insert(name, value);
        }
        values
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Values {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_replaces() {
        let mut values = Values::new();
        values.insert("x", "1");
        values.insert("x", "2");
        assert_eq!(values.get("x"), Some("2"));
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_extend_overrides() {
        let mut base: Values = [("a", "1"), ("b", "2")].into_iter().collect();
        base.extend([("b", "3")]);
        assert_eq!(base.get("a"), Some("1"));
        assert_eq!(base.get("b"), Some("3"));
    }

    #[test]
    fn test_empty() {
        let values = Values::new();
        assert!(values.is_empty());
        assert_eq!(values.get(""), None);
    }
}
