//! Case-insensitive HTTP header storage.
//!
//! This module provides the low-level header abstraction used on both sides of
//! a probe exchange: headers attached to an outgoing request and headers
//! parsed out of a response head.
//!
//! Headers are stored in an ordered map to preserve insertion order. Lookup
//! and overwrite ignore ASCII case, but the casing of the *first* write for a
//! given name is kept and used for iteration and serialization. That lets a
//! test send deliberately odd casing (`content-LENGTH`) and still find the
//! header under any spelling afterwards.
//!
//! No HTTP semantics are enforced here: names and values are raw strings, and
//! nothing restricts which headers may appear. Protocol-edge-case tests rely
//! on being able to store whatever they want.

use indexmap::IndexMap;
use indexmap::map::Entry;

pub struct HeaderMap {
    // lowercased name -> (first-seen casing, value)
    entries: IndexMap<String, (String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = Self::new();
        for (name, value) in pairs {
            map.set(name, value);
        }
        map
    }

    /// Stores `value` under the case-insensitive identity of `name`.
    ///
    /// If a name differing only in case is already present, its value is
    /// overwritten but the original casing is kept for display.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.entries.entry(name.to_ascii_lowercase()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().1 = value.to_string();
            }
            Entry::Vacant(entry) => {
                entry.insert((name.to_string(), value.to_string()));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Iterates `(original-casing name, value)` pairs in first-insertion order
    /// of distinct case-insensitive names.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stringify(&self) -> String {
        let mut result = String::new();
        for (name, value) in self.iter() {
            result.push_str(&format!("{}: {}\r\n", name, value));
        }
        result
    }
}

impl Default for HeaderMap {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HeaderMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let mut headers = HeaderMap::new();
        headers.set("Content-Type", "text/plain");

        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert!(headers.contains("cOnTeNt-TyPe"));
        assert_eq!(headers.get("Content-Length"), None);
    }

    #[test]
    fn first_casing_wins_on_overwrite() {
        let mut headers = HeaderMap::new();
        headers.set("Foo", "1");
        headers.set("FOO", "2");

        assert_eq!(headers.len(), 1);
        let pairs: Vec<_> = headers.iter().collect();
        assert_eq!(pairs, vec![("Foo", "2")]);
    }

    #[test]
    fn iteration_keeps_insertion_order_and_is_restartable() {
        let mut headers = HeaderMap::new();
        headers.set("B", "2");
        headers.set("A", "1");
        headers.set("C", "3");
        headers.set("a", "updated");

        let first: Vec<_> = headers.iter().collect();
        let second: Vec<_> = headers.iter().collect();
        assert_eq!(first, vec![("B", "2"), ("A", "updated"), ("C", "3")]);
        assert_eq!(first, second);
    }

    #[test]
    fn stringify_uses_crlf_and_original_casing() {
        let mut headers = HeaderMap::new();
        headers.set("X-Test", "1");
        headers.set("x-test", "2");
        headers.set("Host", "localhost");

        assert_eq!(headers.stringify(), "X-Test: 2\r\nHost: localhost\r\n");
    }

    #[test]
    fn from_pairs_preserves_order() {
        let headers = HeaderMap::from_pairs([("One", "1"), ("Two", "2")]);
        let pairs: Vec<_> = headers.iter().collect();
        assert_eq!(pairs, vec![("One", "1"), ("Two", "2")]);
    }
}
