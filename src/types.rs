//! KEEPSAKE - Core Type Definitions
//! Defines the value types shared by regions and the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Immutable identifier of a record inside a region.
/// Equality, ordering and hashing all follow the wrapped string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key(String);

impl Key {
    /// Create a key from any string-like value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the wrapped string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A key together with its ordered values. Values may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: Key,
    pub values: Vec<String>,
}

impl Record {
    pub fn new(key: Key, values: Vec<String>) -> Self {
        Self { key, values }
    }
}

/// Normalize a region name for storage, lookup and uniqueness checks.
pub fn canonical_name(name: &str) -> String {
    name.to_uppercase()
}

/// Returns true if `name` is non-empty and uses only ASCII letters, digits
/// and the characters `-`, `_`, `?`, `!`.
pub fn is_valid_region_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '?' | '!'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_equality_and_hash() {
        let mut set = HashSet::new();
        set.insert(Key::from("alpha"));
        assert!(set.contains(&Key::new(String::from("alpha"))));
        assert!(!set.contains(&Key::from("Alpha")));
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("foo-Bar_1?"), "FOO-BAR_1?");
    }

    #[test]
    fn test_region_name_rules() {
        assert!(is_valid_region_name("valid-Name_1?"));
        assert!(is_valid_region_name("WOW!"));
        assert!(!is_valid_region_name("bad name!!ok"));
        assert!(!is_valid_region_name("dot.name"));
        assert!(!is_valid_region_name("brace{"));
        assert!(!is_valid_region_name("café"));
        assert!(!is_valid_region_name(""));
    }
}
