//! OpenStreetMap tag maps.
//!
//! [`Tags`] wraps an ordered map so that iteration is always lexicographic by
//! key. Classification walks tags in this order, which keeps results
//! reproducible no matter how the producer enumerated the element's tags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key carrying the human-readable name of an element.
pub const NAME_KEY: &str = "name";

/// An element's key/value tags, iterated in lexicographic key order.
///
/// Lookups distinguish absence from empty values: a tag with an empty value
/// is still present.
///
/// # Examples
/// ```
/// use poimap_core::Tags;
///
/// let tags = Tags::from([("shop", "bakery"), ("name", "Crumbs")]);
/// assert_eq!(tags.get("shop"), Some("bakery"));
/// assert_eq!(tags.get("amenity"), None);
/// let keys: Vec<&str> = tags.keys().collect();
/// assert_eq!(keys, ["name", "shop"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    /// Create an empty tag map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Return the value stored under `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Return whether `key` is present, whatever its value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert a tag, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Iterate over keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map holds no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `name` tag, if present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get(NAME_KEY)
    }
}

impl<K, V> FromIterator<(K, V)> for Tags
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Tags
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<BTreeMap<String, String>> for Tags {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl From<Tags> for BTreeMap<String, String> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn empty_value_is_present() {
        let tags = Tags::from([("name", "")]);
        assert!(tags.contains_key("name"));
        assert_eq!(tags.name(), Some(""));
    }

    #[rstest]
    fn iteration_is_lexicographic_regardless_of_insertion() {
        let mut tags = Tags::new();
        tags.insert("tourism", "museum");
        tags.insert("amenity", "cafe");
        tags.insert("name", "Hall");
        let keys: Vec<&str> = tags.keys().collect();
        assert_eq!(keys, ["amenity", "name", "tourism"]);
    }

    #[rstest]
    fn serialises_as_plain_object() {
        let tags = Tags::from([("shop", "bakery")]);
        let json = serde_json::to_string(&tags).expect("serialise tags");
        assert_eq!(json, r#"{"shop":"bakery"}"#);
    }
}
