//! Candidate selection for OSM elements.
//!
//! An element is worth classifying only when it is named and carries at
//! least one of the configured import keys. The check runs directly on the
//! reader's tag iterator so rejected elements never allocate.

use std::collections::BTreeSet;

use poimap_core::{NAME_KEY, RuleIndex, Tags};

/// Keys that make a named element an ingestion candidate by default.
pub const DEFAULT_IMPORT_KEYS: [&str; 6] =
    ["amenity", "shop", "leisure", "tourism", "craft", "office"];

/// Selects which OSM elements reach the classifier.
///
/// This key set is independent from the classifier's fallback keys: with the
/// defaults a named `craft` or `office` element is imported but classifies to
/// nothing unless a rule matches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFilter {
    keys: BTreeSet<String>,
}

impl Default for ImportFilter {
    fn default() -> Self {
        Self::new(DEFAULT_IMPORT_KEYS)
    }
}

impl ImportFilter {
    /// Build a filter accepting named elements carrying any of `keys`.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Extend the filter with every key that starts a rule in `index`.
    ///
    /// Elements whose only classifiable key is a rule's first key would
    /// otherwise be dropped before classification.
    ///
    /// # Examples
    /// ```
    /// use poimap_core::{RuleIndex, RuleTable};
    /// use poimap_data::ImportFilter;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let index = RuleIndex::build(&RuleTable::builtin()?)?;
    /// let filter = ImportFilter::default().with_rule_keys(&index);
    /// assert!(filter.accepts([("name", "Burg"), ("historic", "castle")]));
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_rule_keys(mut self, index: &RuleIndex) -> Self {
        self.keys.extend(index.keys().map(str::to_owned));
        self
    }

    /// Configured import keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.keys.iter().map(String::as_str)
    }

    /// Whether an element with `tags` should be classified.
    ///
    /// # Examples
    /// ```
    /// use poimap_data::ImportFilter;
    ///
    /// let filter = ImportFilter::default();
    /// assert!(filter.accepts([("name", "Woodworks"), ("craft", "carpenter")]));
    /// assert!(!filter.accepts([("craft", "carpenter")]));
    /// ```
    pub fn accepts<'a, T>(&self, tags: T) -> bool
    where
        T: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut named = false;
        let mut keyed = false;
        for (key, _) in tags {
            if key == NAME_KEY {
                named = true;
            } else if self.keys.contains(key) {
                keyed = true;
            }
            if named && keyed {
                return true;
            }
        }
        false
    }

    /// Convenience wrapper over [`ImportFilter::accepts`] for owned tags.
    #[must_use]
    pub fn accepts_tags(&self, tags: &Tags) -> bool {
        self.accepts(tags.iter())
    }
}

pub(super) fn collect_tags<'a, T>(tags: T) -> Tags
where
    T: IntoIterator<Item = (&'a str, &'a str)>,
{
    tags.into_iter().collect()
}
