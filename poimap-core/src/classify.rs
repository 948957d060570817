//! Tag-to-category classification.
//!
//! Classification is a pure function of an element's tags and an immutable
//! [`RuleIndex`], so a single [`Classifier`] can be shared by reference
//! across worker threads.

use std::collections::BTreeSet;

use crate::index::RuleIndex;
use crate::rules::MISC_CLASS;
use crate::{ClassifiedRecord, RawElement, Tags};

/// Keys that mark an element as a POI when no rule matched.
pub const DEFAULT_FALLBACK_KEYS: [&str; 4] = ["amenity", "shop", "leisure", "tourism"];

/// Outcome of a successful classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    /// A rule of this category matched.
    Category(&'a str),
    /// No rule matched but a fallback key was present.
    Misc,
}

impl<'a> Classification<'a> {
    /// Class name to persist.
    #[must_use]
    pub const fn class(&self) -> &'a str {
        match self {
            Self::Category(class) => class,
            Self::Misc => MISC_CLASS,
        }
    }
}

/// Classifier tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Keys whose presence, with any value, yields the `misc` class.
    pub fallback_keys: BTreeSet<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            fallback_keys: DEFAULT_FALLBACK_KEYS.iter().map(|&key| key.to_owned()).collect(),
        }
    }
}

/// First-match-wins classifier over a [`RuleIndex`].
///
/// # Examples
/// ```
/// use poimap_core::{Classification, Classifier, ClassifierConfig, RuleIndex, RuleTable, Tags};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let table = RuleTable::from_json_str(
///     r#"[{ "class": "pharmacy", "matches": [[["amenity", "pharmacy"]]] }]"#,
/// )?;
/// let classifier = Classifier::new(RuleIndex::build(&table)?, ClassifierConfig::default());
///
/// let tags = Tags::from([("name", "ACME"), ("amenity", "pharmacy"), ("shop", "chemist")]);
/// assert_eq!(classifier.classify(&tags), Some(Classification::Category("pharmacy")));
///
/// let unnamed = Tags::from([("amenity", "pharmacy")]);
/// assert_eq!(classifier.classify(&unnamed), None);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    index: RuleIndex,
    config: ClassifierConfig,
}

impl Classifier {
    /// Combine an index with its configuration.
    #[must_use]
    pub const fn new(index: RuleIndex, config: ClassifierConfig) -> Self {
        Self { index, config }
    }

    /// The underlying rule index.
    #[must_use]
    pub const fn index(&self) -> &RuleIndex {
        &self.index
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Decide whether `tags` describe a POI and which category it belongs to.
    ///
    /// Elements without a `name` tag are never POIs. Otherwise tags are
    /// walked in key order; the first key whose bucket holds a matching rule
    /// decides, and within the bucket the first (most specific) matching rule
    /// wins. When nothing matches, any fallback key yields
    /// [`Classification::Misc`].
    #[must_use]
    pub fn classify<'a>(&'a self, tags: &Tags) -> Option<Classification<'a>> {
        tags.name()?;

        let matched = tags.keys().find_map(|key| {
            self.index
                .candidates(key)
                .iter()
                .find(|candidate| candidate.rule().matches(tags))
        });
        if let Some(candidate) = matched {
            return Some(Classification::Category(candidate.class()));
        }

        self.config
            .fallback_keys
            .iter()
            .any(|key| tags.contains_key(key))
            .then_some(Classification::Misc)
    }

    /// Classify `element` and build its record, or return `None` when the
    /// element is not a POI.
    ///
    /// A name stripped from the tags upstream counts as the `name` tag.
    #[must_use]
    pub fn classify_element(&self, element: &RawElement) -> Option<ClassifiedRecord> {
        let tags = element.full_tags();
        let classification = self.classify(&tags);
        ClassifiedRecord::build(element, classification)
    }
}
