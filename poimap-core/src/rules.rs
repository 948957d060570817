//! The category rule table.
//!
//! A table is an ordered list of categories. Each category owns one or more
//! alternative [`MatchRule`]s, and each rule is an ordered list of tag
//! conditions that must all hold. Tables are usually loaded from JSON:
//!
//! ```json
//! [
//!   { "class": "pharmacy", "matches": [ [["amenity", "pharmacy"]] ] },
//!   { "class": "bakery", "matches": [ [["shop", "bakery"]], [["craft", "baker"], ["name", "*"]] ] }
//! ]
//! ```

use std::collections::HashSet;
use std::io::Read;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Tags;

/// Expected value meaning "the key must be present, any value".
pub const WILDCARD: &str = "*";

/// Class assigned when no rule matches but a fallback key is present.
pub const MISC_CLASS: &str = "misc";

const BUILTIN_RULES: &str = include_str!("../rules/categories.json");

/// The value a [`TagCondition`] expects for its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedValue {
    /// Any value is accepted as long as the key is present.
    Any,
    /// The value must equal this string exactly.
    Exact(String),
}

impl ExpectedValue {
    fn from_raw(value: String) -> Self {
        if value == WILDCARD {
            Self::Any
        } else {
            Self::Exact(value)
        }
    }

    fn as_raw(&self) -> &str {
        match self {
            Self::Any => WILDCARD,
            Self::Exact(value) => value,
        }
    }
}

/// A single `(key, expected value)` pair within a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCondition {
    /// Tag key that must be present.
    pub key: String,
    /// Value the tag must carry.
    pub expected: ExpectedValue,
}

impl TagCondition {
    /// Build a condition from the raw table form, where `*` is the wildcard.
    pub fn new(key: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expected: ExpectedValue::from_raw(expected.into()),
        }
    }

    /// Whether `tags` satisfies this condition.
    #[must_use]
    pub fn holds(&self, tags: &Tags) -> bool {
        match (&self.expected, tags.get(&self.key)) {
            (_, None) => false,
            (ExpectedValue::Any, Some(_)) => true,
            (ExpectedValue::Exact(expected), Some(actual)) => expected == actual,
        }
    }

    const fn is_constrained(&self) -> bool {
        matches!(self.expected, ExpectedValue::Exact(_))
    }
}

/// An ordered conjunction of tag conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRule {
    conditions: Vec<TagCondition>,
}

impl MatchRule {
    /// Build a rule from its conditions.
    ///
    /// An empty rule is accepted here and rejected when the rule index is
    /// built.
    #[must_use]
    pub const fn new(conditions: Vec<TagCondition>) -> Self {
        Self { conditions }
    }

    /// The rule's conditions in declaration order.
    #[must_use]
    pub fn conditions(&self) -> &[TagCondition] {
        &self.conditions
    }

    /// Key of the first condition; the rule is indexed under it.
    #[must_use]
    pub fn first_key(&self) -> Option<&str> {
        self.conditions.first().map(|condition| condition.key.as_str())
    }

    /// Number of conditions with a non-wildcard expected value.
    #[must_use]
    pub fn specificity(&self) -> usize {
        self.conditions
            .iter()
            .filter(|condition| condition.is_constrained())
            .count()
    }

    /// Total number of conditions.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.conditions.len()
    }

    /// Whether every condition holds against `tags`.
    #[must_use]
    pub fn matches(&self, tags: &Tags) -> bool {
        self.conditions.iter().all(|condition| condition.holds(tags))
    }
}

impl<K, V> FromIterator<(K, V)> for MatchRule
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(key, value)| TagCondition::new(key, value))
                .collect(),
        )
    }
}

/// A named category and the alternative rules that select it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    class: String,
    rules: Vec<MatchRule>,
}

impl Category {
    /// Build a category from its class name and rule variants.
    pub fn new(class: impl Into<String>, rules: Vec<MatchRule>) -> Self {
        Self {
            class: class.into(),
            rules,
        }
    }

    /// The category's class name.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Alternative rules, in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }
}

/// Errors raised when a rule table is malformed.
#[derive(Debug, Error)]
pub enum RuleTableError {
    /// The JSON source could not be decoded.
    #[error("failed to parse rule table JSON")]
    Parse {
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// A category at `position` has an empty class name.
    #[error("category at position {position} has an empty class name")]
    EmptyClass {
        /// Zero-based position in the table.
        position: usize,
    },
    /// A category declares no rules.
    #[error("category {class:?} declares no match rules")]
    NoRules {
        /// Offending class name.
        class: String,
    },
    /// A class name appears more than once.
    #[error("category {class:?} is declared more than once")]
    DuplicateClass {
        /// Duplicated class name.
        class: String,
    },
    /// A category reuses the fallback class name.
    #[error("category {class:?} collides with the reserved fallback class")]
    ReservedClass {
        /// Offending class name.
        class: String,
    },
}

/// An ordered, validated list of categories.
///
/// # Examples
/// ```
/// use poimap_core::RuleTable;
///
/// # fn main() -> Result<(), poimap_core::RuleTableError> {
/// let table = RuleTable::from_json_str(
///     r#"[{ "class": "pharmacy", "matches": [[["amenity", "pharmacy"]]] }]"#,
/// )?;
/// assert_eq!(table.categories().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    categories: Vec<Category>,
}

impl RuleTable {
    /// Validate and construct a table.
    ///
    /// # Errors
    /// Returns [`RuleTableError`] when a class name is empty, duplicated or
    /// reserved, or when a category has no rules.
    pub fn new(categories: Vec<Category>) -> Result<Self, RuleTableError> {
        let mut seen = HashSet::with_capacity(categories.len());
        for (position, category) in categories.iter().enumerate() {
            let class = category.class();
            if class.is_empty() {
                return Err(RuleTableError::EmptyClass { position });
            }
            if class == MISC_CLASS {
                return Err(RuleTableError::ReservedClass {
                    class: class.to_owned(),
                });
            }
            if category.rules().is_empty() {
                return Err(RuleTableError::NoRules {
                    class: class.to_owned(),
                });
            }
            if !seen.insert(class) {
                return Err(RuleTableError::DuplicateClass {
                    class: class.to_owned(),
                });
            }
        }
        Ok(Self { categories })
    }

    /// Parse and validate a table from its JSON form.
    ///
    /// # Errors
    /// Returns [`RuleTableError::Parse`] for invalid JSON and the validation
    /// errors of [`RuleTable::new`] otherwise.
    pub fn from_json_str(json: &str) -> Result<Self, RuleTableError> {
        let raw: Vec<RawCategory> =
            serde_json::from_str(json).map_err(|source| RuleTableError::Parse { source })?;
        Self::from_raw(raw)
    }

    /// Parse and validate a table from a JSON reader.
    ///
    /// # Errors
    /// See [`RuleTable::from_json_str`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RuleTableError> {
        let raw: Vec<RawCategory> =
            serde_json::from_reader(reader).map_err(|source| RuleTableError::Parse { source })?;
        Self::from_raw(raw)
    }

    /// The table shipped with the crate.
    ///
    /// # Errors
    /// Only fails if the embedded table itself is malformed.
    pub fn builtin() -> Result<Self, RuleTableError> {
        Self::from_json_str(BUILTIN_RULES)
    }

    /// Categories in declaration order.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Render the table back into its JSON form.
    ///
    /// # Errors
    /// Propagates `serde_json` serialisation failures.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        let raw: Vec<RawCategory> = self.categories.iter().map(RawCategory::from).collect();
        serde_json::to_string_pretty(&raw)
    }

    fn from_raw(raw: Vec<RawCategory>) -> Result<Self, RuleTableError> {
        Self::new(raw.into_iter().map(Category::from).collect())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RawCategory {
    class: String,
    matches: Vec<Vec<(String, String)>>,
}

impl From<RawCategory> for Category {
    fn from(raw: RawCategory) -> Self {
        let rules = raw
            .matches
            .into_iter()
            .map(|pairs| pairs.into_iter().collect())
            .collect();
        Self::new(raw.class, rules)
    }
}

impl From<&Category> for RawCategory {
    fn from(category: &Category) -> Self {
        Self {
            class: category.class.clone(),
            matches: category
                .rules
                .iter()
                .map(|rule| {
                    rule.conditions
                        .iter()
                        .map(|condition| {
                            (condition.key.clone(), condition.expected.as_raw().to_owned())
                        })
                        .collect()
                })
                .collect(),
        }
    }
}
