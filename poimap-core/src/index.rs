//! Rule index keyed by the first tag key of each rule.
//!
//! Every rule is registered once, under the key of its first condition.
//! Buckets are ordered so that scanning a bucket front to back and stopping
//! at the first match yields the most specific applicable rule for that key:
//! descending specificity, then descending pair count, then declaration
//! order.

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use crate::rules::{MatchRule, RuleTable};

/// Errors raised while compiling a rule table into an index.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleIndexError {
    /// A rule has no conditions and cannot be keyed.
    #[error("rule {rule} of category {class:?} has no tag conditions")]
    EmptyRule {
        /// Class of the offending category.
        class: String,
        /// Zero-based position of the rule within its category.
        rule: usize,
    },
}

/// A rule registered in the index together with its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    class: String,
    rule: MatchRule,
    specificity: usize,
    pair_count: usize,
}

impl Candidate {
    /// Class name assigned when this rule matches.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// The underlying rule.
    #[must_use]
    pub const fn rule(&self) -> &MatchRule {
        &self.rule
    }

    /// Number of non-wildcard conditions.
    #[must_use]
    pub const fn specificity(&self) -> usize {
        self.specificity
    }

    /// Total number of conditions.
    #[must_use]
    pub const fn pair_count(&self) -> usize {
        self.pair_count
    }
}

/// Immutable lookup structure from tag key to ordered candidate rules.
///
/// # Examples
/// ```
/// use poimap_core::{RuleIndex, RuleTable};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let table = RuleTable::from_json_str(
///     r#"[
///         { "class": "shop", "matches": [[["shop", "*"]]] },
///         { "class": "bakery", "matches": [[["shop", "bakery"]]] }
///     ]"#,
/// )?;
/// let index = RuleIndex::build(&table)?;
/// let classes: Vec<&str> = index.candidates("shop").iter().map(|c| c.class()).collect();
/// assert_eq!(classes, ["bakery", "shop"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    buckets: HashMap<String, Vec<Candidate>>,
    rule_count: usize,
}

impl RuleIndex {
    /// Compile `table` into an index.
    ///
    /// # Errors
    /// Returns [`RuleIndexError::EmptyRule`] for a rule without conditions.
    pub fn build(table: &RuleTable) -> Result<Self, RuleIndexError> {
        let mut buckets: HashMap<String, Vec<Candidate>> = HashMap::new();
        let mut rule_count = 0;

        for category in table.categories() {
            for (position, rule) in category.rules().iter().enumerate() {
                let Some(key) = rule.first_key() else {
                    return Err(RuleIndexError::EmptyRule {
                        class: category.class().to_owned(),
                        rule: position,
                    });
                };
                buckets
                    .entry(key.to_owned())
                    .or_default()
                    .push(Candidate {
                        class: category.class().to_owned(),
                        rule: rule.clone(),
                        specificity: rule.specificity(),
                        pair_count: rule.pair_count(),
                    });
                rule_count += 1;
            }
        }

        // `sort_by` is stable, so equal candidates keep table order.
        for bucket in buckets.values_mut() {
            bucket.sort_by(|left, right| {
                right
                    .specificity
                    .cmp(&left.specificity)
                    .then_with(|| right.pair_count.cmp(&left.pair_count))
            });
        }

        debug!(
            "Built rule index with {rule_count} rules across {} keys",
            buckets.len()
        );
        Ok(Self {
            buckets,
            rule_count,
        })
    }

    /// Candidates registered under `key`, best first. Empty when the key is
    /// not indexed.
    #[must_use]
    pub fn candidates(&self, key: &str) -> &[Candidate] {
        self.buckets
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether any rule starts with `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.buckets.contains_key(key)
    }

    /// Keys that have at least one rule, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.buckets.keys().map(String::as_str)
    }

    /// Number of indexed keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of indexed rules.
    #[must_use]
    pub const fn rule_count(&self) -> usize {
        self.rule_count
    }
}
