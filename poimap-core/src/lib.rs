//! Tag-to-category classification for OpenStreetMap points of interest.
//!
//! The pipeline is a pure function per element:
//!
//! 1. a [`RuleTable`] lists categories and their tag rules;
//! 2. [`RuleIndex::build`] compiles the table once into per-key buckets ordered
//!    by specificity;
//! 3. [`Classifier::classify`] decides whether an element's [`Tags`] describe
//!    a POI and which category wins;
//! 4. [`ClassifiedRecord::build`] assembles the record handed to storage.
//!
//! Persisted records are served back through the [`PoiStore`] trait.
//!
//! Invariants:
//! - No global mutable state: the index is an immutable value passed
//!   explicitly and safe to share across threads.
//! - Classification never fails; unexpected input degrades to "not a POI".

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod classify;
pub mod element;
pub mod index;
pub mod record;
pub mod rules;
pub mod store;
pub mod tags;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use classify::{Classification, Classifier, ClassifierConfig, DEFAULT_FALLBACK_KEYS};
pub use element::{ElementId, ElementIdParseError, ElementKind, Geometry, RawElement};
pub use index::{Candidate, RuleIndex, RuleIndexError};
pub use record::{ClassifiedRecord, TIMESTAMP_FORMAT, format_timestamp};
pub use rules::{
    Category, ExpectedValue, MISC_CLASS, MatchRule, RuleTable, RuleTableError, TagCondition,
    WILDCARD,
};
pub use store::{PoiStore, StoredPoi};
#[cfg(feature = "store-sqlite")]
pub use store::{SqlitePoiStore, SqlitePoiStoreError};
pub use tags::{NAME_KEY, Tags};
