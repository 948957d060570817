//! Facade crate for the poimap POI classification pipeline.
//!
//! This crate re-exports the classification engine and, behind the
//! `store-sqlite` feature, the SQLite-backed POI store.

#![forbid(unsafe_code)]

pub use poimap_core::{
    Classification, ClassifiedRecord, Classifier, ClassifierConfig, ElementId, ElementKind,
    Geometry, PoiStore, RawElement, RuleIndex, RuleIndexError, RuleTable, RuleTableError,
    StoredPoi, Tags,
};

#[cfg(feature = "store-sqlite")]
pub use poimap_core::{SqlitePoiStore, SqlitePoiStoreError};
