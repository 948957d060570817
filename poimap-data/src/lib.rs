//! Ingestion and persistence for the poimap engine.
//!
//! Responsibilities:
//! - Stream OSM PBF extracts and classify candidate nodes and ways.
//! - Resolve way geometry and reduce it to a representative point.
//! - Persist classified records to the SQLite artefact read by
//!   `poimap_core::SqlitePoiStore`.
//!
//! Boundaries:
//! - Do not encode classification rules (live in `poimap-core`).
//!
//! Invariants:
//! - Ingestion output is deterministic: records are sorted by identity.
//! - No global mutable state.

pub mod geometry;
mod ingest;
mod sqlite;

pub use geometry::representative_point;
pub use ingest::{
    DEFAULT_IMPORT_KEYS, ImportFilter, OsmIngestError, OsmIngestReport, OsmIngestSummary,
    ingest_osm_pbf,
};
pub use sqlite::{PersistRecordsError, persist_records_to_sqlite};
