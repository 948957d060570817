//! Error types emitted by the poimap CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use poimap_core::{ElementIdParseError, RuleIndexError, RuleTableError, SqlitePoiStoreError};
use poimap_data::{OsmIngestError, PersistRecordsError};
use thiserror::Error;

/// Errors emitted by the poimap CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Name of the missing flag.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag naming the input.
        field: &'static str,
        /// Path that was not found.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag naming the input.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag naming the input.
        field: &'static str,
        /// Path that could not be inspected.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The output path exists but is a directory.
    #[error("output path {path:?} is a directory")]
    OutputIsDirectory {
        /// Offending output path.
        path: Utf8PathBuf,
    },
    /// Opening a rule table file failed.
    #[error("failed to open rule table at {path:?}: {source}")]
    OpenRules {
        /// Rule table path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A rule table failed to load or validate.
    #[error("invalid rule table {origin}: {source}")]
    InvalidRules {
        /// File path, or `built-in` for the bundled table.
        origin: String,
        /// Validation failure.
        #[source]
        source: RuleTableError,
    },
    /// The rule index could not be built.
    #[error(transparent)]
    BuildIndex(#[from] RuleIndexError),
    /// OSM ingestion failed.
    #[error("failed to ingest OSM data: {0}")]
    OsmIngest(#[from] OsmIngestError),
    /// Persisting classified records to SQLite failed.
    #[error("failed to persist records to {path:?}: {source}")]
    PersistRecords {
        /// Output database path.
        path: Utf8PathBuf,
        /// Persistence failure.
        #[source]
        source: PersistRecordsError,
    },
    /// Opening a tag file failed.
    #[error("failed to open tags at {path:?}: {source}")]
    OpenTags {
        /// Tag file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A tag file did not hold a JSON object of string values.
    #[error("failed to parse tags JSON at {path:?}: {source}")]
    ParseTags {
        /// Tag file path.
        path: Utf8PathBuf,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// Both or neither of `--bbox` and `--id` were given.
    #[error("query needs exactly one of --bbox or --id")]
    AmbiguousQuery,
    /// The bounding box argument could not be parsed.
    #[error("invalid bounding box {value:?}: {reason}")]
    InvalidBbox {
        /// Raw argument value.
        value: String,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// The element identifier argument could not be parsed.
    #[error("invalid element id {value:?}: {source}")]
    InvalidElementId {
        /// Raw argument value.
        value: String,
        /// Parse failure.
        #[source]
        source: ElementIdParseError,
    },
    /// Opening the POI store failed.
    #[error(transparent)]
    OpenPoiStore(#[from] SqlitePoiStoreError),
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
