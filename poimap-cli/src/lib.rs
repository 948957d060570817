//! Command-line interface for poimap's ingestion and lookup tooling.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use poimap_core::{Classifier, ClassifierConfig, RuleIndex, RuleTable};
use serde::Serialize;
use std::io::{BufReader, Write};

mod classify;
mod error;
mod ingest;
mod query;

pub use error::CliError;
pub use ingest::IngestOutcome;

use classify::ClassifyArgs;
use ingest::IngestArgs;
use query::QueryArgs;

pub(crate) const ARG_OSM_PBF: &str = "osm-pbf";
pub(crate) const ARG_RULES: &str = "rules";
pub(crate) const ARG_OUTPUT: &str = "output";
pub(crate) const ARG_FALLBACK_KEY: &str = "fallback-key";
pub(crate) const ARG_IMPORT_KEY: &str = "import-key";
pub(crate) const ARG_TAGS: &str = "tags";
pub(crate) const ARG_DB: &str = "db";
pub(crate) const ARG_BBOX: &str = "bbox";
pub(crate) const ARG_ID: &str = "id";
pub(crate) const ENV_OSM_PBF: &str = "POIMAP_CMDS_INGEST_OSM_PBF";
pub(crate) const ENV_TAGS: &str = "POIMAP_CMDS_CLASSIFY_TAGS_PATH";
pub(crate) const ENV_DB: &str = "POIMAP_CMDS_QUERY_DB";

/// Run the poimap CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when argument parsing, configuration or the selected
/// command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Ingest(args) => {
            let outcome = ingest::run_ingest(args)?;
            write_json(&mut stdout, &outcome)
        }
        Command::Classify(args) => classify::run_classify(args, &mut stdout),
        Command::Query(args) => query::run_query(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "poimap",
    about = "Classify OpenStreetMap points of interest and query the results",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify an OSM extract and persist the POIs to SQLite.
    Ingest(IngestArgs),
    /// Classify a single JSON tag map.
    Classify(ClassifyArgs),
    /// Look up persisted POIs by bounding box or identity.
    Query(QueryArgs),
}

/// Check that `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match poimap_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Load the rule table at `rules`, or the built-in table, and build a
/// classifier over it.
pub(crate) fn build_classifier(
    rules: Option<&Utf8Path>,
    fallback_keys: Option<&[String]>,
) -> Result<Classifier, CliError> {
    let table = match rules {
        Some(path) => {
            let file = poimap_fs::open_utf8_file(path).map_err(|source| CliError::OpenRules {
                path: path.to_path_buf(),
                source,
            })?;
            RuleTable::from_reader(BufReader::new(file)).map_err(|source| {
                CliError::InvalidRules {
                    origin: path.to_string(),
                    source,
                }
            })?
        }
        None => RuleTable::builtin().map_err(|source| CliError::InvalidRules {
            origin: "built-in".to_owned(),
            source,
        })?,
    };
    let index = RuleIndex::build(&table)?;
    let config = fallback_keys.map_or_else(ClassifierConfig::default, |keys| ClassifierConfig {
        fallback_keys: keys.iter().cloned().collect(),
    });
    Ok(Classifier::new(index, config))
}

pub(crate) fn write_json<T>(writer: &mut dyn Write, value: &T) -> Result<(), CliError>
where
    T: Serialize + ?Sized,
{
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
