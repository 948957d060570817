//! Ingest command implementation for the poimap CLI.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use poimap_core::RuleIndex;
use poimap_data::{ImportFilter, ingest_osm_pbf, persist_records_to_sqlite};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_FALLBACK_KEY, ARG_IMPORT_KEY, ARG_OSM_PBF, ARG_OUTPUT, ARG_RULES, CliError, ENV_OSM_PBF,
    build_classifier, require_existing,
};

/// Default SQLite artefact written by `ingest`.
pub(crate) const DEFAULT_OUTPUT: &str = "pois.db";

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Classify the named points of interest in an OpenStreetMap \
                 PBF extract and upsert them into a SQLite database. Paths \
                 can come from CLI flags, configuration files, or \
                 environment variables.",
    about = "Classify an OSM extract into a SQLite POI database"
)]
#[ortho_config(prefix = "POIMAP")]
pub(crate) struct IngestArgs {
    /// Path to the OpenStreetMap PBF file.
    #[arg(long = ARG_OSM_PBF, value_name = "path")]
    #[serde(default)]
    pub(crate) osm_pbf: Option<Utf8PathBuf>,
    /// Path to a JSON rule table; the built-in table is used when omitted.
    #[arg(long = ARG_RULES, value_name = "path")]
    #[serde(default)]
    pub(crate) rules: Option<Utf8PathBuf>,
    /// SQLite database to create or update (defaults to `pois.db`).
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Key that yields the `misc` class when no rule matches (repeatable).
    #[arg(long = ARG_FALLBACK_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) fallback_keys: Option<Vec<String>>,
    /// Key that makes a named element an import candidate (repeatable).
    /// Without it the default keys plus every rule's first key are used.
    #[arg(long = ARG_IMPORT_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) import_keys: Option<Vec<String>>,
}

impl IngestArgs {
    pub(crate) fn into_config(self) -> Result<IngestConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IngestConfig::try_from(merged)
    }
}

/// Resolved `ingest` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestConfig {
    pub(crate) osm_pbf: Utf8PathBuf,
    pub(crate) rules: Option<Utf8PathBuf>,
    pub(crate) output: Utf8PathBuf,
    pub(crate) fallback_keys: Option<Vec<String>>,
    pub(crate) import_keys: Option<Vec<String>>,
}

impl IngestConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.osm_pbf, ARG_OSM_PBF)?;
        if let Some(rules) = &self.rules {
            require_existing(rules, ARG_RULES)?;
        }
        if poimap_fs::is_dir(&self.output).map_err(|source| CliError::InspectSourcePath {
            field: ARG_OUTPUT,
            path: self.output.clone(),
            source,
        })? {
            return Err(CliError::OutputIsDirectory {
                path: self.output.clone(),
            });
        }
        Ok(())
    }

    /// Explicit import keys, or the defaults widened to every key that
    /// starts a rule in `index`.
    pub(crate) fn import_filter(&self, index: &RuleIndex) -> ImportFilter {
        self.import_keys.as_ref().map_or_else(
            || ImportFilter::default().with_rule_keys(index),
            |keys| ImportFilter::new(keys.iter().cloned()),
        )
    }
}

impl TryFrom<IngestArgs> for IngestConfig {
    type Error = CliError;

    fn try_from(args: IngestArgs) -> Result<Self, Self::Error> {
        let osm_pbf = args.osm_pbf.ok_or(CliError::MissingArgument {
            field: ARG_OSM_PBF,
            env: ENV_OSM_PBF,
        })?;
        Ok(Self {
            osm_pbf,
            rules: args.rules,
            output: args
                .output
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT)),
            fallback_keys: args.fallback_keys,
            import_keys: args.import_keys,
        })
    }
}

/// Summary printed after a successful `ingest` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    /// SQLite database that received the records.
    pub output: Utf8PathBuf,
    /// Nodes read from the extract.
    pub nodes: u64,
    /// Ways read from the extract.
    pub ways: u64,
    /// Relations read from the extract.
    pub relations: u64,
    /// Records produced by the classifier.
    pub classified: usize,
    /// Import candidates that matched no category.
    pub unclassified: u64,
    /// Rows written to the database.
    pub persisted: usize,
    /// Record count per class.
    pub classes: BTreeMap<String, usize>,
}

pub(crate) fn run_ingest(args: IngestArgs) -> Result<IngestOutcome, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    execute_ingest(&config)
}

pub(crate) fn execute_ingest(config: &IngestConfig) -> Result<IngestOutcome, CliError> {
    let classifier = build_classifier(config.rules.as_deref(), config.fallback_keys.as_deref())?;
    let filter = config.import_filter(classifier.index());
    let report = ingest_osm_pbf(config.osm_pbf.as_std_path(), &classifier, &filter)?;
    let persisted = persist_records_to_sqlite(&config.output, &report.records).map_err(
        |source| CliError::PersistRecords {
            path: config.output.clone(),
            source,
        },
    )?;
    info!("Persisted {persisted} POIs to {}", config.output);

    let mut classes = BTreeMap::new();
    for record in &report.records {
        *classes.entry(record.class.clone()).or_insert(0) += 1;
    }
    Ok(IngestOutcome {
        output: config.output.clone(),
        nodes: report.summary.nodes,
        ways: report.summary.ways,
        relations: report.summary.relations,
        classified: report.records.len(),
        unclassified: report.unclassified,
        persisted,
        classes,
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<IngestConfig, CliError> {
    let merged = IngestArgs::merge_from_layers(layers).map_err(CliError::from)?;
    IngestConfig::try_from(merged)
}
