//! Classify command implementation for the poimap CLI.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use poimap_core::Tags;
use serde::{Deserialize, Serialize};

use crate::{
    ARG_FALLBACK_KEY, ARG_RULES, ARG_TAGS, CliError, ENV_TAGS, build_classifier,
    require_existing, write_json,
};

/// CLI arguments for the `classify` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Classify one element given as a JSON object of tag keys \
                 to values. Prints the category, or null when the element \
                 is not a point of interest.",
    about = "Classify a single JSON tag map"
)]
#[ortho_config(prefix = "POIMAP")]
pub(crate) struct ClassifyArgs {
    /// Path to a JSON file holding the element's tags.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) tags_path: Option<Utf8PathBuf>,
    /// Path to a JSON rule table; the built-in table is used when omitted.
    #[arg(long = ARG_RULES, value_name = "path")]
    #[serde(default)]
    pub(crate) rules: Option<Utf8PathBuf>,
    /// Key that yields the `misc` class when no rule matches (repeatable).
    #[arg(long = ARG_FALLBACK_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) fallback_keys: Option<Vec<String>>,
}

/// Resolved `classify` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClassifyConfig {
    pub(crate) tags_path: Utf8PathBuf,
    pub(crate) rules: Option<Utf8PathBuf>,
    pub(crate) fallback_keys: Option<Vec<String>>,
}

impl TryFrom<ClassifyArgs> for ClassifyConfig {
    type Error = CliError;

    fn try_from(args: ClassifyArgs) -> Result<Self, Self::Error> {
        let tags_path = args.tags_path.ok_or(CliError::MissingArgument {
            field: ARG_TAGS,
            env: ENV_TAGS,
        })?;
        Ok(Self {
            tags_path,
            rules: args.rules,
            fallback_keys: args.fallback_keys,
        })
    }
}

pub(crate) fn run_classify(args: ClassifyArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = ClassifyConfig::try_from(merged)?;
    let class = execute_classify(&config)?;
    write_json(writer, &class)
}

/// Classify the tags named by `config`, returning the class if any.
pub(crate) fn execute_classify(config: &ClassifyConfig) -> Result<Option<String>, CliError> {
    require_existing(&config.tags_path, ARG_TAGS)?;
    if let Some(rules) = &config.rules {
        require_existing(rules, ARG_RULES)?;
    }
    let classifier = build_classifier(config.rules.as_deref(), config.fallback_keys.as_deref())?;
    let tags = load_tags(&config.tags_path)?;
    Ok(classifier
        .classify(&tags)
        .map(|classification| classification.class().to_owned()))
}

/// Loads a JSON object of tags from disk.
pub(crate) fn load_tags(path: &Utf8Path) -> Result<Tags, CliError> {
    let contents = poimap_fs::read_utf8_to_string(path).map_err(|source| CliError::OpenTags {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CliError::ParseTags {
        path: path.to_path_buf(),
        source,
    })
}
