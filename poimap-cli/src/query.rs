//! Query command implementation for the poimap CLI.

use std::io::Write;
use std::str::FromStr;

use camino::Utf8PathBuf;
use clap::Parser;
use geo::{Coord, Rect};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use poimap_core::{ElementId, PoiStore, SqlitePoiStore, StoredPoi};
use serde::{Deserialize, Serialize};

use crate::{ARG_BBOX, ARG_DB, ARG_ID, CliError, ENV_DB, require_existing, write_json};

/// CLI arguments for the `query` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Read POIs back from a database written by `ingest`, either \
                 every POI inside a bounding box or a single element by \
                 identity. Prints a JSON array.",
    about = "Look up persisted POIs"
)]
#[ortho_config(prefix = "POIMAP")]
pub(crate) struct QueryArgs {
    /// SQLite database written by `ingest`.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
    /// Bounding box as `min_lon,min_lat,max_lon,max_lat`.
    #[arg(long = ARG_BBOX, value_name = "bbox", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) bbox: Option<String>,
    /// Element identity such as `node/42` or `way/7`.
    #[arg(long = ARG_ID, value_name = "kind/id")]
    #[serde(default)]
    pub(crate) id: Option<String>,
}

/// What a `query` run looks up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum QueryTarget {
    Bbox(Rect<f64>),
    Element(ElementId),
}

/// Resolved `query` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QueryConfig {
    pub(crate) db: Utf8PathBuf,
    pub(crate) target: QueryTarget,
}

impl TryFrom<QueryArgs> for QueryConfig {
    type Error = CliError;

    fn try_from(args: QueryArgs) -> Result<Self, Self::Error> {
        let db = args.db.ok_or(CliError::MissingArgument {
            field: ARG_DB,
            env: ENV_DB,
        })?;
        let target = match (args.bbox, args.id) {
            (Some(bbox), None) => QueryTarget::Bbox(parse_bbox(&bbox)?),
            (None, Some(id)) => QueryTarget::Element(
                ElementId::from_str(&id)
                    .map_err(|source| CliError::InvalidElementId { value: id, source })?,
            ),
            _ => return Err(CliError::AmbiguousQuery),
        };
        Ok(Self { db, target })
    }
}

/// Parse `min_lon,min_lat,max_lon,max_lat` into a rectangle.
pub(crate) fn parse_bbox(value: &str) -> Result<Rect<f64>, CliError> {
    let invalid = |reason| CliError::InvalidBbox {
        value: value.to_owned(),
        reason,
    };
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid("expected four comma-separated numbers"))?;
    let [min_lon, min_lat, max_lon, max_lat] = parts.as_slice() else {
        return Err(invalid("expected four comma-separated numbers"));
    };
    if parts.iter().any(|part| !part.is_finite()) {
        return Err(invalid("coordinates must be finite"));
    }
    if min_lon > max_lon || min_lat > max_lat {
        return Err(invalid("minimum corner must not exceed maximum corner"));
    }
    Ok(Rect::new(
        Coord {
            x: *min_lon,
            y: *min_lat,
        },
        Coord {
            x: *max_lon,
            y: *max_lat,
        },
    ))
}

pub(crate) fn run_query(args: QueryArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = QueryConfig::try_from(merged)?;
    let pois = execute_query(&config)?;
    write_json(writer, &pois)
}

pub(crate) fn execute_query(config: &QueryConfig) -> Result<Vec<StoredPoi>, CliError> {
    require_existing(&config.db, ARG_DB)?;
    let store = SqlitePoiStore::open(config.db.as_std_path())?;
    Ok(match config.target {
        QueryTarget::Bbox(bbox) => store.get_pois_in_bbox(&bbox).collect(),
        QueryTarget::Element(id) => store.get_poi(id).into_iter().collect(),
    })
}
