use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use geo::{Coord, Rect};
use log::{info, warn};
use osmpbf::{Element, ElementReader};
use poimap_core::{ClassifiedRecord, Classifier};
use thiserror::Error;

mod accumulator;
mod filter;

use accumulator::{IngestContext, OsmPoiAccumulator};
pub use filter::{DEFAULT_IMPORT_KEYS, ImportFilter};

/// Summary of raw OSM elements discovered during ingestion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OsmIngestSummary {
    /// Number of nodes discovered, including dense-node entries.
    pub nodes: u64,
    /// Number of ways discovered.
    pub ways: u64,
    /// Number of relations discovered.
    pub relations: u64,
    /// Bounding box covering all node coordinates, if any nodes were present.
    /// Coordinates are WGS84 with `x = longitude`, `y = latitude`.
    pub bounds: Option<Rect<f64>>,
}

impl OsmIngestSummary {
    fn combine(mut self, other: Self) -> Self {
        self.nodes += other.nodes;
        self.ways += other.ways;
        self.relations += other.relations;
        if let Some(bounds) = other.bounds {
            self.include_bounds(bounds);
        }
        self
    }

    fn include_bounds(&mut self, bounds: Rect<f64>) {
        match &mut self.bounds {
            Some(existing) => {
                let min = Coord {
                    x: existing.min().x.min(bounds.min().x),
                    y: existing.min().y.min(bounds.min().y),
                };
                let max = Coord {
                    x: existing.max().x.max(bounds.max().x),
                    y: existing.max().y.max(bounds.max().y),
                };
                *existing = Rect::new(min, max);
            }
            None => self.bounds = Some(bounds),
        }
    }

    fn record_node(&mut self, lon: f64, lat: f64) {
        self.nodes += 1;
        if let Some(coordinate) = crate::geometry::validated_coord(lon, lat) {
            self.include_bounds(Rect::new(coordinate, coordinate));
        }
    }

    fn record_way(&mut self) {
        self.ways += 1;
    }

    fn record_relation(&mut self) {
        self.relations += 1;
    }
}

/// Outcome of classifying an OSM PBF extract.
#[derive(Debug, Clone, PartialEq)]
pub struct OsmIngestReport {
    /// Element counts and bounding box information.
    pub summary: OsmIngestSummary,
    /// Classified POIs ordered by element kind, then identifier.
    pub records: Vec<ClassifiedRecord>,
    /// Candidates that passed the import filter but matched no category.
    pub unclassified: u64,
}

/// Errors returned when ingesting an OSM PBF file.
#[derive(Debug, Error)]
pub enum OsmIngestError {
    /// The file could not be opened.
    #[error("failed to open OSM PBF file at {path:?}")]
    Open {
        /// Error reported by the PBF reader.
        #[source]
        source: osmpbf::Error,
        /// Path that failed to open.
        path: PathBuf,
    },
    /// The file could not be decoded as OSM PBF.
    #[error("failed to decode OSM PBF data at {path:?}")]
    Decode {
        /// Error reported by the PBF reader.
        #[source]
        source: osmpbf::Error,
        /// Path of the malformed file.
        path: PathBuf,
    },
}

/// Stream an OSM PBF extract and classify its named candidate elements.
///
/// Blocks are decoded and classified in parallel. Ways that classify are
/// held until a second pass over the file resolves their node coordinates;
/// relations are counted only.
///
/// # Errors
/// Returns [`OsmIngestError::Open`] when the file cannot be opened and
/// [`OsmIngestError::Decode`] when its contents are not valid PBF.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use poimap_core::{Classifier, ClassifierConfig, RuleIndex, RuleTable};
/// use poimap_data::{ImportFilter, ingest_osm_pbf};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let index = RuleIndex::build(&RuleTable::builtin()?)?;
/// let classifier = Classifier::new(index, ClassifierConfig::default());
/// let filter = ImportFilter::default().with_rule_keys(classifier.index());
/// let report = ingest_osm_pbf(Path::new("berlin.osm.pbf"), &classifier, &filter)?;
/// println!("Classified {} points of interest", report.records.len());
/// # Ok(())
/// # }
/// ```
pub fn ingest_osm_pbf(
    path: &Path,
    classifier: &Classifier,
    filter: &ImportFilter,
) -> Result<OsmIngestReport, OsmIngestError> {
    let reader = open_reader(path)?;
    let context = IngestContext { classifier, filter };

    let mut accumulator = reader
        .par_map_reduce(
            |element| {
                let mut accumulator = OsmPoiAccumulator::default();
                accumulator.process_element(context, element);
                accumulator
            },
            OsmPoiAccumulator::default,
            OsmPoiAccumulator::combine,
        )
        .map_err(|source| OsmIngestError::Decode {
            source,
            path: path.to_path_buf(),
        })?;

    if accumulator.has_pending_nodes() {
        let resolver = open_reader(path)?;
        {
            let accumulator_ref = &mut accumulator;
            resolver
                .for_each(|element| match element {
                    Element::Node(node) => {
                        accumulator_ref.resolve_pending_node(node.id(), node.lon(), node.lat());
                    }
                    Element::DenseNode(node) => {
                        accumulator_ref.resolve_pending_node(node.id(), node.lon(), node.lat());
                    }
                    Element::Way(_) | Element::Relation(_) => {}
                })
                .map_err(|source| OsmIngestError::Decode {
                    source,
                    path: path.to_path_buf(),
                })?;
        }
        if accumulator.has_pending_nodes() {
            warn!(
                "Skipped {} way node references without coordinates",
                accumulator.pending_way_node_count()
            );
        }
    }

    let report = accumulator.into_report();
    info!(
        "Classified {} POIs from {} ({} candidates unclassified)",
        report.records.len(),
        path.display(),
        report.unclassified
    );
    Ok(report)
}

fn open_reader(path: &Path) -> Result<ElementReader<BufReader<File>>, OsmIngestError> {
    ElementReader::from_path(path).map_err(|source| OsmIngestError::Open {
        source,
        path: path.to_path_buf(),
    })
}
