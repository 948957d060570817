//! Internal accumulator for OpenStreetMap (OSM) PBF ingestion.
//!
//! Classifies candidate nodes and ways as they stream past, keeps candidate
//! node coordinates so ways referencing them resolve without a second pass,
//! holds classified ways until their node references are resolved, and
//! builds the summary for the public ingest entry point.
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use geo::{Coord, LineString};
use log::{debug, warn};
use osmpbf::{Element, Info};
use poimap_core::{
    ClassifiedRecord, Classifier, ElementId, ElementKind, Geometry, RawElement, Tags,
};

use super::filter::{ImportFilter, collect_tags};
use super::{OsmIngestReport, OsmIngestSummary};
use crate::geometry::validated_coord;

/// Shared, read-only inputs of a single ingestion run.
#[derive(Clone, Copy)]
pub(super) struct IngestContext<'a> {
    pub(super) classifier: &'a Classifier,
    pub(super) filter: &'a ImportFilter,
}

#[derive(Debug, Default)]
pub(super) struct OsmPoiAccumulator {
    summary: OsmIngestSummary,
    nodes: HashMap<i64, Coord<f64>>,
    pending_way_nodes: HashSet<i64>,
    records: Vec<ClassifiedRecord>,
    way_candidates: Vec<WayCandidate>,
    unclassified: u64,
}

impl OsmPoiAccumulator {
    pub(super) fn process_element(&mut self, context: IngestContext<'_>, element: Element<'_>) {
        match element {
            Element::Node(node) => self.process_node(
                context,
                NodeFields {
                    id: node.id(),
                    lon: node.lon(),
                    lat: node.lat(),
                    meta: ElementMeta::from_info(&node.info()),
                },
                node.tags(),
                node.tags(),
            ),
            Element::DenseNode(node) => {
                let meta = node.info().map_or_else(ElementMeta::default, |info| {
                    ElementMeta::new(Some(info.version()), Some(info.milli_timestamp()))
                });
                self.process_node(
                    context,
                    NodeFields {
                        id: node.id(),
                        lon: node.lon(),
                        lat: node.lat(),
                        meta,
                    },
                    node.tags(),
                    node.tags(),
                );
            }
            Element::Way(way) => self.process_way(context, &way),
            Element::Relation(_) => self.summary.record_relation(),
        }
    }

    fn process_node<'a, F, T>(
        &mut self,
        context: IngestContext<'_>,
        fields: NodeFields,
        filter_tags: F,
        tags: T,
    ) where
        F: IntoIterator<Item = (&'a str, &'a str)>,
        T: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.summary.record_node(fields.lon, fields.lat);
        if !context.filter.accepts(filter_tags) {
            return;
        }
        let Some(location) = validated_coord(fields.lon, fields.lat) else {
            debug!(
                "Skipped node {} with invalid coordinates ({}, {})",
                fields.id, fields.lon, fields.lat
            );
            return;
        };

        self.nodes.insert(fields.id, location);
        let element = fields
            .meta
            .raw_element(ElementId::new(ElementKind::Node, fields.id), collect_tags(tags))
            .with_geometry(Geometry::Point(location));
        match context.classifier.classify_element(&element) {
            Some(record) => self.records.push(record),
            None => self.unclassified += 1,
        }
    }

    fn process_way(&mut self, context: IngestContext<'_>, way: &osmpbf::Way<'_>) {
        self.summary.record_way();
        if !context.filter.accepts(way.tags()) {
            return;
        }
        let element = ElementMeta::from_info(&way.info())
            .raw_element(ElementId::new(ElementKind::Way, way.id()), collect_tags(way.tags()));
        let Some(record) = context.classifier.classify_element(&element) else {
            self.unclassified += 1;
            return;
        };

        let node_refs: Vec<i64> = way.refs().collect();
        self.pending_way_nodes.extend(node_refs.iter().copied());
        self.way_candidates.push(WayCandidate { record, node_refs });
    }

    pub(super) fn combine(mut self, other: Self) -> Self {
        self.summary = self.summary.combine(other.summary);
        for (id, coord) in other.nodes {
            self.nodes.entry(id).or_insert(coord);
        }
        self.records.extend(other.records);
        self.way_candidates.extend(other.way_candidates);
        self.unclassified += other.unclassified;
        self.pending_way_nodes.extend(other.pending_way_nodes);
        self.pending_way_nodes
            .retain(|node_id| !self.nodes.contains_key(node_id));
        self
    }

    pub(super) fn has_pending_nodes(&self) -> bool {
        !self.pending_way_nodes.is_empty()
    }

    pub(super) fn pending_way_node_count(&self) -> usize {
        self.pending_way_nodes.len()
    }

    pub(super) fn resolve_pending_node(&mut self, id: i64, lon: f64, lat: f64) {
        if !self.pending_way_nodes.remove(&id) {
            return;
        }
        if let Some(location) = validated_coord(lon, lat) {
            self.nodes.insert(id, location);
        }
    }

    pub(super) fn into_report(self) -> OsmIngestReport {
        let Self {
            summary,
            nodes,
            mut records,
            way_candidates,
            unclassified,
            ..
        } = self;

        let mut unresolved_ways = 0_usize;
        for candidate in way_candidates {
            let coords: Vec<Coord<f64>> = candidate
                .node_refs
                .iter()
                .filter_map(|node_id| nodes.get(node_id))
                .copied()
                .collect();
            if coords.is_empty() {
                unresolved_ways += 1;
                continue;
            }
            let mut record = candidate.record;
            record.geometry = Some(Geometry::Way(LineString::new(coords)));
            records.push(record);
        }
        if unresolved_ways > 0 {
            warn!("Skipped {unresolved_ways} ways without resolvable node coordinates");
        }

        records.sort_by_key(|record| record.id);
        OsmIngestReport {
            summary,
            records,
            unclassified,
        }
    }
}

#[derive(Debug)]
struct WayCandidate {
    record: ClassifiedRecord,
    node_refs: Vec<i64>,
}

#[derive(Debug, Clone, Copy)]
struct NodeFields {
    id: i64,
    lon: f64,
    lat: f64,
    meta: ElementMeta,
}

/// Version and modification time carried by an OSM element.
///
/// Extracts written without metadata yield version `0` and the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ElementMeta {
    version: i32,
    timestamp: DateTime<Utc>,
}

impl ElementMeta {
    fn new(version: Option<i32>, milli_timestamp: Option<i64>) -> Self {
        Self {
            version: version.unwrap_or_default(),
            timestamp: milli_timestamp
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .unwrap_or_default(),
        }
    }

    fn from_info(info: &Info<'_>) -> Self {
        Self::new(info.version(), info.milli_timestamp())
    }

    fn raw_element(self, id: ElementId, tags: Tags) -> RawElement {
        RawElement::new(id, tags, self.version, self.timestamp)
    }
}
