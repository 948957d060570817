//! Records emitted for classified elements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::Classification;
use crate::tags::NAME_KEY;
use crate::{ElementId, Geometry, RawElement, Tags};

/// Timestamp layout of persisted records: ISO-8601, UTC, whole seconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format `timestamp` as `YYYY-MM-DDTHH:MM:SSZ`, dropping sub-second digits.
///
/// # Examples
/// ```
/// use chrono::DateTime;
/// use poimap_core::format_timestamp;
///
/// let ts = DateTime::from_timestamp_millis(1_700_000_000_999).unwrap();
/// assert_eq!(format_timestamp(ts), "2023-11-14T22:13:20Z");
/// ```
#[must_use]
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// A classified POI ready for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    /// Element identity; storage upserts on it.
    #[serde(flatten)]
    pub id: ElementId,
    /// Element name, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    /// Assigned category, or `misc`.
    pub class: String,
    /// Every original tag, including `name`.
    pub tags: Tags,
    /// Geometry passed through from the element.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub geometry: Option<Geometry>,
    /// OSM version counter.
    pub version: i32,
    /// Modification time as `YYYY-MM-DDTHH:MM:SSZ`.
    pub timestamp: String,
}

impl ClassifiedRecord {
    /// Build the record for `element`, or `None` when `classification` is
    /// `None` and the element must not be persisted.
    #[must_use]
    pub fn build(element: &RawElement, classification: Option<Classification<'_>>) -> Option<Self> {
        let classification = classification?;

        let mut tags = element.tags.clone();
        let name = element.name().map(str::to_owned);
        if let Some(name) = &name {
            if !tags.contains_key(NAME_KEY) {
                tags.insert(NAME_KEY, name.as_str());
            }
        }

        Some(Self {
            id: element.id,
            name,
            class: classification.class().to_owned(),
            tags,
            geometry: element.geometry.clone(),
            version: element.version,
            timestamp: format_timestamp(element.timestamp),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementKind, Geometry};
    use geo::Coord;
    use rstest::{fixture, rstest};

    #[fixture]
    fn element() -> RawElement {
        let timestamp =
            DateTime::from_timestamp_millis(1_609_459_200_250).expect("valid timestamp");
        RawElement::new(
            ElementId::new(ElementKind::Node, 42),
            Tags::from([
                ("name", "ACME"),
                ("amenity", "pharmacy"),
                ("opening_hours", "Mo-Fr 08:00-18:00"),
                ("note", "*"),
            ]),
            7,
            timestamp,
        )
        .with_geometry(Geometry::Point(Coord { x: 13.4, y: 52.5 }))
    }

    #[rstest]
    fn skips_unclassified_elements(element: RawElement) {
        assert!(ClassifiedRecord::build(&element, None).is_none());
    }

    #[rstest]
    fn preserves_every_tag_verbatim(element: RawElement) {
        let record = ClassifiedRecord::build(&element, Some(Classification::Category("pharmacy")))
            .expect("record");
        assert_eq!(record.tags, element.tags);
        assert_eq!(record.name.as_deref(), Some("ACME"));
        assert_eq!(record.class, "pharmacy");
    }

    #[rstest]
    fn passes_identity_version_and_geometry_through(element: RawElement) {
        let record = ClassifiedRecord::build(&element, Some(Classification::Misc)).expect("record");
        assert_eq!(record.id, element.id);
        assert_eq!(record.version, 7);
        assert_eq!(record.geometry, element.geometry);
        assert_eq!(record.class, "misc");
    }

    #[rstest]
    fn truncates_timestamp_to_seconds(element: RawElement) {
        let record = ClassifiedRecord::build(&element, Some(Classification::Misc)).expect("record");
        assert_eq!(record.timestamp, "2021-01-01T00:00:00Z");
    }

    #[rstest]
    fn reinjects_detached_name() {
        let element = RawElement::new(
            ElementId::new(ElementKind::Way, 3),
            Tags::from([("shop", "bakery")]),
            1,
            DateTime::UNIX_EPOCH,
        )
        .with_detached_name("Crumbs");
        let record = ClassifiedRecord::build(&element, Some(Classification::Category("bakery")))
            .expect("record");
        assert_eq!(record.tags.name(), Some("Crumbs"));
        assert_eq!(record.tags.get("shop"), Some("bakery"));
        assert_eq!(record.timestamp, "1970-01-01T00:00:00Z");
    }

    #[rstest]
    fn serialises_flat_identity(element: RawElement) {
        let record = ClassifiedRecord::build(&element, Some(Classification::Category("pharmacy")))
            .expect("record");
        let value = serde_json::to_value(&record).expect("serialise record");
        assert_eq!(value["kind"], "node");
        assert_eq!(value["id"], 42);
        assert_eq!(value["class"], "pharmacy");
        assert_eq!(value["timestamp"], "2021-01-01T00:00:00Z");
    }
}
