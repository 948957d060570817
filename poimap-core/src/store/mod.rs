//! Read access to persisted points of interest.
//!
//! The [`PoiStore`] trait serves stored records by bounding box or by element
//! identity. It is the only reader of the artefacts written by ingestion.

use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

use crate::{ElementId, Tags};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::{SqlitePoiStore, SqlitePoiStoreError};

/// A persisted POI as returned by queries.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`; for ways
/// the location is the representative point computed at ingest time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPoi {
    /// Element identity.
    #[serde(flatten)]
    pub id: ElementId,
    /// Element name, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    /// Assigned category.
    pub class: String,
    /// Representative location.
    pub location: Coord<f64>,
    /// All original tags.
    pub tags: Tags,
    /// OSM version counter.
    pub version: i32,
    /// Modification time as `YYYY-MM-DDTHH:MM:SSZ`.
    pub timestamp: String,
}

/// Read-only access to persisted POIs.
///
/// # Examples
///
/// ```rust
/// use geo::{Coord, Intersects, Rect};
/// use poimap_core::{ElementId, PoiStore, StoredPoi};
///
/// struct VecStore(Vec<StoredPoi>);
///
/// impl PoiStore for VecStore {
///     fn get_pois_in_bbox(
///         &self,
///         bbox: &Rect<f64>,
///     ) -> Box<dyn Iterator<Item = StoredPoi> + Send + '_> {
///         let bbox = *bbox;
///         Box::new(self.0.iter().filter(move |p| bbox.intersects(&p.location)).cloned())
///     }
///
///     fn get_poi(&self, id: ElementId) -> Option<StoredPoi> {
///         self.0.iter().find(|p| p.id == id).cloned()
///     }
/// }
///
/// let store = VecStore(Vec::new());
/// let bbox = Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 1.0, y: 1.0 });
/// assert_eq!(store.get_pois_in_bbox(&bbox).count(), 0);
/// ```
pub trait PoiStore {
    /// Return all POIs inside `bbox`, ordered by element identity.
    ///
    /// Coordinates use WGS84 (longitude, latitude) degrees. Boundary points
    /// are inside. Regions crossing the antimeridian must be split by the
    /// caller into two queries.
    fn get_pois_in_bbox(&self, bbox: &Rect<f64>)
    -> Box<dyn Iterator<Item = StoredPoi> + Send + '_>;

    /// Return the POI stored for `id`, if any.
    fn get_poi(&self, id: ElementId) -> Option<StoredPoi>;
}

#[cfg(test)]
mod tests {
    use super::PoiStore;
    use crate::test_support::{MemoryStore, stored_poi};
    use crate::{ElementId, ElementKind};
    use geo::{Coord, Rect};
    use rstest::rstest;

    fn unit_bbox() -> Rect<f64> {
        Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 1.0, y: 1.0 })
    }

    #[rstest]
    fn returns_pois_inside_bbox() {
        let poi = stored_poi(ElementKind::Node, 1, Coord { x: 0.0, y: 0.0 }, "cafe");
        let store = MemoryStore::with_pois([poi.clone()]);
        let found: Vec<_> = store.get_pois_in_bbox(&unit_bbox()).collect();
        assert_eq!(found, vec![poi]);
    }

    #[rstest]
    #[case(Coord { x: -1.0, y: 0.0 })] // left edge
    #[case(Coord { x: 1.0, y: 1.0 })] // top-right corner
    fn includes_poi_on_bbox_boundary(#[case] location: Coord<f64>) {
        let poi = stored_poi(ElementKind::Node, 2, location, "cafe");
        let store = MemoryStore::with_pois([poi.clone()]);
        let found: Vec<_> = store.get_pois_in_bbox(&unit_bbox()).collect();
        assert_eq!(found, vec![poi]);
    }

    #[rstest]
    fn excludes_poi_just_outside_bbox() {
        let poi = stored_poi(ElementKind::Node, 3, Coord { x: 1.000_000_1, y: 0.0 }, "cafe");
        let store = MemoryStore::with_pois([poi]);
        assert_eq!(store.get_pois_in_bbox(&unit_bbox()).count(), 0);
    }

    #[rstest]
    fn node_and_way_with_same_number_are_distinct() {
        let node = stored_poi(ElementKind::Node, 7, Coord { x: 0.0, y: 0.0 }, "cafe");
        let way = stored_poi(ElementKind::Way, 7, Coord { x: 0.5, y: 0.5 }, "park");
        let store = MemoryStore::with_pois([node.clone(), way.clone()]);
        assert_eq!(store.get_poi(ElementId::new(ElementKind::Node, 7)), Some(node));
        assert_eq!(store.get_poi(ElementId::new(ElementKind::Way, 7)), Some(way));
        assert_eq!(store.get_poi(ElementId::new(ElementKind::Relation, 7)), None);
    }
}
