//! Test-only, in-memory `PoiStore` implementation used by unit and behaviour
//! tests.

use geo::{Coord, Intersects, Rect};

use crate::{ElementId, ElementKind, PoiStore, StoredPoi, Tags};

/// In-memory `PoiStore` implementation used in tests.
///
/// The store performs a linear scan and is intended only for small datasets.
#[derive(Default, Debug)]
pub struct MemoryStore {
    pois: Vec<StoredPoi>,
}

impl MemoryStore {
    /// Create a store from a collection of POIs.
    pub fn with_pois<I>(pois: I) -> Self
    where
        I: IntoIterator<Item = StoredPoi>,
    {
        let mut pois: Vec<_> = pois.into_iter().collect();
        pois.sort_by_key(|poi| poi.id);
        Self { pois }
    }
}

impl PoiStore for MemoryStore {
    fn get_pois_in_bbox(
        &self,
        bbox: &Rect<f64>,
    ) -> Box<dyn Iterator<Item = StoredPoi> + Send + '_> {
        let bbox = *bbox;
        Box::new(
            self.pois
                .iter()
                // `Intersects` treats boundary points as inside the rectangle.
                .filter(move |p| bbox.intersects(&p.location))
                .cloned(),
        )
    }

    fn get_poi(&self, id: ElementId) -> Option<StoredPoi> {
        self.pois.iter().find(|poi| poi.id == id).cloned()
    }
}

/// Build a named POI of `class` at `location`.
pub fn stored_poi(kind: ElementKind, id: i64, location: Coord<f64>, class: &str) -> StoredPoi {
    let name = format!("{class} {id}");
    StoredPoi {
        id: ElementId::new(kind, id),
        name: Some(name.clone()),
        class: class.to_owned(),
        location,
        tags: Tags::from([("name", name)]),
        version: 1,
        timestamp: "2024-01-01T00:00:00Z".to_owned(),
    }
}
