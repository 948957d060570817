//! Reduce element geometry to a single representative point.

use geo::{Centroid, Coord, LineString, Polygon};
use poimap_core::Geometry;

/// Minimum coordinate count of a closed ring (three corners plus closure).
const MIN_RING_LEN: usize = 4;

/// Return the point used to place `geometry` on a map.
///
/// A point is returned as-is. A closed way with at least four coordinates is
/// treated as a polygon and yields its centroid; any other way yields the
/// centroid of its line string. Returns `None` for empty ways and for
/// coordinates that are not finite WGS84 degrees.
///
/// # Examples
/// ```
/// use geo::LineString;
/// use poimap_core::Geometry;
/// use poimap_data::representative_point;
///
/// let square = LineString::from(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)]);
/// let point = representative_point(&Geometry::Way(square)).expect("centroid");
/// assert!((point.x - 1.0).abs() < 1e-9 && (point.y - 1.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn representative_point(geometry: &Geometry) -> Option<Coord<f64>> {
    match geometry {
        Geometry::Point(coord) => validated_coord(coord.x, coord.y),
        Geometry::Way(line) => way_centroid(line),
    }
}

fn way_centroid(line: &LineString<f64>) -> Option<Coord<f64>> {
    if line.0.iter().any(|coord| validated_coord(coord.x, coord.y).is_none()) {
        return None;
    }
    let centroid = if line.is_closed() && line.0.len() >= MIN_RING_LEN {
        Polygon::new(line.clone(), Vec::new()).centroid()
    } else {
        line.centroid()
    }?;
    validated_coord(centroid.x(), centroid.y())
}

/// Accept `(lon, lat)` only when both are finite and within WGS84 range.
pub(crate) fn validated_coord(lon: f64, lat: f64) -> Option<Coord<f64>> {
    (lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat))
    .then_some(Coord { x: lon, y: lat })
}
