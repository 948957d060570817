//! SQLite-backed store for persisted POIs.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use geo::{Coord, Rect};
use log::debug;
use rstar::{AABB, RTree, RTreeObject};
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

use super::{PoiStore, StoredPoi};
use crate::{ElementId, ElementKind, Tags};

/// Error raised when reading persisted POI artefacts.
#[derive(Debug, Error)]
pub enum SqlitePoiStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A row carried an element kind other than `node`, `way` or `relation`.
    #[error("row {id} has unknown element kind {kind:?}")]
    InvalidKind {
        /// Raw identifier of the row.
        id: i64,
        /// Stored kind.
        kind: String,
    },
    /// The stored tag payload was not valid JSON.
    #[error("failed to parse tags for POI {id}: {source}")]
    InvalidTags {
        /// Identity of the POI whose tags failed to parse.
        id: ElementId,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// Generic SQLite error when reading POI rows.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    id: ElementId,
    location: [f64; 2],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.location)
    }
}

/// Read-only POI store backed by the `pois` table of a SQLite database.
///
/// Rows are loaded once on open: an R\*-tree answers bounding-box queries and
/// a hash map answers lookups by identity.
pub struct SqlitePoiStore {
    index: RTree<IndexedPoint>,
    pois: HashMap<ElementId, StoredPoi>,
}

impl fmt::Debug for SqlitePoiStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlitePoiStore")
            .field("entries", &self.pois.len())
            .finish_non_exhaustive()
    }
}

impl SqlitePoiStore {
    /// Open a store backed by the SQLite database at `database_path`.
    ///
    /// # Errors
    /// Returns [`SqlitePoiStoreError`] when the database cannot be opened or
    /// a row cannot be decoded.
    pub fn open<P>(database_path: P) -> Result<Self, SqlitePoiStoreError>
    where
        P: AsRef<Path>,
    {
        let database_path = database_path.as_ref();
        let connection =
            Connection::open_with_flags(database_path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
                |source| SqlitePoiStoreError::OpenDatabase {
                    path: database_path.to_path_buf(),
                    source,
                },
            )?;

        let rows = load_rows(&connection)?;
        debug!(
            "Loaded {} POIs from {}",
            rows.len(),
            database_path.display()
        );

        let points = rows
            .iter()
            .map(|poi| IndexedPoint {
                id: poi.id,
                location: [poi.location.x, poi.location.y],
            })
            .collect();
        let pois = rows.into_iter().map(|poi| (poi.id, poi)).collect();

        Ok(Self {
            index: RTree::bulk_load(points),
            pois,
        })
    }

    /// Number of stored POIs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pois.len()
    }

    /// Whether the store holds no POIs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }
}

impl PoiStore for SqlitePoiStore {
    fn get_pois_in_bbox(
        &self,
        bbox: &Rect<f64>,
    ) -> Box<dyn Iterator<Item = StoredPoi> + Send + '_> {
        let envelope =
            AABB::from_corners([bbox.min().x, bbox.min().y], [bbox.max().x, bbox.max().y]);
        let mut ids: Vec<ElementId> = self
            .index
            .locate_in_envelope_intersecting(&envelope)
            .map(|point| point.id)
            .collect();
        ids.sort_unstable();

        Box::new(ids.into_iter().filter_map(|id| self.pois.get(&id).cloned()))
    }

    fn get_poi(&self, id: ElementId) -> Option<StoredPoi> {
        self.pois.get(&id).cloned()
    }
}

fn load_rows(connection: &Connection) -> Result<Vec<StoredPoi>, SqlitePoiStoreError> {
    let mut statement = connection.prepare(
        "SELECT kind, id, name, class, lon, lat, tags, version, timestamp FROM pois",
    )?;
    let mut rows = statement.query([])?;
    let mut pois = Vec::new();

    while let Some(row) = rows.next()? {
        let kind_raw: String = row.get(0)?;
        let raw_id: i64 = row.get(1)?;
        let kind = stored_kind(&kind_raw).ok_or_else(|| SqlitePoiStoreError::InvalidKind {
            id: raw_id,
            kind: kind_raw.clone(),
        })?;
        let id = ElementId::new(kind, raw_id);
        let tags_json: String = row.get(6)?;
        let tags: Tags = serde_json::from_str(&tags_json)
            .map_err(|source| SqlitePoiStoreError::InvalidTags { id, source })?;

        pois.push(StoredPoi {
            id,
            name: row.get(2)?,
            class: row.get(3)?,
            location: Coord {
                x: row.get(4)?,
                y: row.get(5)?,
            },
            tags,
            version: row.get(7)?,
            timestamp: row.get(8)?,
        });
    }

    Ok(pois)
}

/// Map the `kind` column back to an element kind. Only the full names the
/// writer stores are accepted, not the `n`/`w`/`r` shorthands.
fn stored_kind(raw: &str) -> Option<ElementKind> {
    [ElementKind::Node, ElementKind::Way, ElementKind::Relation]
        .into_iter()
        .find(|kind| kind.as_str() == raw)
}
