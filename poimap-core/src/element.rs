//! Raw OSM elements as handed over by a reader.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Tags;
use crate::tags::NAME_KEY;

/// OSM element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// A single point.
    Node,
    /// An ordered list of nodes, closed when it describes an area.
    Way,
    /// A group of other elements.
    Relation,
}

impl ElementKind {
    /// Return the kind as a lowercase `&str`.
    ///
    /// # Examples
    /// ```
    /// use poimap_core::ElementKind;
    ///
    /// assert_eq!(ElementKind::Way.as_str(), "way");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned when parsing an [`ElementKind`] or [`ElementId`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ElementIdParseError {
    /// The kind was not `node`, `way` or `relation`.
    #[error("unknown element kind {0:?}")]
    UnknownKind(String),
    /// The identifier was not of the form `kind/id`.
    #[error("element id {0:?} is not of the form kind/id")]
    Malformed(String),
    /// The numeric part did not parse.
    #[error("element id {0:?} has a non-numeric identifier")]
    InvalidNumber(String),
}

impl FromStr for ElementKind {
    type Err = ElementIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" | "n" => Ok(Self::Node),
            "way" | "w" => Ok(Self::Way),
            "relation" | "r" => Ok(Self::Relation),
            other => Err(ElementIdParseError::UnknownKind(other.to_owned())),
        }
    }
}

/// Element identity: OSM ids are only unique per kind.
///
/// # Examples
/// ```
/// use poimap_core::{ElementId, ElementKind};
///
/// let id: ElementId = "way/42".parse().unwrap();
/// assert_eq!(id, ElementId::new(ElementKind::Way, 42));
/// assert_eq!(id.to_string(), "way/42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId {
    /// Element type.
    pub kind: ElementKind,
    /// Raw OSM identifier.
    pub id: i64,
}

impl ElementId {
    /// Combine a kind and a raw identifier.
    #[must_use]
    pub const fn new(kind: ElementKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

impl FromStr for ElementId {
    type Err = ElementIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once('/')
            .ok_or_else(|| ElementIdParseError::Malformed(s.to_owned()))?;
        let kind = kind.parse()?;
        let id = id
            .parse()
            .map_err(|_| ElementIdParseError::InvalidNumber(s.to_owned()))?;
        Ok(Self { kind, id })
    }
}

/// Geometry descriptor supplied by the producer.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "coordinates")]
pub enum Geometry {
    /// Location of a node.
    Point(Coord<f64>),
    /// Resolved node locations of a way, in way order.
    Way(LineString<f64>),
}

/// An element as read from an OSM extract.
///
/// The classifier only reads elements; it never mutates them.
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    /// Element identity.
    pub id: ElementId,
    /// The element's tags.
    pub tags: Tags,
    /// Name supplied separately by producers that strip `name` from the tags.
    pub detached_name: Option<String>,
    /// Geometry, when the producer could provide one.
    pub geometry: Option<Geometry>,
    /// OSM version counter.
    pub version: i32,
    /// Last modification time.
    pub timestamp: DateTime<Utc>,
}

impl RawElement {
    /// Construct an element without a detached name or geometry.
    #[must_use]
    pub const fn new(id: ElementId, tags: Tags, version: i32, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            tags,
            detached_name: None,
            geometry: None,
            version,
            timestamp,
        }
    }

    /// Attach a geometry descriptor.
    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Attach a name that was stripped from the tags upstream.
    #[must_use]
    pub fn with_detached_name(mut self, name: impl Into<String>) -> Self {
        self.detached_name = Some(name.into());
        self
    }

    /// The element's name: the `name` tag, else the detached name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.tags.name().or(self.detached_name.as_deref())
    }

    /// Tags with the detached name folded back in as `name`.
    ///
    /// Borrows when there is nothing to fold in.
    #[must_use]
    pub fn full_tags(&self) -> Cow<'_, Tags> {
        match (&self.detached_name, self.tags.contains_key(NAME_KEY)) {
            (Some(name), false) => {
                let mut tags = self.tags.clone();
                tags.insert(NAME_KEY, name.as_str());
                Cow::Owned(tags)
            }
            _ => Cow::Borrowed(&self.tags),
        }
    }
}
