//! GeoJSON feature model for the two per-vessel channels.
//!
//! Only the subset the renderer consumes is modelled: `Point` and
//! `LineString` geometries wrapped in a `FeatureCollection`.

use crate::entity::{Coordinate, Vessel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointProperties {
    pub name: String,
}

/// Current location of a vessel.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFeature {
    pub coordinates: Coordinate,
    pub properties: PointProperties,
}

/// Travelled path of a vessel. Empty coordinates mean there is no line yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineFeature {
    pub coordinates: Vec<Coordinate>,
}

impl PointFeature {
    pub fn of(vessel: &Vessel) -> Self {
        Self {
            coordinates: vessel.position(),
            properties: PointProperties { name: vessel.name().to_string() },
        }
    }
}

impl LineFeature {
    /// The vessel's full path, or no coordinates at all while the path has a
    /// single point.
    pub fn of(vessel: &Vessel) -> Self {
        if vessel.path_len() > 1 {
            Self { coordinates: vessel.path().collect() }
        } else {
            Self::default()
        }
    }

    /// A line needs at least two points to be drawable.
    pub fn is_drawable(&self) -> bool {
        self.coordinates.len() > 1
    }
}

/// Feature properties. Points carry a `name`; lines carry none.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Properties {
    pub fn named(name: &str) -> Self {
        Self { name: Some(name.to_string()) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Coordinate },
    LineString { coordinates: Vec<Coordinate> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl From<&PointFeature> for FeatureCollection {
    fn from(point: &PointFeature) -> Self {
        FeatureCollection {
            features: vec![Feature {
                geometry: Geometry::Point { coordinates: point.coordinates },
                properties: Properties::named(&point.properties.name),
            }],
        }
    }
}

impl From<&LineFeature> for FeatureCollection {
    fn from(line: &LineFeature) -> Self {
        if !line.is_drawable() {
            return FeatureCollection::default();
        }
        FeatureCollection {
            features: vec![Feature {
                geometry: Geometry::LineString { coordinates: line.coordinates.clone() },
                properties: Properties::default(),
            }],
        }
    }
}
