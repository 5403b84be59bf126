use flotilla_core::{Coordinate, Feature, FeatureCollection, Geometry, Properties, VesselId};
use serde::{Deserialize, Serialize};

/// The two per-vessel sources a renderer draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Point,
    Line,
}

impl Channel {
    /// Renderer-side source name, e.g. `vessel-source-1` or `vessel-line-source-1`.
    pub fn source_id(self, vessel: VesselId) -> String {
        match self {
            Channel::Point => format!("vessel-source-{}", vessel),
            Channel::Line => format!("vessel-line-source-{}", vessel),
        }
    }
}

/// Full replacement of one source's data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureUpdate {
    pub source: String,
    pub vessel: VesselId,
    pub channel: Channel,
    pub data: FeatureCollection,
}

impl FeatureUpdate {
    pub fn new(vessel: VesselId, channel: Channel, data: FeatureCollection) -> Self {
        Self {
            source: channel.source_id(vessel),
            vessel,
            channel,
            data,
        }
    }
}

/// Binary wire form of a [`FeatureUpdate`].
///
/// GeoJSON's `"type"` tags and optional properties need a self-describing
/// format to decode, so the binary path flattens them: geometry is an
/// externally tagged enum and every field is always present. The source name
/// is derived from `vessel` and `channel` on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryUpdate {
    pub vessel: VesselId,
    pub channel: Channel,
    pub features: Vec<BinaryFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryFeature {
    pub geometry: BinaryGeometry,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BinaryGeometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
}

impl From<&FeatureUpdate> for BinaryUpdate {
    fn from(update: &FeatureUpdate) -> Self {
        let features = update
            .data
            .features
            .iter()
            .map(|feature| BinaryFeature {
                geometry: match &feature.geometry {
                    Geometry::Point { coordinates } => BinaryGeometry::Point(*coordinates),
                    Geometry::LineString { coordinates } => BinaryGeometry::LineString(coordinates.clone()),
                },
                name: feature.properties.name.clone(),
            })
            .collect();

        Self {
            vessel: update.vessel,
            channel: update.channel,
            features,
        }
    }
}

impl From<BinaryUpdate> for FeatureUpdate {
    fn from(update: BinaryUpdate) -> Self {
        let features = update
            .features
            .into_iter()
            .map(|feature| Feature {
                geometry: match feature.geometry {
                    BinaryGeometry::Point(coordinates) => Geometry::Point { coordinates },
                    BinaryGeometry::LineString(coordinates) => Geometry::LineString { coordinates },
                },
                properties: Properties { name: feature.name },
            })
            .collect();

        FeatureUpdate::new(update.vessel, update.channel, FeatureCollection { features })
    }
}
