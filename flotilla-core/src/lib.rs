//! Vessel model, fleet store and the renderer-facing feature types.

pub mod entity;
pub mod feature;
pub mod fleet;
pub mod random;
pub mod sink;

pub use entity::{Coordinate, PathRetention, TrackPoint, Vessel, VesselId};
pub use feature::{Feature, FeatureCollection, Geometry, LineFeature, PointFeature, PointProperties, Properties};
pub use fleet::{validate_roster, Fleet, FleetError, VesselSeed};
pub use random::{FixedSource, RandomSource, RngSource};
pub use sink::{FeatureSink, SinkError};
