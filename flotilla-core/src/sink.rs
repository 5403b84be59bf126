use crate::entity::VesselId;
use crate::feature::{LineFeature, PointFeature};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    #[error("failed to encode feature: {0}")]
    Encode(String),

    #[error("sink I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Consumer of per-vessel geometry, typically a renderer.
///
/// Both upserts replace whatever the sink last showed for that vessel. The
/// engine does not wait for the renderer to apply them, so implementations
/// should hand the payload off and return.
pub trait FeatureSink: Send {
    fn upsert_point(&mut self, vessel: VesselId, feature: &PointFeature) -> Result<(), SinkError>;

    /// An empty coordinate list means there is no line to draw yet.
    fn upsert_line(&mut self, vessel: VesselId, feature: &LineFeature) -> Result<(), SinkError>;

    /// Releases whatever the sink holds open. Called once when the simulation stops.
    fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: FeatureSink + ?Sized> FeatureSink for Box<S> {
    fn upsert_point(&mut self, vessel: VesselId, feature: &PointFeature) -> Result<(), SinkError> {
        (**self).upsert_point(vessel, feature)
    }

    fn upsert_line(&mut self, vessel: VesselId, feature: &LineFeature) -> Result<(), SinkError> {
        (**self).upsert_line(vessel, feature)
    }

    fn close(&mut self) -> Result<(), SinkError> {
        (**self).close()
    }
}
