use crate::message::{Channel, FeatureUpdate};
use crate::sender::Sender;
use crate::serializer::Serializer;
use crate::TransportError;
use flotilla_core::{FeatureCollection, FeatureSink, LineFeature, PointFeature, SinkError, VesselId};
use log::trace;

/// Feature sink that encodes each upsert and hands it to a sender.
pub struct TransportSink {
    serializer: Box<dyn Serializer>,
    sender: Box<dyn Sender>,
}

impl TransportSink {
    pub fn new(serializer: Box<dyn Serializer>, sender: Box<dyn Sender>) -> Self {
        Self { serializer, sender }
    }

    fn publish(&mut self, update: FeatureUpdate) -> Result<(), TransportError> {
        let payload = self.serializer.serialize(&update)?;
        trace!("Publishing {} ({} bytes)", update.source, payload.len());
        self.sender.send(&payload)
    }
}

impl FeatureSink for TransportSink {
    fn upsert_point(&mut self, vessel: VesselId, feature: &PointFeature) -> Result<(), SinkError> {
        let update = FeatureUpdate::new(vessel, Channel::Point, FeatureCollection::from(feature));
        Ok(self.publish(update)?)
    }

    fn upsert_line(&mut self, vessel: VesselId, feature: &LineFeature) -> Result<(), SinkError> {
        let update = FeatureUpdate::new(vessel, Channel::Line, FeatureCollection::from(feature));
        Ok(self.publish(update)?)
    }

    fn close(&mut self) -> Result<(), SinkError> {
        Ok(self.sender.close()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::tests::SharedBuffer;
    use crate::sender::StdioSender;
    use crate::serializer::{BinarySerializer, JsonSerializer};
    use flotilla_core::{Coordinate, PointProperties};
    use serde_json::Value;

    fn point() -> PointFeature {
        PointFeature {
            coordinates: Coordinate::new(-74.1, 40.8),
            properties: PointProperties { name: "Vessel 2".into() },
        }
    }

    #[test]
    fn point_and_line_go_to_their_own_sources() {
        let buffer = SharedBuffer::default();
        let mut sink = TransportSink::new(Box::new(JsonSerializer), Box::new(StdioSender::with_writer(buffer.clone())));

        sink.upsert_point(VesselId(2), &point()).unwrap();
        let line = LineFeature {
            coordinates: vec![Coordinate::new(-74.1, 40.8), Coordinate::new(-74.09, 40.81)],
        };
        sink.upsert_line(VesselId(2), &line).unwrap();

        let contents = buffer.contents();
        let lines: Vec<Value> = contents.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["source"], "vessel-source-2");
        assert_eq!(lines[0]["data"]["features"][0]["properties"]["name"], "Vessel 2");
        assert_eq!(lines[1]["source"], "vessel-line-source-2");
        assert_eq!(lines[1]["data"]["features"][0]["geometry"]["type"], "LineString");
        assert_eq!(
            lines[1]["data"]["features"][0]["geometry"]["coordinates"],
            serde_json::json!([[-74.1, 40.8], [-74.09, 40.81]])
        );
    }

    #[test]
    fn sender_errors_surface_as_sink_errors() {
        let mut sink = TransportSink::new(
            Box::new(BinarySerializer),
            Box::new(StdioSender::with_writer(SharedBuffer::default())),
        );
        assert!(matches!(sink.upsert_point(VesselId(1), &point()), Err(SinkError::Unavailable(_))));
    }

    #[test]
    fn close_closes_the_sender() {
        let mut sink = TransportSink::new(
            Box::new(JsonSerializer),
            Box::new(StdioSender::with_writer(SharedBuffer::default())),
        );
        sink.close().unwrap();
        assert!(sink.upsert_point(VesselId(1), &point()).is_err());
    }
}
