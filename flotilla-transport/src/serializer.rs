use crate::message::{BinaryUpdate, FeatureUpdate};
use thiserror::Error;

/// Error types for serialization operations
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Binary serialization error: {0}")]
    BinaryError(#[from] bincode::Error),
}

/// An encoded update, ready for a sender.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Encodes feature updates for the wire.
pub trait Serializer: Send {
    fn serialize(&self, update: &FeatureUpdate) -> Result<Payload, SerializationError>;
}

/// GeoJSON text, one update per message.
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, update: &FeatureUpdate) -> Result<Payload, SerializationError> {
        Ok(Payload::Text(serde_json::to_string(update)?))
    }
}

/// Compact bincode encoding of a [`BinaryUpdate`].
pub struct BinarySerializer;

impl BinarySerializer {
    /// Decodes a payload produced by [`BinarySerializer::serialize`].
    pub fn decode(bytes: &[u8]) -> Result<FeatureUpdate, SerializationError> {
        let update: BinaryUpdate = bincode::deserialize(bytes)?;
        Ok(update.into())
    }
}

impl Serializer for BinarySerializer {
    fn serialize(&self, update: &FeatureUpdate) -> Result<Payload, SerializationError> {
        Ok(Payload::Binary(bincode::serialize(&BinaryUpdate::from(update))?))
    }
}
