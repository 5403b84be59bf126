//! Getting feature updates out of the engine and onto a renderer.
//!
//! A [`TransportSink`] is the engine's [`flotilla_core::FeatureSink`]: it wraps
//! each point or line in a [`FeatureUpdate`], encodes it with a
//! [`Serializer`] and hands the payload to a [`Sender`].

use flotilla_core::SinkError;
use std::io;
use thiserror::Error;

pub mod message;
pub mod sender;
pub mod serializer;
pub mod sink;
#[cfg(feature = "websocket")]
pub mod websocket;

pub use message::{BinaryFeature, BinaryGeometry, BinaryUpdate, Channel, FeatureUpdate};
pub use sender::{NullSender, Sender, StdioSender};
pub use serializer::{BinarySerializer, JsonSerializer, Payload, SerializationError, Serializer};
pub use sink::TransportSink;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketSender;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] SerializationError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("sender is closed")]
    Closed,
}

impl From<TransportError> for SinkError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Serialization(err) => SinkError::Encode(err.to_string()),
            TransportError::Io(err) => SinkError::Io(err),
            other => SinkError::Unavailable(other.to_string()),
        }
    }
}
