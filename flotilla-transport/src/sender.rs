//! Senders move encoded payloads to wherever the renderer listens.
//!
//! `StdioSender` writes one JSON update per line, `NullSender` discards
//! everything (headless runs and benchmarks). The websocket sender lives in
//! `websocket.rs` behind the `websocket` feature.

use crate::serializer::Payload;
use crate::TransportError;
use std::io::{self, Write};

/// Sends serialized data to a destination.
pub trait Sender: Send {
    fn send(&mut self, payload: &Payload) -> Result<(), TransportError>;

    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Releases the destination. Sends after `close` are errors.
    fn close(&mut self) -> Result<(), TransportError> {
        self.flush()
    }
}

/// Writes text payloads to a line-oriented writer, stdout by default.
pub struct StdioSender {
    out: Option<Box<dyn Write + Send>>,
}

impl StdioSender {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        StdioSender { out: Some(Box::new(writer)) }
    }
}

impl Default for StdioSender {
    fn default() -> Self {
        Self::new()
    }
}

impl Sender for StdioSender {
    fn send(&mut self, payload: &Payload) -> Result<(), TransportError> {
        let out = self.out.as_mut().ok_or(TransportError::Closed)?;
        match payload {
            Payload::Text(text) => {
                out.write_all(text.as_bytes())?;
                out.write_all(b"\n")?; // One update per line
                out.flush()?; // Ensure it's written immediately
                Ok(())
            }
            Payload::Binary(_) => Err(TransportError::Unsupported(
                "stdio sender only carries text payloads".to_string(),
            )),
        }
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        if let Some(out) = self.out.as_mut() {
            out.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.flush()?;
        self.out = None;
        Ok(())
    }
}

/// Drops every payload, counting what it was given.
#[derive(Debug, Default)]
pub struct NullSender {
    sent: u64,
    bytes: u64,
}

impl NullSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Sender for NullSender {
    fn send(&mut self, payload: &Payload) -> Result<(), TransportError> {
        self.sent += 1;
        self.bytes += payload.len() as u64;
        Ok(())
    }
}
