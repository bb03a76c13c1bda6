//! Inbound publish requests and the outbound message they carry.
//!
//! A [`PublishRequest`] is created when the publish loop consumes a
//! trigger; the [`PublishMessage`] is fixed per deployment and handed to
//! the [`Transport`](super::ports::Transport) on every attempt.

use super::ports::ConfigError;
use crate::config::{AckMode, MAX_EVENT_NAME_LEN, MAX_PAYLOAD_LEN, PublisherConfig, Visibility};

/// Where a publish request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Periodic schedule check in the main loop.
    Timer,
    /// Asynchronous edge (button press, software signal).
    EdgeEvent,
}

/// One candidate attempt to emit the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishRequest {
    /// Monotonic milliseconds at which the request was consumed.
    pub triggered_at: u32,
    pub source: TriggerKind,
}

/// Everything the transport needs to send the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishMessage {
    pub event_name: heapless::String<MAX_EVENT_NAME_LEN>,
    pub payload: heapless::Vec<u8, MAX_PAYLOAD_LEN>,
    pub visibility: Visibility,
    pub ack_mode: AckMode,
}

impl PublishMessage {
    pub fn from_config(config: &PublisherConfig) -> Result<Self, ConfigError> {
        let payload = heapless::Vec::from_slice(config.payload.as_bytes())
            .map_err(|_| ConfigError::ValidationFailed("payload exceeds message capacity"))?;
        Ok(Self {
            event_name: config.event_name.clone(),
            payload,
            visibility: config.visibility,
            ack_mode: config.ack_mode,
        })
    }
}
