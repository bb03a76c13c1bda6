//! Outbound publish outcomes.
//!
//! The [`PublisherService`](super::service::PublisherService) emits one
//! [`PublishReport`] per consumed request through the
//! [`Observer`](super::ports::Observer) port. Adapters on the other side
//! decide what to do with them: log to serial, queue for another task, etc.

use crate::config::AckMode;

use super::request::TriggerKind;

/// Terminal result of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Sent without waiting for confirmation.
    Sent,
    /// Sent and acknowledged by the far end.
    SentConfirmed,
    /// Sent, but the ack never arrived or the transport reported failure.
    SentUnconfirmed,
    /// Dropped by the gate: the transport was offline.
    SkippedNotConnected,
    /// Dropped by the gate: too soon after the previous attempt.
    SkippedTooSoon,
}

impl PublishOutcome {
    /// Whether the transport was actually invoked.
    pub fn attempted(self) -> bool {
        matches!(self, Self::Sent | Self::SentConfirmed | Self::SentUnconfirmed)
    }
}

/// An outcome plus the context an observer needs to make sense of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    pub outcome: PublishOutcome,
    pub source: TriggerKind,
    /// Monotonic milliseconds of the evaluation.
    pub at_ms: u32,
    pub ack_mode: AckMode,
    /// The transport's boolean for attempted sends. For `WaitForAck`
    /// this is delivery confirmation; otherwise it only means the
    /// transport accepted the message. `None` for gate rejections.
    pub success: Option<bool>,
}
