//! Mock transport and observer for integration tests.
//!
//! Records every send and every report so tests can assert on the full
//! history without a network.

use cloudpub::app::events::{PublishOutcome, PublishReport};
use cloudpub::app::ports::{Observer, Transport};
use cloudpub::app::request::PublishMessage;
use cloudpub::error::TransportError;
use std::cell::Cell;

// ── MockTransport ─────────────────────────────────────────────

pub struct MockTransport {
    pub connected: bool,
    /// Value every send reports back.
    pub ack: bool,
    /// When set, the next call of either kind faults with this error.
    pub fault: Option<TransportError>,
    pub sent: Vec<PublishMessage>,
    pub connectivity_checks: Cell<u32>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn online() -> Self {
        Self {
            connected: true,
            ack: true,
            fault: None,
            sent: Vec::new(),
            connectivity_checks: Cell::new(0),
        }
    }

    pub fn offline() -> Self {
        Self {
            connected: false,
            ..Self::online()
        }
    }

    pub fn sends(&self) -> usize {
        self.sent.len()
    }
}

impl Transport for MockTransport {
    fn is_connected(&self) -> Result<bool, TransportError> {
        self.connectivity_checks.set(self.connectivity_checks.get() + 1);
        match self.fault {
            Some(e) => Err(e),
            None => Ok(self.connected),
        }
    }

    fn send(&mut self, message: &PublishMessage) -> Result<bool, TransportError> {
        if let Some(e) = self.fault {
            return Err(e);
        }
        self.sent.push(message.clone());
        Ok(self.ack)
    }
}

// ── RecordingObserver ─────────────────────────────────────────

#[derive(Default)]
pub struct RecordingObserver {
    pub reports: Vec<PublishReport>,
}

#[allow(dead_code)]
impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> Vec<PublishOutcome> {
        self.reports.iter().map(|r| r.outcome).collect()
    }

    pub fn last(&self) -> Option<&PublishReport> {
        self.reports.last()
    }
}

impl Observer for RecordingObserver {
    fn report(&mut self, report: &PublishReport) {
        self.reports.push(*report);
    }
}
