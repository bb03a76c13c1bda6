//! Log-based observer adapter.
//!
//! Implements [`Observer`] by writing every publish outcome to the
//! ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{debug, info, warn};

use crate::app::events::{PublishOutcome, PublishReport};
use crate::app::ports::Observer;

/// Adapter that logs every [`PublishReport`] to the serial console.
#[derive(Default)]
pub struct LogObserver {
    reported: u32,
}

impl LogObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reports seen since boot.
    pub fn reported(&self) -> u32 {
        self.reported
    }
}

fn ok_label(success: Option<bool>) -> &'static str {
    match success {
        Some(true) => "1",
        Some(false) => "0",
        None => "-",
    }
}

impl Observer for LogObserver {
    fn report(&mut self, r: &PublishReport) {
        self.reported = self.reported.wrapping_add(1);
        match r.outcome {
            PublishOutcome::Sent | PublishOutcome::SentConfirmed => {
                info!(
                    "PUBLISH | outcome={:?} source={:?} at={}ms ack={:?} ok={}",
                    r.outcome,
                    r.source,
                    r.at_ms,
                    r.ack_mode,
                    ok_label(r.success)
                );
            }
            PublishOutcome::SentUnconfirmed => {
                warn!(
                    "PUBLISH | outcome={:?} source={:?} at={}ms ack={:?} ok={}",
                    r.outcome,
                    r.source,
                    r.at_ms,
                    r.ack_mode,
                    ok_label(r.success)
                );
            }
            PublishOutcome::SkippedNotConnected | PublishOutcome::SkippedTooSoon => {
                debug!(
                    "PUBLISH | outcome={:?} source={:?} at={}ms",
                    r.outcome, r.source, r.at_ms
                );
            }
        }
    }
}
