//! Bounded report queue.
//!
//! Uses an `embassy-sync` channel to hand publish reports from the
//! publish loop to a consumer (summary tally, telemetry uplink) without
//! heap allocation and without ever blocking the publisher.
//!
//! ```text
//! ┌──────────────┐ PublishReport ┌────────────────┐
//! │ Publish Loop │─────────────▶│ Consumer       │
//! │ (try_send)   │               │ (drain)        │
//! └──────────────┘               └────────────────┘
//! ```
//!
//! A poll yields at most one report, so the consumer must drain on the
//! poll cadence. The queue depth only absorbs scheduling jitter.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::events::{PublishOutcome, PublishReport};
use crate::app::ports::Observer;

/// Default queue depth.
pub const REPORT_DEPTH: usize = 8;

/// Channel type shared between the publish loop and the consumer.
pub type ReportChannel<const N: usize = REPORT_DEPTH> =
    Channel<CriticalSectionRawMutex, PublishReport, N>;

/// Process-wide queue used by the firmware binary.
pub static REPORT_CHANNEL: ReportChannel = Channel::new();

/// [`Observer`] that enqueues reports. A full queue drops the newest
/// report and counts it. Only the 1st, 2nd, 4th, 8th ... drop is logged.
pub struct QueueObserver<'a, const N: usize = REPORT_DEPTH> {
    channel: &'a ReportChannel<N>,
    dropped: u32,
}

impl<'a, const N: usize> QueueObserver<'a, N> {
    pub fn new(channel: &'a ReportChannel<N>) -> Self {
        Self { channel, dropped: 0 }
    }

    /// Reports lost to a full queue since construction.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<const N: usize> Observer for QueueObserver<'_, N> {
    fn report(&mut self, report: &PublishReport) {
        if self.channel.try_send(*report).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
            if self.dropped.is_power_of_two() {
                warn!(
                    "report queue full, dropped {:?} at {}ms ({} dropped total)",
                    report.outcome, report.at_ms, self.dropped
                );
            }
        }
    }
}

/// Drain every queued report into `handler`, oldest first.
pub fn drain<const N: usize>(channel: &ReportChannel<N>, mut handler: impl FnMut(PublishReport)) {
    while let Ok(report) = channel.try_receive() {
        handler(report);
    }
}

/// Running outcome counts for the periodic `SUMMARY` line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReportTally {
    pub sent: u32,
    pub unconfirmed: u32,
    pub skipped: u32,
}

impl ReportTally {
    pub fn record(&mut self, report: &PublishReport) {
        let slot = match report.outcome {
            PublishOutcome::Sent | PublishOutcome::SentConfirmed => &mut self.sent,
            PublishOutcome::SentUnconfirmed => &mut self.unconfirmed,
            PublishOutcome::SkippedNotConnected | PublishOutcome::SkippedTooSoon => {
                &mut self.skipped
            }
        };
        *slot = slot.wrapping_add(1);
    }
}

impl core::fmt::Display for ReportTally {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "sent={} unconfirmed={} skipped={}",
            self.sent, self.unconfirmed, self.skipped
        )
    }
}
