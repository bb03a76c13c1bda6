//! Connectivity gate and publish timing state.
//!
//! [`PublisherState`] holds the only timing the publisher keeps: when the
//! last attempt happened and how far apart attempts must be. The
//! [`Gate`] decides whether a consumed request may reach the transport.
//!
//! All timestamps are `u32` milliseconds since boot and are compared with
//! wrapping arithmetic, so the ~49.7 day rollover is harmless.

use log::debug;

use crate::config::{ConnectivityPolicy, PublisherConfig, StampPolicy};
use crate::error::TransportError;

use super::events::PublishOutcome;
use super::ports::Transport;
use super::request::PublishRequest;

// ───────────────────────────────────────────────────────────────
// PublisherState
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublisherState {
    last_publish_at: u32,
    min_interval_ms: u32,
}

impl PublisherState {
    /// `last_publish_at` starts at `first_publish_delay_ms - min_interval_ms`
    /// so the first periodic attempt is due `first_publish_delay_ms` after boot.
    pub fn new(min_interval_ms: u32, first_publish_delay_ms: u32) -> Self {
        Self {
            last_publish_at: first_publish_delay_ms.wrapping_sub(min_interval_ms),
            min_interval_ms,
        }
    }

    pub fn last_publish_at(&self) -> u32 {
        self.last_publish_at
    }

    pub fn min_interval_ms(&self) -> u32 {
        self.min_interval_ms
    }

    /// Milliseconds since the last attempt.
    pub fn elapsed(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_publish_at)
    }

    /// True iff `now - last_publish_at >= min_interval`.
    pub fn is_due(&self, now_ms: u32) -> bool {
        self.elapsed(now_ms) >= self.min_interval_ms
    }

    pub(crate) fn stamp(&mut self, now_ms: u32) {
        self.last_publish_at = now_ms;
    }
}

// ───────────────────────────────────────────────────────────────
// Gate
// ───────────────────────────────────────────────────────────────

/// Result of a gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Reject(PublishOutcome),
}

#[derive(Debug, Clone, Copy)]
pub struct Gate {
    connectivity: ConnectivityPolicy,
    stamp_policy: StampPolicy,
}

impl Gate {
    pub fn new(connectivity: ConnectivityPolicy, stamp_policy: StampPolicy) -> Self {
        Self {
            connectivity,
            stamp_policy,
        }
    }

    pub fn from_config(config: &PublisherConfig) -> Self {
        Self::new(config.connectivity, config.stamp_policy)
    }

    /// Decide whether `request` may be attempted.
    ///
    /// Connectivity is checked before spacing, so a disconnected link
    /// always yields `SkippedNotConnected`. A rejection leaves
    /// `last_publish_at` untouched unless the stamp policy is
    /// `OnEvaluation` and the link was down.
    pub fn evaluate(
        &self,
        state: &mut PublisherState,
        request: &PublishRequest,
        transport: &impl Transport,
    ) -> Result<GateDecision, TransportError> {
        let now = request.triggered_at;

        if self.connectivity == ConnectivityPolicy::Required && !transport.is_connected()? {
            if self.stamp_policy == StampPolicy::OnEvaluation {
                state.stamp(now);
            }
            debug!("gate: {:?} request at {}ms rejected, offline", request.source, now);
            return Ok(GateDecision::Reject(PublishOutcome::SkippedNotConnected));
        }

        if !state.is_due(now) {
            debug!(
                "gate: {:?} request at {}ms rejected, {}ms since last attempt (min {}ms)",
                request.source,
                now,
                state.elapsed(now),
                state.min_interval_ms()
            );
            return Ok(GateDecision::Reject(PublishOutcome::SkippedTooSoon));
        }

        Ok(GateDecision::Proceed)
    }
}
