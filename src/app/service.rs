//! Publisher service: the hexagonal core.
//!
//! [`PublisherService`] owns the publish timing state, the edge pending
//! flag, and the connectivity gate. All I/O flows through port traits
//! injected at call sites, so the whole policy runs under test without a
//! timer, a button, or a network.
//!
//! ```text
//!  TriggerSource ──▶ ┌──────────────────────────┐ ──▶ Observer
//!                    │     PublisherService     │
//!      Transport ◀──│ intake · gate · attempt  │
//!                    └──────────────────────────┘
//! ```
//!
//! One call to [`PublisherService::poll`] consumes at most one request,
//! runs it to completion (including a blocking ack wait) and reports
//! exactly one outcome.

use log::{debug, info, warn};

use crate::config::{AckMode, PublisherConfig};
use crate::error::Result;
use crate::trigger::EdgeTrigger;

use super::events::{PublishOutcome, PublishReport};
use super::gate::{Gate, GateDecision, PublisherState};
use super::ports::{Observer, Transport, TriggerSource};
use super::request::{PublishMessage, PublishRequest, TriggerKind};

// ───────────────────────────────────────────────────────────────
// PublisherService
// ───────────────────────────────────────────────────────────────

pub struct PublisherService {
    config: PublisherConfig,
    message: PublishMessage,
    state: PublisherState,
    gate: Gate,
    edge: EdgeTrigger,
}

impl PublisherService {
    /// Build the service from a validated configuration.
    ///
    /// Edges can still be raised through [`edge_trigger`](Self::edge_trigger);
    /// use [`with_trigger_source`](Self::with_trigger_source) to register with
    /// a hardware source instead.
    pub fn new(config: PublisherConfig) -> Result<Self> {
        config.validate()?;
        let state = PublisherState::new(config.min_interval_ms, config.first_publish_delay_ms);
        info!(
            "PublisherService: '{}' mode={:?} ack={:?} every {}ms (first after {}ms)",
            config.event_name,
            config.trigger_mode,
            config.ack_mode,
            config.min_interval_ms,
            config.first_publish_delay_ms
        );
        let message = PublishMessage::from_config(&config)?;
        Ok(Self {
            message,
            gate: Gate::from_config(&config),
            state,
            edge: EdgeTrigger::new(),
            config,
        })
    }

    /// Build the service and subscribe its edge handler to `source`.
    ///
    /// This is the only registration; the handler is never re-registered.
    /// Periodic-only configurations leave the source untouched.
    pub fn with_trigger_source(
        config: PublisherConfig,
        source: &mut impl TriggerSource,
    ) -> Result<Self> {
        let svc = Self::new(config)?;
        if svc.config.trigger_mode.edge() {
            source.subscribe(svc.edge.clone());
        } else {
            debug!("PublisherService: periodic-only, trigger source not subscribed");
        }
        Ok(svc)
    }

    // ── Trigger intake ────────────────────────────────────────

    /// Handle for raising edges from another context.
    pub fn edge_trigger(&self) -> EdgeTrigger {
        self.edge.clone()
    }

    /// Mark an edge request pending. Never blocks or fails. A no-op in
    /// periodic-only mode.
    pub fn on_edge_trigger(&self) {
        if self.config.trigger_mode.edge() {
            self.edge.fire();
        }
    }

    /// True iff periodic triggering is enabled and the interval since the
    /// last attempt has elapsed.
    pub fn check_periodic_trigger(&self, now_ms: u32) -> bool {
        self.config.trigger_mode.periodic() && self.state.is_due(now_ms)
    }

    // ── Evaluation step ───────────────────────────────────────

    /// Consume at most one request, gate it, attempt it, report it.
    ///
    /// Returns `Ok(None)` when nothing was pending or due. A transport
    /// fault is returned as `Err` after the request has been consumed;
    /// no outcome is reported for it.
    pub fn poll(
        &mut self,
        now_ms: u32,
        transport: &mut impl Transport,
        observer: &mut impl Observer,
    ) -> Result<Option<PublishOutcome>> {
        let Some(request) = self.next_request(now_ms) else {
            return Ok(None);
        };

        let (outcome, success) = self.evaluate(&request, transport)?;

        observer.report(&PublishReport {
            outcome,
            source: request.source,
            at_ms: request.triggered_at,
            ack_mode: self.message.ack_mode,
            success,
        });
        Ok(Some(outcome))
    }

    fn next_request(&self, now_ms: u32) -> Option<PublishRequest> {
        // Dequeue first: the edge is consumed whatever the gate decides,
        // and in periodic-only mode a stray edge from a cloned handle is
        // cleared here too.
        let edge = self.edge.take();
        let source = if edge && self.config.trigger_mode.edge() {
            TriggerKind::EdgeEvent
        } else if self.check_periodic_trigger(now_ms) {
            TriggerKind::Timer
        } else {
            if edge {
                debug!("publish: edge ignored in periodic-only mode");
            }
            return None;
        };
        Some(PublishRequest {
            triggered_at: now_ms,
            source,
        })
    }

    fn evaluate(
        &mut self,
        request: &PublishRequest,
        transport: &mut impl Transport,
    ) -> Result<(PublishOutcome, Option<bool>)> {
        match self.gate.evaluate(&mut self.state, request, transport)? {
            GateDecision::Reject(outcome) => Ok((outcome, None)),
            GateDecision::Proceed => {
                let (outcome, ok) = self.attempt(request, transport)?;
                Ok((outcome, Some(ok)))
            }
        }
    }

    fn attempt(
        &mut self,
        request: &PublishRequest,
        transport: &mut impl Transport,
    ) -> Result<(PublishOutcome, bool)> {
        // Stamp before sending so a long ack wait doesn't stretch the interval.
        self.state.stamp(request.triggered_at);
        debug!(
            "publish: sending '{}' ({:?}, {:?})",
            self.message.event_name, request.source, self.message.ack_mode
        );

        let ok = transport.send(&self.message).inspect_err(|e| {
            warn!("publish: transport fault on '{}': {}", self.message.event_name, e);
        })?;

        let outcome = match self.message.ack_mode {
            AckMode::NoAck | AckMode::FireAndForget => PublishOutcome::Sent,
            AckMode::WaitForAck if ok => PublishOutcome::SentConfirmed,
            AckMode::WaitForAck => PublishOutcome::SentUnconfirmed,
        };
        Ok((outcome, ok))
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> &PublisherState {
        &self.state
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    pub fn message(&self) -> &PublishMessage {
        &self.message
    }

    /// Whether an edge request is waiting for the next poll.
    pub fn is_pending(&self) -> bool {
        self.edge.is_pending()
    }
}
