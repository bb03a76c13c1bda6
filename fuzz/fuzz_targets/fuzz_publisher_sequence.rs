//! Fuzz target: `PublisherService::poll`
//!
//! Interprets the input as a script of edge fires, link flips, ack flips
//! and clock advances, and checks the core's laws after every poll:
//! at most one outcome per poll, no attempt closer than the interval,
//! and no pending edge left behind by an evaluation.
//!
//! cargo fuzz run fuzz_publisher_sequence

#![no_main]

use cloudpub::app::events::{PublishOutcome, PublishReport};
use cloudpub::app::ports::{Observer, Transport};
use cloudpub::app::request::PublishMessage;
use cloudpub::app::service::PublisherService;
use cloudpub::config::{AckMode, PublisherConfig, StampPolicy, TriggerMode};
use cloudpub::error::TransportError;
use libfuzzer_sys::fuzz_target;

struct Link {
    connected: bool,
    ack: bool,
}

impl Transport for Link {
    fn is_connected(&self) -> Result<bool, TransportError> {
        Ok(self.connected)
    }
    fn send(&mut self, _message: &PublishMessage) -> Result<bool, TransportError> {
        Ok(self.ack)
    }
}

#[derive(Default)]
struct Last(Option<PublishReport>, u32);

impl Observer for Last {
    fn report(&mut self, report: &PublishReport) {
        self.0 = Some(*report);
        self.1 += 1;
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&head, script)) = data.split_first() else {
        return;
    };

    let trigger_mode = match head & 0x03 {
        0 => TriggerMode::Periodic,
        1 => TriggerMode::Edge,
        _ => TriggerMode::Both,
    };
    let ack_mode = match (head >> 2) & 0x03 {
        0 => AckMode::NoAck,
        1 => AckMode::FireAndForget,
        _ => AckMode::WaitForAck,
    };
    let stamp_policy = if head & 0x10 == 0 {
        StampPolicy::OnAttempt
    } else {
        StampPolicy::OnEvaluation
    };
    let min_interval_ms = u32::from(head >> 5) * 250 + 1;

    let cfg = PublisherConfig {
        trigger_mode,
        ack_mode,
        stamp_policy,
        min_interval_ms,
        first_publish_delay_ms: 0,
        ..PublisherConfig::default()
    };
    let Ok(mut svc) = PublisherService::new(cfg) else {
        return;
    };

    let mut link = Link {
        connected: true,
        ack: true,
    };
    let mut obs = Last::default();
    let mut now: u32 = 0;
    let mut last_attempt: Option<u32> = None;

    for &op in script {
        match op & 0x03 {
            0 => svc.on_edge_trigger(),
            1 => link.connected = !link.connected,
            2 => link.ack = !link.ack,
            _ => now = now.wrapping_add(u32::from(op >> 2) * 40),
        }

        let before = obs.1;
        let outcome = svc.poll(now, &mut link, &mut obs).unwrap();
        assert!(obs.1 - before <= 1);
        assert!(!svc.is_pending());

        if let Some(outcome) = outcome {
            if outcome.attempted() {
                if let Some(prev) = last_attempt {
                    assert!(now.wrapping_sub(prev) >= min_interval_ms);
                }
                last_attempt = Some(now);
            }
            if ack_mode != AckMode::WaitForAck {
                assert!(!matches!(
                    outcome,
                    PublishOutcome::SentConfirmed | PublishOutcome::SentUnconfirmed
                ));
            }
        }
    }
});
