//! Integration tests: PublisherService → Transport → Observer over
//! simulated time.

use crate::mock_transport::{MockTransport, RecordingObserver};
use cloudpub::adapters::cloud::LoopbackTransport;
use cloudpub::adapters::log_sink::LogObserver;
use cloudpub::adapters::report_queue::{self, QueueObserver, ReportChannel, ReportTally};
use cloudpub::adapters::nvs::NvsAdapter;
use cloudpub::app::events::PublishOutcome;
use cloudpub::app::ports::{ConfigPort, TriggerSource};
use cloudpub::app::request::TriggerKind;
use cloudpub::app::service::PublisherService;
use cloudpub::config::{
    AckMode, ConnectivityPolicy, PublisherConfig, StampPolicy, SystemConfig, TriggerMode, Visibility,
};
use cloudpub::drivers::button::ButtonDriver;
use cloudpub::error::{Error, TransportError};
use cloudpub::trigger::EdgeTrigger;
use embassy_sync::channel::Channel;

fn edge_config(ack_mode: AckMode) -> PublisherConfig {
    PublisherConfig {
        trigger_mode: TriggerMode::Edge,
        min_interval_ms: 0,
        first_publish_delay_ms: 0,
        ack_mode,
        ..PublisherConfig::default()
    }
}

/// Run the loop from `from` to `to` (inclusive) every `step` ms.
fn run(
    svc: &mut PublisherService,
    link: &mut MockTransport,
    obs: &mut RecordingObserver,
    from: u32,
    to: u32,
    step: u32,
) {
    let mut t = from;
    while t <= to {
        svc.poll(t, link, obs).unwrap();
        t += step;
    }
}

// ── Periodic schedule ─────────────────────────────────────────

#[test]
fn default_schedule_publishes_once_a_minute_after_boot_delay() {
    let mut svc = PublisherService::new(PublisherConfig::default()).unwrap();
    let mut link = MockTransport::online();
    let mut obs = RecordingObserver::new();

    run(&mut svc, &mut link, &mut obs, 0, 130_000, 500);

    let times: Vec<u32> = obs.reports.iter().map(|r| r.at_ms).collect();
    assert_eq!(times, vec![8_000, 68_000, 128_000]);
    assert!(obs.reports.iter().all(|r| r.outcome == PublishOutcome::SentConfirmed));
    assert!(obs.reports.iter().all(|r| r.source == TriggerKind::Timer));
    assert_eq!(link.sends(), 3);
}

#[test]
fn offline_periodic_retries_every_poll_until_link_returns() {
    let mut svc = PublisherService::new(PublisherConfig::default()).unwrap();
    let mut link = MockTransport::offline();
    let mut obs = RecordingObserver::new();

    run(&mut svc, &mut link, &mut obs, 8_000, 8_300, 100);
    assert_eq!(obs.reports.len(), 4);
    assert!(
        obs.outcomes()
            .iter()
            .all(|o| *o == PublishOutcome::SkippedNotConnected)
    );
    assert_eq!(link.sends(), 0);

    link.connected = true;
    svc.poll(8_400, &mut link, &mut obs).unwrap();
    assert_eq!(obs.last().unwrap().outcome, PublishOutcome::SentConfirmed);
    assert_eq!(svc.state().last_publish_at(), 8_400);
}

#[test]
fn offline_summary_period_loses_no_reports() {
    static CH: ReportChannel = Channel::new();
    let sys = SystemConfig::default();
    let mut svc = PublisherService::new(sys.publisher.clone()).unwrap();
    let mut link = LoopbackTransport::new(false, true);
    let mut observers = (LogObserver::new(), QueueObserver::new(&CH));
    let mut tally = ReportTally::default();

    // One summary period at the firmware's poll cadence, draining each poll.
    let mut t = 8_000u32;
    while t < 68_000 {
        svc.poll(t, &mut link, &mut observers).unwrap();
        report_queue::drain(&CH, |r| tally.record(&r));
        t += sys.poll_interval_ms;
    }

    assert_eq!(observers.1.dropped(), 0);
    assert_eq!(observers.0.reported(), 6_000);
    assert_eq!(
        tally,
        ReportTally {
            sent: 0,
            unconfirmed: 0,
            skipped: 6_000
        }
    );
}

#[test]
fn on_evaluation_policy_spaces_offline_checks() {
    let cfg = PublisherConfig {
        stamp_policy: StampPolicy::OnEvaluation,
        ..PublisherConfig::default()
    };
    let mut svc = PublisherService::new(cfg).unwrap();
    let mut link = MockTransport::offline();
    let mut obs = RecordingObserver::new();

    run(&mut svc, &mut link, &mut obs, 0, 70_000, 1_000);
    let times: Vec<u32> = obs.reports.iter().map(|r| r.at_ms).collect();
    assert_eq!(times, vec![8_000, 68_000]);
}

#[test]
fn unconfirmed_delivery_is_not_retried() {
    let mut svc = PublisherService::new(PublisherConfig::default()).unwrap();
    let mut link = MockTransport::online();
    link.ack = false;
    let mut obs = RecordingObserver::new();

    run(&mut svc, &mut link, &mut obs, 8_000, 67_000, 1_000);
    assert_eq!(obs.outcomes(), vec![PublishOutcome::SentUnconfirmed]);
    assert_eq!(obs.last().unwrap().success, Some(false));
    assert_eq!(link.sends(), 1);
}

// ── Edge requests ─────────────────────────────────────────────

#[test]
fn fire_and_forget_reports_transport_boolean() {
    let mut svc = PublisherService::new(edge_config(AckMode::FireAndForget)).unwrap();
    let mut link = MockTransport::online();
    link.ack = false;
    let mut obs = RecordingObserver::new();

    svc.on_edge_trigger();
    svc.poll(5, &mut link, &mut obs).unwrap();

    let r = obs.last().unwrap();
    assert_eq!(r.outcome, PublishOutcome::Sent);
    assert_eq!(r.success, Some(false));
    assert_eq!(r.ack_mode, AckMode::FireAndForget);
}

#[test]
fn message_carries_configured_event() {
    let mut cfg = edge_config(AckMode::NoAck);
    cfg.visibility = Visibility::Public;
    cfg.event_name = "doorbell".try_into().unwrap();
    cfg.payload = "ring".try_into().unwrap();
    let mut svc = PublisherService::new(cfg).unwrap();
    let mut link = MockTransport::online();
    let mut obs = RecordingObserver::new();

    svc.on_edge_trigger();
    svc.poll(0, &mut link, &mut obs).unwrap();

    let sent = &link.sent[0];
    assert_eq!(sent.event_name.as_str(), "doorbell");
    assert_eq!(sent.payload.as_slice(), b"ring");
    assert_eq!(sent.visibility, Visibility::Public);
    assert_eq!(sent.ack_mode, AckMode::NoAck);
}

#[test]
fn edge_spacing_applies_when_interval_is_set() {
    let cfg = PublisherConfig {
        min_interval_ms: 1_000,
        ..edge_config(AckMode::WaitForAck)
    };
    let mut svc = PublisherService::new(cfg).unwrap();
    let mut link = MockTransport::online();
    let mut obs = RecordingObserver::new();

    for t in [1_000, 1_500, 2_000] {
        svc.on_edge_trigger();
        svc.poll(t, &mut link, &mut obs).unwrap();
    }
    assert_eq!(
        obs.outcomes(),
        vec![
            PublishOutcome::SentConfirmed,
            PublishOutcome::SkippedTooSoon,
            PublishOutcome::SentConfirmed,
        ]
    );
}

#[test]
fn both_mode_prefers_edge_and_shares_the_interval() {
    let cfg = PublisherConfig {
        trigger_mode: TriggerMode::Both,
        first_publish_delay_ms: 0,
        ..PublisherConfig::default()
    };
    let mut svc = PublisherService::new(cfg).unwrap();
    let mut link = MockTransport::online();
    let mut obs = RecordingObserver::new();

    svc.on_edge_trigger();
    assert_eq!(
        svc.poll(0, &mut link, &mut obs).unwrap(),
        Some(PublishOutcome::SentConfirmed)
    );
    assert_eq!(obs.last().unwrap().source, TriggerKind::EdgeEvent);

    // The edge attempt restarted the periodic interval.
    assert_eq!(svc.poll(30_000, &mut link, &mut obs).unwrap(), None);
    assert_eq!(
        svc.poll(60_000, &mut link, &mut obs).unwrap(),
        Some(PublishOutcome::SentConfirmed)
    );
    assert_eq!(obs.last().unwrap().source, TriggerKind::Timer);
}

#[test]
fn bypass_policy_publishes_while_offline() {
    let cfg = PublisherConfig {
        connectivity: ConnectivityPolicy::Bypass,
        ..edge_config(AckMode::WaitForAck)
    };
    let mut svc = PublisherService::new(cfg).unwrap();
    let mut link = MockTransport::offline();
    link.ack = false;
    let mut obs = RecordingObserver::new();

    svc.on_edge_trigger();
    svc.poll(0, &mut link, &mut obs).unwrap();
    assert_eq!(obs.outcomes(), vec![PublishOutcome::SentUnconfirmed]);
    assert_eq!(link.connectivity_checks.get(), 0);
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn transport_fault_propagates_and_consumes_request() {
    let mut svc = PublisherService::new(edge_config(AckMode::WaitForAck)).unwrap();
    let mut link = MockTransport::online();
    link.fault = Some(TransportError::Io(-1));
    let mut obs = RecordingObserver::new();

    svc.on_edge_trigger();
    assert_eq!(
        svc.poll(0, &mut link, &mut obs),
        Err(Error::Transport(TransportError::Io(-1)))
    );
    assert!(!svc.is_pending());
    assert!(obs.reports.is_empty());

    link.fault = None;
    assert_eq!(svc.poll(1, &mut link, &mut obs).unwrap(), None);
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let cfg = PublisherConfig {
        min_interval_ms: 0,
        ..PublisherConfig::default()
    };
    assert!(matches!(PublisherService::new(cfg), Err(Error::Config(_))));
}

// ── Adapters wired together ───────────────────────────────────

#[test]
fn button_press_publishes_over_loopback() {
    let mut button = ButtonDriver::new(50);
    let mut svc =
        PublisherService::with_trigger_source(edge_config(AckMode::WaitForAck), &mut button).unwrap();
    let mut link = LoopbackTransport::new(true, true);
    let mut obs = RecordingObserver::new();

    button.on_falling_edge(100);
    button.on_falling_edge(110); // bounce
    assert_eq!(
        svc.poll(120, &mut link, &mut obs).unwrap(),
        Some(PublishOutcome::SentConfirmed)
    );
    assert_eq!(svc.poll(130, &mut link, &mut obs).unwrap(), None);
    assert_eq!(link.total_sent(), 1);
}

#[test]
fn loopback_link_drop_skips_edge() {
    let mut button = ButtonDriver::new(0);
    let mut svc =
        PublisherService::with_trigger_source(edge_config(AckMode::NoAck), &mut button).unwrap();
    let mut link = LoopbackTransport::new(true, true);
    let switch = link.link();
    let mut obs = RecordingObserver::new();

    switch.set(false);
    button.on_falling_edge(0);
    svc.poll(1, &mut link, &mut obs).unwrap();
    switch.set(true);
    button.on_falling_edge(2);
    svc.poll(3, &mut link, &mut obs).unwrap();

    assert_eq!(
        obs.outcomes(),
        vec![PublishOutcome::SkippedNotConnected, PublishOutcome::Sent]
    );
}

#[test]
fn periodic_only_service_ignores_the_button() {
    struct CountingSource(u32);
    impl TriggerSource for CountingSource {
        fn subscribe(&mut self, _handler: EdgeTrigger) {
            self.0 += 1;
        }
    }

    let mut source = CountingSource(0);
    let _svc = PublisherService::with_trigger_source(PublisherConfig::default(), &mut source)
        .unwrap();
    assert_eq!(source.0, 0);

    let _svc = PublisherService::with_trigger_source(edge_config(AckMode::NoAck), &mut source)
        .unwrap();
    assert_eq!(source.0, 1);
}

#[test]
fn stored_config_drives_the_service() {
    let nvs = NvsAdapter::new().unwrap();
    let mut cfg = SystemConfig::default();
    cfg.publisher = edge_config(AckMode::FireAndForget);
    nvs.save(&cfg).unwrap();

    let loaded = nvs.load().unwrap();
    let mut svc = PublisherService::new(loaded.publisher).unwrap();
    let mut link = MockTransport::online();
    let mut obs = RecordingObserver::new();

    svc.on_edge_trigger();
    assert_eq!(
        svc.poll(0, &mut link, &mut obs).unwrap(),
        Some(PublishOutcome::Sent)
    );
}
