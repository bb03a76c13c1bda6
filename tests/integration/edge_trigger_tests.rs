//! Integration tests: edges raised from other threads coalesce into at
//! most one request per poll.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::mock_transport::{MockTransport, RecordingObserver};
use cloudpub::app::events::PublishOutcome;
use cloudpub::app::service::PublisherService;
use cloudpub::config::{AckMode, PublisherConfig, TriggerMode};

fn edge_service() -> PublisherService {
    PublisherService::new(PublisherConfig {
        trigger_mode: TriggerMode::Edge,
        min_interval_ms: 0,
        first_publish_delay_ms: 0,
        ack_mode: AckMode::NoAck,
        ..PublisherConfig::default()
    })
    .unwrap()
}

#[test]
fn edge_storm_from_many_threads_is_one_request() {
    let mut svc = edge_service();
    let mut link = MockTransport::online();
    let mut obs = RecordingObserver::new();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let trigger = svc.edge_trigger();
            thread::spawn(move || {
                for _ in 0..1_000 {
                    trigger.fire();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(svc.poll(0, &mut link, &mut obs).unwrap(), Some(PublishOutcome::Sent));
    assert_eq!(svc.poll(1, &mut link, &mut obs).unwrap(), None);
    assert_eq!(link.sends(), 1);
}

#[test]
fn concurrent_firing_never_yields_more_than_one_outcome_per_poll() {
    let mut svc = edge_service();
    let mut link = MockTransport::online();
    let mut obs = RecordingObserver::new();

    let stop = Arc::new(AtomicBool::new(false));
    let trigger = svc.edge_trigger();
    let stop_flag = stop.clone();
    let firer = thread::spawn(move || {
        let mut fired = 0u64;
        while !stop_flag.load(Ordering::Acquire) {
            trigger.fire();
            fired += 1;
            thread::yield_now();
        }
        fired
    });

    let polls = 2_000u32;
    for t in 0..polls {
        svc.poll(t, &mut link, &mut obs).unwrap();
    }
    stop.store(true, Ordering::Release);
    let fired = firer.join().unwrap();

    assert!(obs.reports.len() <= polls as usize);
    assert!(obs.reports.len() as u64 <= fired);
    assert_eq!(obs.reports.len(), link.sends());
}

#[test]
fn third_edge_after_evaluation_is_a_new_request() {
    let mut svc = edge_service();
    let mut link = MockTransport::online();
    let mut obs = RecordingObserver::new();

    svc.on_edge_trigger();
    svc.on_edge_trigger();
    svc.poll(10, &mut link, &mut obs).unwrap();
    assert!(!svc.is_pending());

    svc.on_edge_trigger();
    assert!(svc.is_pending());
    svc.poll(20, &mut link, &mut obs).unwrap();

    let times: Vec<u32> = obs.reports.iter().map(|r| r.at_ms).collect();
    assert_eq!(times, vec![10, 20]);
}

#[test]
fn edge_raised_while_offline_is_dropped_not_requeued() {
    let mut svc = edge_service();
    let mut link = MockTransport::offline();
    let mut obs = RecordingObserver::new();

    svc.edge_trigger().fire();
    assert_eq!(
        svc.poll(0, &mut link, &mut obs).unwrap(),
        Some(PublishOutcome::SkippedNotConnected)
    );

    link.connected = true;
    assert_eq!(svc.poll(1, &mut link, &mut obs).unwrap(), None);
    assert_eq!(link.sends(), 0);
}
