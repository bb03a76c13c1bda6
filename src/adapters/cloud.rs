//! Cloud transport adapters.
//!
//! Implement [`Transport`], the hexagonal boundary to the cloud.
//!
//! | Adapter               | Target | Backend                         |
//! |-----------------------|--------|---------------------------------|
//! | `LoopbackTransport`   | all    | in-memory, for host tests / sim |
//! | `MqttCloudTransport`  | espidf | `esp-idf-svc` MQTT client       |
//!
//! ## Ack mapping (MQTT)
//!
//! | AckMode         | QoS | Wait for PUBACK |
//! |-----------------|-----|-----------------|
//! | `NoAck`         | 0   | no              |
//! | `FireAndForget` | 1   | no              |
//! | `WaitForAck`    | 1   | up to `ack_timeout_ms` |

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::app::ports::Transport;
use crate::app::request::PublishMessage;
use crate::config::Visibility;
use crate::error::TransportError;

/// Longest topic the adapters build.
pub const MAX_TOPIC_LEN: usize = 160;

/// Longest device id accepted in a private topic.
pub const MAX_DEVICE_ID_LEN: usize = 32;

/// Copy `device_id` into a fixed buffer. Too long is an error, never a
/// truncation, so two devices cannot collapse onto one topic.
pub fn bounded_device_id(
    device_id: &str,
) -> Result<heapless::String<MAX_DEVICE_ID_LEN>, TransportError> {
    heapless::String::try_from(device_id).map_err(|_| TransportError::MessageTooLarge)
}

/// Topic for `message`: `<prefix>/<device>/<event>` when private,
/// `<prefix>/public/<event>` when public.
pub fn topic_for(
    prefix: &str,
    device_id: &str,
    message: &PublishMessage,
) -> Result<heapless::String<MAX_TOPIC_LEN>, TransportError> {
    let middle = match message.visibility {
        Visibility::Private => device_id,
        Visibility::Public => "public",
    };
    let mut topic = heapless::String::new();
    for part in [prefix, "/", middle, "/", message.event_name.as_str()] {
        topic
            .push_str(part)
            .map_err(|_| TransportError::MessageTooLarge)?;
    }
    Ok(topic)
}

// ───────────────────────────────────────────────────────────────
// Loopback transport
// ───────────────────────────────────────────────────────────────

/// Cloneable link switch, so another thread can drop or restore the link.
#[derive(Debug, Clone, Default)]
pub struct LinkSwitch(Arc<AtomicBool>);

impl LinkSwitch {
    pub fn set(&self, connected: bool) {
        self.0.store(connected, Ordering::Release);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// In-memory transport that records every message it is asked to send.
pub struct LoopbackTransport {
    link: LinkSwitch,
    ack: bool,
    sent: heapless::Deque<PublishMessage, 16>,
    total_sent: u32,
}

impl LoopbackTransport {
    pub fn new(connected: bool, ack: bool) -> Self {
        let link = LinkSwitch::default();
        link.set(connected);
        Self {
            link,
            ack,
            sent: heapless::Deque::new(),
            total_sent: 0,
        }
    }

    pub fn link(&self) -> LinkSwitch {
        self.link.clone()
    }

    /// Result every subsequent send reports.
    pub fn set_ack(&mut self, ack: bool) {
        self.ack = ack;
    }

    /// Most recent messages, oldest first (bounded history).
    pub fn sent(&self) -> impl Iterator<Item = &PublishMessage> {
        self.sent.iter()
    }

    pub fn total_sent(&self) -> u32 {
        self.total_sent
    }
}

impl Transport for LoopbackTransport {
    fn is_connected(&self) -> Result<bool, TransportError> {
        Ok(self.link.get())
    }

    fn send(&mut self, message: &PublishMessage) -> Result<bool, TransportError> {
        if self.sent.is_full() {
            self.sent.pop_front();
        }
        let _ = self.sent.push_back(message.clone());
        self.total_sent = self.total_sent.wrapping_add(1);
        // A loopback send while offline behaves like a lost packet.
        Ok(self.ack && self.link.get())
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF MQTT transport
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::MqttCloudTransport;

#[cfg(target_os = "espidf")]
mod esp {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::{Duration, Instant};

    use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
    use log::{info, warn};

    use super::topic_for;
    use crate::app::ports::Transport;
    use crate::app::request::PublishMessage;
    use crate::config::{AckMode, CloudConfig};
    use crate::error::TransportError;

    const ACK_POLL: Duration = Duration::from_millis(10);

    #[derive(Default)]
    struct LinkState {
        connected: AtomicBool,
        last_acked: AtomicU32,
    }

    pub struct MqttCloudTransport {
        client: EspMqttClient<'static>,
        link: Arc<LinkState>,
        prefix: heapless::String<32>,
        device_id: heapless::String<MAX_DEVICE_ID_LEN>,
        ack_timeout: Duration,
    }

    impl MqttCloudTransport {
        pub fn start(cloud: &CloudConfig, device_id: &str) -> Result<Self, TransportError> {
            let id = bounded_device_id(device_id)?;
            let link = Arc::new(LinkState::default());
            let cb_link = link.clone();

            let conf = MqttClientConfiguration {
                client_id: Some(device_id),
                ..Default::default()
            };

            let client = EspMqttClient::new_cb(&cloud.broker_url, &conf, move |event| {
                match event.payload() {
                    EventPayload::Connected(_) => {
                        cb_link.connected.store(true, Ordering::Release);
                    }
                    EventPayload::Disconnected => {
                        cb_link.connected.store(false, Ordering::Release);
                    }
                    EventPayload::Published(id) => {
                        cb_link.last_acked.store(id, Ordering::Release);
                    }
                    _ => {}
                }
            })
            .map_err(|e| TransportError::Io(e.code()))?;

            info!("MqttCloudTransport: client started for {}", cloud.broker_url);

            Ok(Self {
                client,
                link,
                prefix: cloud.topic_prefix.clone(),
                device_id: id,
                ack_timeout: Duration::from_millis(cloud.ack_timeout_ms as u64),
            })
        }

        fn wait_for_ack(&self, msg_id: u32) -> bool {
            let started = Instant::now();
            while started.elapsed() < self.ack_timeout {
                if self.link.last_acked.load(Ordering::Acquire) == msg_id {
                    return true;
                }
                if !self.link.connected.load(Ordering::Acquire) {
                    warn!("MqttCloudTransport: link lost while waiting for ack {}", msg_id);
                    return false;
                }
                std::thread::sleep(ACK_POLL);
            }
            warn!(
                "MqttCloudTransport: no ack for {} within {}ms",
                msg_id,
                self.ack_timeout.as_millis()
            );
            false
        }
    }

    impl Transport for MqttCloudTransport {
        fn is_connected(&self) -> Result<bool, TransportError> {
            Ok(self.link.connected.load(Ordering::Acquire))
        }

        fn send(&mut self, message: &PublishMessage) -> Result<bool, TransportError> {
            let topic = topic_for(&self.prefix, &self.device_id, message)?;
            let payload = message.payload.as_slice();

            match message.ack_mode {
                AckMode::NoAck => match self.client.enqueue(&topic, QoS::AtMostOnce, false, payload) {
                    Ok(_) => Ok(true),
                    Err(e) => {
                        warn!("MqttCloudTransport: enqueue failed ({})", e);
                        Ok(false)
                    }
                },
                AckMode::FireAndForget => {
                    match self.client.enqueue(&topic, QoS::AtLeastOnce, false, payload) {
                        Ok(_) => Ok(true),
                        Err(e) => {
                            warn!("MqttCloudTransport: enqueue failed ({})", e);
                            Ok(false)
                        }
                    }
                }
                AckMode::WaitForAck => {
                    match self.client.publish(&topic, QoS::AtLeastOnce, false, payload) {
                        Ok(msg_id) => Ok(self.wait_for_ack(msg_id)),
                        Err(e) => {
                            warn!("MqttCloudTransport: publish failed ({})", e);
                            Ok(false)
                        }
                    }
                }
            }
        }
    }
}
