//! System configuration parameters
//!
//! All tunable parameters for the CloudPub publisher.
//! Values can be overridden via NVS (non-volatile storage) or a JSON
//! provisioning blob.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Longest event name the cloud accepts.
pub const MAX_EVENT_NAME_LEN: usize = 64;
/// Largest event payload the cloud accepts, in bytes.
pub const MAX_PAYLOAD_LEN: usize = 622;

/// Extra watchdog headroom on top of the longest blocking ack wait.
pub const WATCHDOG_MARGIN_MS: u32 = 5_000;

// ───────────────────────────────────────────────────────────────
// Policy enums
// ───────────────────────────────────────────────────────────────

/// Who may see a published event. Passed through to the transport untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Private,
    Public,
}

/// How a publish attempt treats delivery confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckMode {
    /// Best-effort delivery, nothing is confirmed.
    NoAck,
    /// Confirmed delivery at the transport, but the caller does not wait.
    FireAndForget,
    /// Block until the far end acknowledges or the transport times out.
    WaitForAck,
}

/// Which trigger sources can raise a publish request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerMode {
    Periodic,
    Edge,
    Both,
}

impl TriggerMode {
    pub fn periodic(self) -> bool {
        matches!(self, Self::Periodic | Self::Both)
    }

    pub fn edge(self) -> bool {
        matches!(self, Self::Edge | Self::Both)
    }
}

/// When `last_publish_at` advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StampPolicy {
    /// Only when a send is actually attempted.
    OnAttempt,
    /// Also when the connectivity gate rejects the request, so a
    /// disconnected periodic publisher retries once per interval.
    OnEvaluation,
}

/// Whether the gate consults transport connectivity before sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityPolicy {
    Required,
    /// Attempt regardless and let the transport report failure.
    Bypass,
}

// ───────────────────────────────────────────────────────────────
// Config structs
// ───────────────────────────────────────────────────────────────

/// Publish policy owned by the publisher core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Event name, fixed per deployment
    pub event_name: heapless::String<MAX_EVENT_NAME_LEN>,
    /// Event data, fixed per deployment
    pub payload: heapless::String<MAX_PAYLOAD_LEN>,
    pub visibility: Visibility,
    pub ack_mode: AckMode,
    pub trigger_mode: TriggerMode,
    /// Minimum spacing between publish attempts (milliseconds)
    pub min_interval_ms: u32,
    /// Delay before the first periodic attempt after boot (milliseconds)
    pub first_publish_delay_ms: u32,
    pub stamp_policy: StampPolicy,
    pub connectivity: ConnectivityPolicy,
}

/// Cloud transport parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    /// MQTT broker URL (`mqtt://` or `mqtts://`)
    pub broker_url: heapless::String<96>,
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,
    /// First topic segment for published events
    pub topic_prefix: heapless::String<32>,
    /// Upper bound on a `WaitForAck` wait (milliseconds)
    pub ack_timeout_ms: u32,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub publisher: PublisherConfig,
    pub cloud: CloudConfig,
    /// Button edge debounce window (milliseconds)
    pub button_debounce_ms: u32,
    /// Main loop polling interval (milliseconds)
    pub poll_interval_ms: u32,
}

fn fixed<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            event_name: fixed("testEvent"),
            payload: fixed("x"),
            visibility: Visibility::Private,
            ack_mode: AckMode::WaitForAck,
            trigger_mode: TriggerMode::Periodic,
            min_interval_ms: 60_000,       // 1/min
            first_publish_delay_ms: 8_000, // let the link come up first
            stamp_policy: StampPolicy::OnAttempt,
            connectivity: ConnectivityPolicy::Required,
        }
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            broker_url: fixed("mqtt://broker.local:1883"),
            wifi_ssid: heapless::String::new(),
            wifi_password: heapless::String::new(),
            topic_prefix: fixed("cloudpub"),
            ack_timeout_ms: 20_000,
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            publisher: PublisherConfig::default(),
            cloud: CloudConfig::default(),
            button_debounce_ms: 50,
            poll_interval_ms: 10, // 100 Hz
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_valid_event_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| (0x21..=0x7E).contains(&b))
}

impl PublisherConfig {
    /// Reject out-of-range policy values. Nothing is clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_event_name(&self.event_name) {
            return Err(ConfigError::ValidationFailed(
                "event_name must be 1-64 printable ASCII without spaces",
            ));
        }
        if self.trigger_mode.periodic() && self.min_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "min_interval_ms must be > 0 for periodic triggers",
            ));
        }
        // The first due time is derived by wrapping `delay - interval`.
        if self.min_interval_ms > 0 && self.first_publish_delay_ms > self.min_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "first_publish_delay_ms must not exceed min_interval_ms",
            ));
        }
        Ok(())
    }
}

impl CloudConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.broker_url.starts_with("mqtt://") || self.broker_url.starts_with("mqtts://")) {
            return Err(ConfigError::ValidationFailed(
                "broker_url must start with mqtt:// or mqtts://",
            ));
        }
        if self.topic_prefix.is_empty() || self.topic_prefix.contains(['#', '+', '/']) {
            return Err(ConfigError::ValidationFailed(
                "topic_prefix must be a single non-wildcard topic level",
            ));
        }
        if !self.wifi_password.is_empty() && self.wifi_password.len() < 8 {
            return Err(ConfigError::ValidationFailed(
                "wifi_password must be empty or 8-64 bytes",
            ));
        }
        if !(1_000..=120_000).contains(&self.ack_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "ack_timeout_ms must be within 1000..=120000",
            ));
        }
        Ok(())
    }
}

impl SystemConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.publisher.validate()?;
        self.cloud.validate()?;
        if self.button_debounce_ms > 1_000 {
            return Err(ConfigError::ValidationFailed(
                "button_debounce_ms must be <= 1000",
            ));
        }
        if !(1..=1_000).contains(&self.poll_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "poll_interval_ms must be within 1..=1000",
            ));
        }
        Ok(())
    }

    /// Task watchdog timeout that survives the longest blocking ack wait.
    pub fn watchdog_timeout_ms(&self) -> u32 {
        self.cloud.ack_timeout_ms.saturating_add(WATCHDOG_MARGIN_MS)
    }

    /// Parse a JSON provisioning blob and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
