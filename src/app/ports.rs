//! Port traits: the hexagonal boundary between the publish policy and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PublisherService (domain)
//! ```
//!
//! Driven adapters (cloud transport, observers, trigger hardware, config
//! storage) implement these traits. The
//! [`PublisherService`](super::service::PublisherService) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::config::SystemConfig;
use crate::error::TransportError;
use crate::trigger::EdgeTrigger;

use super::events::PublishReport;
use super::request::PublishMessage;

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain → cloud)
// ───────────────────────────────────────────────────────────────

/// The cloud connection. The only I/O the publisher performs.
///
/// Implementations own connection management, framing, and timeouts.
/// A `WaitForAck` send MUST return within a bounded time; the publisher
/// has no way to abort it.
pub trait Transport {
    /// Current link state. Queried fresh on every gate evaluation.
    fn is_connected(&self) -> Result<bool, TransportError>;

    /// Send one event using `message.ack_mode`.
    ///
    /// `Ok(false)` means the attempt completed without confirmation
    /// (or, for non-ack modes, was not accepted). `Err` is a fault and is
    /// propagated to the caller of the evaluation step.
    fn send(&mut self, message: &PublishMessage) -> Result<bool, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Observer port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// Receives every publish outcome. Fire-and-forget: must not block and
/// cannot fail back into the publisher.
pub trait Observer {
    fn report(&mut self, report: &PublishReport);
}

/// Fan out to two observers, left first.
impl<A: Observer, B: Observer> Observer for (A, B) {
    fn report(&mut self, report: &PublishReport) {
        self.0.report(report);
        self.1.report(report);
    }
}

// ───────────────────────────────────────────────────────────────
// Trigger source (driving adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Something that raises asynchronous edges (a button, a software signal).
///
/// The publisher subscribes exactly once at construction; the source
/// calls [`EdgeTrigger::fire`] from whatever context its edges arrive in.
pub trait TriggerSource {
    fn subscribe(&mut self, handler: EdgeTrigger);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock. Wraps at `u32::MAX`; consumers use
/// wrapping arithmetic.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting. Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
