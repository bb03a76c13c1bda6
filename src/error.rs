//! Unified error types for the CloudPub firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! publish loop handles faults uniformly. All variants are `Copy`.
//!
//! Gate rejections are *not* errors; they are reported as
//! [`PublishOutcome`](crate::app::events::PublishOutcome) values.

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The cloud transport faulted (as opposed to reporting `false`).
    Transport(TransportError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Peripheral or service initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Transport faults
// ---------------------------------------------------------------------------

/// Faults raised by a [`Transport`](crate::app::ports::Transport).
///
/// A send that completes but is not acknowledged is `Ok(false)`, not one
/// of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The transport was used before its client was started.
    NotInitialised,
    /// The message exceeds what the transport can frame.
    MessageTooLarge,
    /// Platform I/O error (ESP-IDF `esp_err_t` on device).
    Io(i32),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialised => write!(f, "transport not initialised"),
            Self::MessageTooLarge => write!(f, "message too large"),
            Self::Io(code) => write!(f, "I/O error (rc={code})"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
