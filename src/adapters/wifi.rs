//! WiFi station-mode adapter.
//!
//! The publisher only asks the cloud transport whether it is connected;
//! this adapter keeps the underlying station link alive so that answer
//! eventually turns true again after an outage.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `WifiStation` drives a non-blocking `EspWifi`.
//! - **all targets**: `ReconnectBackoff` and `WifiSupervisor` are pure logic
//!   over the [`StationLink`] seam.
//!
//! ## Reconnection policy
//!
//! `supervise` runs inside the watchdog-fed publish loop, so it never
//! waits on the radio. It only issues a connect request and reads link
//! state on later polls. While the link stays down, requests are spaced
//! by an exponential backoff (2 s, 4 s, 8 s … capped at 60 s).

use log::{info, warn};

const INITIAL_BACKOFF_MS: u32 = 2_000;
const MAX_BACKOFF_MS: u32 = 60_000;

/// Exponential reconnect schedule driven by the main loop's clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectBackoff {
    backoff_ms: u32,
    last_try_at: Option<u32>,
    attempt: u32,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconnectBackoff {
    pub const fn new() -> Self {
        Self {
            backoff_ms: INITIAL_BACKOFF_MS,
            last_try_at: None,
            attempt: 0,
        }
    }

    /// Whether a reconnect attempt may start at `now_ms`.
    pub fn should_retry(&self, now_ms: u32) -> bool {
        match self.last_try_at {
            None => true,
            Some(at) => now_ms.wrapping_sub(at) >= self.backoff_ms,
        }
    }

    /// Record an attempt made at `now_ms`, or a link found up.
    pub fn record(&mut self, now_ms: u32, connected: bool) {
        if connected {
            if self.attempt > 0 {
                info!("WiFi: link restored after {} attempt(s)", self.attempt);
            }
            *self = Self::new();
            return;
        }
        if self.last_try_at.is_some() {
            self.backoff_ms = self.backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
        }
        self.last_try_at = Some(now_ms);
        self.attempt = self.attempt.wrapping_add(1);
        warn!(
            "WiFi: link down, connect attempt {} issued, next in {}ms",
            self.attempt, self.backoff_ms
        );
    }

    pub fn backoff_ms(&self) -> u32 {
        self.backoff_ms
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// The radio operations the supervisor needs. Neither call may block.
pub trait StationLink {
    fn is_up(&self) -> bool;
    /// Ask the driver to start connecting; completion shows up in `is_up`.
    fn begin_connect(&mut self) -> Result<(), i32>;
}

/// Keeps a station link alive on the backoff schedule.
pub struct WifiSupervisor<L: StationLink> {
    link: L,
    backoff: ReconnectBackoff,
}

impl<L: StationLink> WifiSupervisor<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            backoff: ReconnectBackoff::new(),
        }
    }

    pub fn is_up(&self) -> bool {
        self.link.is_up()
    }

    /// Call once per loop iteration. Returns immediately: at most one
    /// connect request is issued per backoff window.
    pub fn supervise(&mut self, now_ms: u32) {
        if self.link.is_up() {
            if self.backoff.attempt() > 0 {
                self.backoff.record(now_ms, true);
            }
            return;
        }
        if !self.backoff.should_retry(now_ms) {
            return;
        }
        if let Err(code) = self.link.begin_connect() {
            warn!("WiFi: connect request rejected ({})", code);
        }
        self.backoff.record(now_ms, false);
    }

    pub fn backoff(&self) -> &ReconnectBackoff {
        &self.backoff
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}

#[cfg(target_os = "espidf")]
pub use esp::{EspStation, WifiStation};

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};
    use log::info;

    use super::{StationLink, WifiSupervisor};
    use crate::config::CloudConfig;
    use crate::error::{Error, Result};

    /// `EspWifi` without the blocking wrapper: `connect` only posts the
    /// request to the driver task.
    pub struct EspStation(EspWifi<'static>);

    impl StationLink for EspStation {
        fn is_up(&self) -> bool {
            self.0.is_up().unwrap_or(false)
        }

        fn begin_connect(&mut self) -> core::result::Result<(), i32> {
            self.0.connect().map_err(|e| e.code())
        }
    }

    pub type WifiStation = WifiSupervisor<EspStation>;

    impl WifiSupervisor<EspStation> {
        /// Configure and start the station, then issue the first connect.
        /// Failure to associate is not fatal, `supervise` keeps retrying.
        pub fn start(
            modem: Modem,
            sysloop: EspSystemEventLoop,
            nvs: Option<EspDefaultNvsPartition>,
            cloud: &CloudConfig,
            now_ms: u32,
        ) -> Result<Self> {
            let mut wifi =
                EspWifi::new(modem, sysloop, nvs).map_err(|_| Error::Init("wifi driver"))?;

            let auth_method = if cloud.wifi_password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            wifi.set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: cloud.wifi_ssid.clone(),
                password: cloud.wifi_password.clone(),
                auth_method,
                ..Default::default()
            }))
            .map_err(|_| Error::Init("wifi configuration"))?;
            wifi.start().map_err(|_| Error::Init("wifi start"))?;
            info!("WiFi: station started, SSID='{}'", cloud.wifi_ssid);

            let mut station = Self::new(EspStation(wifi));
            station.supervise(now_ms);
            Ok(station)
        }
    }
}
