//! ISR-debounced push button used as the edge trigger source.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up. The GPIO fires on the
//! falling edge; the ISR runs [`EdgeDebouncer::accept`] (lock-free) and,
//! when the edge survives, fires the subscribed [`EdgeTrigger`]. The
//! publish loop consumes the trigger on its next poll.
//!
//! ```text
//!  GPIO ─┐ NegEdge ISR             main loop
//!        └─▶ debounce ─▶ trigger.fire()  ···  service.poll()
//! ```
//!
//! A press storm between two polls collapses into a single request.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use log::{info, warn};

use crate::app::ports::TriggerSource;
use crate::trigger::EdgeTrigger;

/// Rejects edges that arrive within `window_ms` of the last accepted one.
pub struct EdgeDebouncer {
    window_ms: u32,
    last_edge_ms: AtomicU32,
    seen: AtomicBool,
}

impl EdgeDebouncer {
    pub const fn new(window_ms: u32) -> Self {
        Self {
            window_ms,
            last_edge_ms: AtomicU32::new(0),
            seen: AtomicBool::new(false),
        }
    }

    /// Returns `true` if the edge at `now_ms` is a genuine press.
    /// Single producer (the ISR), so load/store is enough.
    pub fn accept(&self, now_ms: u32) -> bool {
        if self.seen.load(Ordering::Acquire) {
            let last = self.last_edge_ms.load(Ordering::Acquire);
            if now_ms.wrapping_sub(last) < self.window_ms {
                return false;
            }
        }
        self.last_edge_ms.store(now_ms, Ordering::Release);
        self.seen.store(true, Ordering::Release);
        true
    }
}

struct Shared {
    debouncer: EdgeDebouncer,
    trigger: OnceLock<EdgeTrigger>,
    accepted: AtomicU32,
}

impl Shared {
    fn on_falling_edge(&self, now_ms: u32) {
        if !self.debouncer.accept(now_ms) {
            return;
        }
        self.accepted.fetch_add(1, Ordering::Relaxed);
        if let Some(trigger) = self.trigger.get() {
            trigger.fire();
        }
    }
}

pub struct ButtonDriver {
    shared: Arc<Shared>,
    #[cfg(target_os = "espidf")]
    pin: esp_idf_svc::hal::gpio::PinDriver<
        'static,
        esp_idf_svc::hal::gpio::AnyIOPin,
        esp_idf_svc::hal::gpio::Input,
    >,
}

impl ButtonDriver {
    /// Simulation button with no GPIO behind it; drive it with
    /// [`ButtonDriver::on_falling_edge`].
    #[cfg(not(target_os = "espidf"))]
    pub fn new(debounce_ms: u32) -> Self {
        info!("Button(sim): debounce {}ms", debounce_ms);
        Self {
            shared: Self::shared(debounce_ms),
        }
    }

    fn shared(debounce_ms: u32) -> Arc<Shared> {
        Arc::new(Shared {
            debouncer: EdgeDebouncer::new(debounce_ms),
            trigger: OnceLock::new(),
            accepted: AtomicU32::new(0),
        })
    }

    /// Feed a falling edge observed at `now_ms`. Called from the ISR on
    /// device; tests and the simulator call it directly.
    pub fn on_falling_edge(&self, now_ms: u32) {
        self.shared.on_falling_edge(now_ms);
    }

    /// Edges that passed the debounce since boot.
    pub fn accepted_edges(&self) -> u32 {
        self.shared.accepted.load(Ordering::Relaxed)
    }
}

#[cfg(target_os = "espidf")]
impl ButtonDriver {
    /// Attach to `pin`: pull-up input, falling-edge interrupt.
    pub fn attach(
        pin: esp_idf_svc::hal::gpio::AnyIOPin,
        debounce_ms: u32,
    ) -> crate::error::Result<Self> {
        use crate::error::Error;
        use esp_idf_svc::hal::gpio::{InterruptType, PinDriver, Pull};

        let mut driver = PinDriver::input(pin).map_err(|_| Error::Init("button gpio"))?;
        driver
            .set_pull(Pull::Up)
            .map_err(|_| Error::Init("button pull-up"))?;
        driver
            .set_interrupt_type(InterruptType::NegEdge)
            .map_err(|_| Error::Init("button interrupt type"))?;

        let shared = Self::shared(debounce_ms);
        let isr_shared = shared.clone();
        // SAFETY: the closure only touches atomics and an initialised
        // OnceLock, both safe in interrupt context.
        unsafe {
            driver
                .subscribe(move || {
                    let now_ms = (crate::adapters::time::uptime_us() / 1000) as u32;
                    isr_shared.on_falling_edge(now_ms);
                })
                .map_err(|_| Error::Init("button isr"))?;
        }
        driver
            .enable_interrupt()
            .map_err(|_| Error::Init("button interrupt enable"))?;

        info!(
            "Button: GPIO{} attached, debounce {}ms",
            crate::pins::BUTTON_GPIO,
            debounce_ms
        );
        Ok(Self { shared, pin: driver })
    }

    /// ESP-IDF disables a GPIO interrupt after it fires; re-enable it once
    /// per loop iteration.
    pub fn rearm(&mut self) {
        if let Err(e) = self.pin.enable_interrupt() {
            warn!("Button: re-arm failed ({})", e);
        }
    }
}

impl TriggerSource for ButtonDriver {
    fn subscribe(&mut self, trigger: EdgeTrigger) {
        if self.shared.trigger.set(trigger).is_err() {
            warn!("Button: already subscribed, ignoring second subscription");
        }
    }
}
