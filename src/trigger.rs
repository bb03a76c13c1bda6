//! Interrupt-safe edge trigger.
//!
//! Edges are produced by:
//! - GPIO ISRs (button falling edge)
//! - Other tasks or threads (software triggers)
//!
//! and consumed by the publish loop, which evaluates at most one
//! request per edge source per iteration.
//!
//! ```text
//! ┌─────────────┐  fire()   ┌──────────────┐  take()   ┌──────────────┐
//! │ GPIO ISR    │─────────▶│ pending flag │─────────▶│  Main Loop   │
//! │ Software    │─────────▶│ (AtomicBool) │          │  (consumer)  │
//! └─────────────┘           └──────────────┘           └──────────────┘
//! ```
//!
//! The flag is the only state shared with the asynchronous context. It
//! is set with a single atomic store and consumed with a single atomic
//! swap, so repeated edges before consumption coalesce into one request.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable handle to one edge source's pending flag.
///
/// The allocation happens once, when the publisher is built; `fire` never
/// allocates, blocks, or performs I/O.
#[derive(Debug, Clone, Default)]
pub struct EdgeTrigger {
    pending: Arc<AtomicBool>,
}

impl EdgeTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a request pending. Safe from interrupt context.
    /// A no-op if a request is already pending.
    #[inline]
    pub fn fire(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Read and clear the flag in one step. Returns `true` if a
    /// request was pending.
    #[inline]
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Peek without consuming.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
