//! `critical-section` 1.x provider for ESP-IDF builds.
//!
//! `embassy-sync`'s `CriticalSectionRawMutex` guards the report queue
//! with these symbols. The section is a process-wide mutex held for the
//! outermost acquire on each thread; nested acquires only bump a depth
//! counter. Host builds get the `std` implementation from the
//! `critical-section` crate instead.

use core::cell::{Cell, RefCell};
use std::sync::{Mutex, MutexGuard, PoisonError};

static SECTION: Mutex<()> = Mutex::new(());

thread_local! {
    static DEPTH: Cell<u8> = const { Cell::new(0) };
    static GUARD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            // A poisoned section only means a panicking holder; the data
            // it guards is `()`.
            let lock = SECTION.lock().unwrap_or_else(PoisonError::into_inner);
            GUARD.with(|guard| *guard.borrow_mut() = Some(lock));
        }
        let d = d.saturating_add(1);
        depth.set(d);
        d
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            return;
        }
        depth.set(d - 1);
        if d == 1 {
            GUARD.with(|guard| *guard.borrow_mut() = None);
        }
    });
}
