//! Board drivers: the edge-trigger button and the task watchdog.

pub mod button;
pub mod watchdog;
