//! Application core: pure publish policy, zero I/O.
//!
//! This module contains the decision rules for the publisher: trigger
//! intake, connectivity gating, publish attempts, and outcome reporting.
//! All interaction with the network and hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod gate;
pub mod ports;
pub mod request;
pub mod service;
