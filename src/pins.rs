//! GPIO assignments for the publisher board.
//!
//! Single source of truth; `main` wires the peripheral with the same
//! number it logs here.

/// Active-low push button (BOOT button on most ESP32-S3 dev kits).
/// Falling edge requests a publish.
pub const BUTTON_GPIO: i32 = 0;
