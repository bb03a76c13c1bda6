//! Device identity derived from the ESP32 factory MAC address.
//!
//! The ID `cp-xxyyzz` (last 3 MAC bytes, lowercase hex) is stable across
//! reboots and doubles as the MQTT client id and the private topic level.

use core::fmt::Write;

pub type DeviceId = heapless::String<16>;

pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: the buffer is exactly the 6 bytes the call writes.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

pub fn device_id(mac: &MacAddress) -> DeviceId {
    let mut id = DeviceId::new();
    let _ = write!(id, "cp-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    id
}
