//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements   | Connects to                  |
//! |----------------|--------------|------------------------------|
//! | `cloud`        | Transport    | MQTT broker / loopback       |
//! | `device_id`    | (none)       | eFuse MAC                    |
//! | `log_sink`     | Observer     | Serial log output            |
//! | `nvs`          | ConfigPort   | NVS / in-memory store        |
//! | `report_queue` | Observer     | `embassy-sync` channel       |
//! | `time`         | Clock        | ESP32 system timer           |
//! | `wifi`         | (none)       | ESP-IDF WiFi STA supervision |

pub mod cloud;
pub mod device_id;
pub mod log_sink;
pub mod nvs;
pub mod report_queue;
pub mod time;
pub mod wifi;
