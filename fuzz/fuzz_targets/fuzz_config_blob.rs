//! Fuzz target: stored config decoding.
//!
//! Arbitrary bytes written as the NVS config blob must either load as a
//! valid configuration or be reported as corrupted, never panic.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use cloudpub::adapters::nvs::NvsAdapter;
use cloudpub::app::ports::{ConfigError, ConfigPort};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(nvs) = NvsAdapter::new() else {
        return;
    };
    nvs.write_raw(data);
    match nvs.load() {
        Ok(cfg) => assert!(cfg.validate().is_ok()),
        Err(e) => assert_eq!(e, ConfigError::Corrupted),
    }

    if let Ok(text) = core::str::from_utf8(data) {
        let _ = cloudpub::config::SystemConfig::from_json(text);
    }
});
