//! NVS (Non-Volatile Storage) config adapter.
//!
//! Implements [`ConfigPort`]: the [`SystemConfig`] is stored as one
//! postcard blob under `cloudpub/syscfg`.
//!
//! - Config validation: every field is range-checked before persistence.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - Host builds keep the blob in memory (dev/test only).

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;
use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "cloudpub";
const CONFIG_KEY: &str = "syscfg";

const MAX_BLOB_SIZE: usize = 2048;

/// A stored blob must be non-empty and fit the read buffer. A bad length
/// is a corrupt record, not a storage fault.
fn check_blob_len(len: usize) -> Result<(), ConfigError> {
    if len == 0 || len > MAX_BLOB_SIZE {
        return Err(ConfigError::Corrupted);
    }
    Ok(())
}

/// Why reading the config blob failed on device.
#[cfg(target_os = "espidf")]
enum ReadError {
    Esp(i32),
    BadLength(usize),
}

#[cfg(target_os = "espidf")]
impl From<i32> for ReadError {
    fn from(code: i32) -> Self {
        Self::Esp(code)
    }
}

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Raw blob access for the simulation backend.
    #[cfg(not(target_os = "espidf"))]
    pub fn write_raw(&self, data: &[u8]) {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        self.store.borrow_mut().insert(key, data.to_vec());
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T, E>(namespace: &str, write: bool, f: F) -> Result<T, E>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, E>,
        E: From<i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = namespace.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret.into());
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob() -> Result<Vec<u8>, ReadError> {
        Self::with_nvs_handle(CONFIG_NAMESPACE, false, |handle| {
            let key_cstr = b"syscfg\0";
            let mut size: usize = 0;

            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_cstr.as_ptr() as *const _,
                    core::ptr::null_mut(),
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ReadError::Esp(ret));
            }
            if check_blob_len(size).is_err() {
                return Err(ReadError::BadLength(size));
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_cstr.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ReadError::Esp(ret));
            }
            Ok(buf)
        })
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(bytes: &[u8]) -> Result<(), i32> {
        Self::with_nvs_handle(CONFIG_NAMESPACE, true, |handle| {
            let key_cstr = b"syscfg\0";
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    key_cstr.as_ptr() as *const _,
                    bytes.as_ptr() as *const _,
                    bytes.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
    }
}

/// Decode a stored blob; anything undecodable or out of range is corrupt.
fn decode(bytes: &[u8]) -> Result<SystemConfig, ConfigError> {
    let cfg: SystemConfig = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
    cfg.validate().map_err(|_| ConfigError::Corrupted)?;
    Ok(cfg)
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        let stored = self
            .store
            .borrow()
            .get(&Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY))
            .cloned();

        #[cfg(target_os = "espidf")]
        let stored = match Self::read_blob() {
            Ok(bytes) => Some(bytes),
            Err(ReadError::Esp(e)) if e == ESP_ERR_NVS_NOT_FOUND => None,
            Err(ReadError::BadLength(len)) => {
                warn!("NvsAdapter: stored config has bad length {}", len);
                return Err(ConfigError::Corrupted);
            }
            Err(ReadError::Esp(e)) => {
                warn!("NvsAdapter: NVS read error {}", e);
                return Err(ConfigError::IoError);
            }
        };

        match stored {
            Some(bytes) => {
                check_blob_len(bytes.len())?;
                let cfg = decode(&bytes)?;
                info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            None => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        self.write_raw(&bytes);

        #[cfg(target_os = "espidf")]
        Self::write_blob(&bytes).map_err(|e| {
            warn!("NvsAdapter: NVS write error {}", e);
            ConfigError::IoError
        })?;

        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AckMode;

    #[test]
    fn empty_store_loads_defaults() {
        let nvs = NvsAdapter::new().unwrap();
        assert_eq!(nvs.load().unwrap(), SystemConfig::default());
    }

    #[test]
    fn save_then_load_round_trip() {
        let nvs = NvsAdapter::new().unwrap();
        let mut cfg = SystemConfig::default();
        cfg.publisher.ack_mode = AckMode::FireAndForget;
        cfg.publisher.min_interval_ms = 30_000;
        nvs.save(&cfg).unwrap();
        assert_eq!(nvs.load().unwrap(), cfg);
    }

    #[test]
    fn save_rejects_invalid_config() {
        let nvs = NvsAdapter::new().unwrap();
        let mut cfg = SystemConfig::default();
        cfg.poll_interval_ms = 0;
        assert!(matches!(
            nvs.save(&cfg),
            Err(ConfigError::ValidationFailed(_))
        ));
        assert_eq!(nvs.load().unwrap(), SystemConfig::default());
    }

    #[test]
    fn garbage_blob_is_corrupted() {
        let nvs = NvsAdapter::new().unwrap();
        nvs.write_raw(&[0xFF, 0x00, 0x13]);
        assert!(matches!(nvs.load(), Err(ConfigError::Corrupted)));
    }

    #[test]
    fn blob_length_bounds() {
        assert_eq!(check_blob_len(0), Err(ConfigError::Corrupted));
        assert_eq!(check_blob_len(1), Ok(()));
        assert_eq!(check_blob_len(MAX_BLOB_SIZE), Ok(()));
        assert_eq!(check_blob_len(MAX_BLOB_SIZE + 1), Err(ConfigError::Corrupted));
    }

    #[test]
    fn oversized_blob_is_corrupted_not_io() {
        let nvs = NvsAdapter::new().unwrap();
        // A valid record with trailing bytes still decodes, so only the
        // length check catches it.
        let mut bytes = postcard::to_allocvec(&SystemConfig::default()).unwrap();
        bytes.resize(MAX_BLOB_SIZE + 1, 0);
        nvs.write_raw(&bytes);
        assert_eq!(nvs.load(), Err(ConfigError::Corrupted));

        nvs.write_raw(&[]);
        assert_eq!(nvs.load(), Err(ConfigError::Corrupted));
    }
}
