//! Configuration model for adc-bus.

use super::types::{
    DeviceConfig, default_lock_dir, default_lock_poll_interval_ms, default_lock_stale_secs,
    default_lock_timeout_secs,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for adc-bus.
///
/// This struct represents the contents of `adc-bus.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Directory holding the bus lock artifacts.
    #[serde(default = "default_lock_dir")]
    pub lock_dir: PathBuf,

    /// Seconds to wait for a busy bus before giving up.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,

    /// Milliseconds between attempts while the bus is busy.
    #[serde(default = "default_lock_poll_interval_ms")]
    pub lock_poll_interval_ms: u64,

    /// Seconds after which a holder that still has the bus is considered hung.
    #[serde(default = "default_lock_stale_secs")]
    pub lock_stale_secs: u64,

    // =========================================================================
    // Devices
    // =========================================================================
    /// Named converter inputs.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_dir: default_lock_dir(),
            lock_timeout_secs: default_lock_timeout_secs(),
            lock_poll_interval_ms: default_lock_poll_interval_ms(),
            lock_stale_secs: default_lock_stale_secs(),
            devices: Vec::new(),
        }
    }
}
