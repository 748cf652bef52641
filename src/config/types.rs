//! Configuration types and defaults for adc-bus.
//!
//! This module defines the per-device entry and the default value functions
//! used by the Config struct.

use crate::locks::{DEFAULT_LOCK_DIR, DEFAULT_POLL_INTERVAL, DEFAULT_STALE_AFTER, DEFAULT_TIMEOUT};
use crate::reader::{ChannelSpec, DEFAULT_REFERENCE_VOLTAGE};
use crate::wiring::DeviceWiring;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One converter input the operator wants to read by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device identity used in logs and lock metadata.
    pub id: String,

    /// SPI clock pin.
    pub clock: u8,

    /// Chip-select pin.
    pub cs: u8,

    /// MISO (converter data out) pin.
    pub miso: u8,

    /// MOSI (converter data in) pin.
    pub mosi: u8,

    /// Converter input, 0-7.
    pub channel: u8,

    /// Voltage represented by the full-scale code.
    #[serde(default = "default_reference_voltage")]
    pub reference_voltage: f64,
}

impl DeviceConfig {
    pub fn wiring(&self) -> DeviceWiring {
        DeviceWiring::new(self.clock, self.cs, self.miso, self.mosi)
    }

    pub fn channel_spec(&self) -> ChannelSpec {
        ChannelSpec::new(self.channel, self.reference_voltage)
    }
}

// Default value functions for serde
pub(crate) fn default_lock_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOCK_DIR)
}
pub(crate) fn default_lock_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}
pub(crate) fn default_lock_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}
pub(crate) fn default_lock_stale_secs() -> u64 {
    DEFAULT_STALE_AFTER.as_secs()
}
pub(crate) fn default_reference_voltage() -> f64 {
    DEFAULT_REFERENCE_VOLTAGE
}
