//! Config loading, validation, and utility operations.

use super::model::Config;
use super::types::DeviceConfig;
use crate::error::{AdcError, Result};
use crate::locks::{LockSettings, MAX_TIMEOUT};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "ADC_BUS_CONFIG";

/// Config file used when neither `--config` nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/adc-bus.yaml";

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the config file
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(AdcError::UserError)` - Read or parse error, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            AdcError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| AdcError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| AdcError::UserError(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Pick the config file to use.
    ///
    /// An explicit path wins, then `$ADC_BUS_CONFIG`, then
    /// `/etc/adc-bus.yaml` if it exists. `None` means built-in defaults.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
            return Some(PathBuf::from(path));
        }
        let default = Path::new(DEFAULT_CONFIG_PATH);
        default.exists().then(|| default.to_path_buf())
    }

    /// Load the resolved config file, or defaults when there is none.
    pub fn load_resolved(explicit: Option<&Path>) -> Result<Self> {
        match Self::resolve_path(explicit) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `lock_timeout_secs`, `lock_poll_interval_ms` and `lock_stale_secs` must be positive
    /// - `lock_timeout_secs` must not exceed one day
    /// - the poll interval must be shorter than the timeout
    /// - device ids must be non-empty and unique
    /// - device channels must be 0-7 and reference voltages positive
    pub fn validate(&self) -> Result<()> {
        if self.lock_timeout_secs == 0 {
            return Err(AdcError::UserError(
                "config validation failed: lock_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.lock_timeout_secs > MAX_TIMEOUT.as_secs() {
            return Err(AdcError::UserError(format!(
                "config validation failed: lock_timeout_secs must be at most {}",
                MAX_TIMEOUT.as_secs()
            )));
        }

        if self.lock_poll_interval_ms == 0 {
            return Err(AdcError::UserError(
                "config validation failed: lock_poll_interval_ms must be greater than 0"
                    .to_string(),
            ));
        }

        if Duration::from_millis(self.lock_poll_interval_ms)
            >= Duration::from_secs(self.lock_timeout_secs)
        {
            return Err(AdcError::UserError(format!(
                "config validation failed: lock_poll_interval_ms ({}) must be shorter than lock_timeout_secs ({}s)",
                self.lock_poll_interval_ms, self.lock_timeout_secs
            )));
        }

        if self.lock_stale_secs == 0 {
            return Err(AdcError::UserError(
                "config validation failed: lock_stale_secs must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            if device.id.trim().is_empty() {
                return Err(AdcError::UserError(
                    "config validation failed: device ids must be non-empty".to_string(),
                ));
            }
            if !seen.insert(device.id.as_str()) {
                return Err(AdcError::UserError(format!(
                    "config validation failed: duplicate device id '{}'",
                    device.id
                )));
            }
            device.channel_spec().validate().map_err(|e| {
                AdcError::UserError(format!(
                    "config validation failed: device '{}': {}",
                    device.id, e
                ))
            })?;
        }

        Ok(())
    }

    /// Lock parameters for readers built from this config.
    pub fn lock_settings(&self) -> LockSettings {
        LockSettings {
            lock_dir: self.lock_dir.clone(),
            timeout: Duration::from_secs(self.lock_timeout_secs),
            poll_interval: Duration::from_millis(self.lock_poll_interval_ms),
            stale_after: Some(Duration::from_secs(self.lock_stale_secs)),
        }
    }

    /// Look up a configured device by id.
    pub fn device(&self, id: &str) -> Result<&DeviceConfig> {
        self.devices.iter().find(|d| d.id == id).ok_or_else(|| {
            let known: Vec<&str> = self.devices.iter().map(|d| d.id.as_str()).collect();
            AdcError::UserError(format!(
                "unknown device '{}' (configured: {})",
                id,
                if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                }
            ))
        })
    }
}
