//! Channel configuration and raw-to-volts conversion.

use super::ReadFailure;
use crate::transfer::TransferError;
use serde::{Deserialize, Serialize};

/// Highest channel index on the converter.
pub const MAX_CHANNEL: u8 = 7;

/// Reference voltage assumed when none is configured.
pub const DEFAULT_REFERENCE_VOLTAGE: f64 = 3.3;

/// Which input to sample and the voltage its full-scale code stands for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub index: u8,
    pub reference_voltage: f64,
}

impl ChannelSpec {
    pub fn new(index: u8, reference_voltage: f64) -> Self {
        Self {
            index,
            reference_voltage,
        }
    }

    /// Check the index range and that the reference is a positive, finite voltage.
    pub fn validate(&self) -> Result<(), ReadFailure> {
        if self.index > MAX_CHANNEL {
            return Err(ReadFailure::ConversionError(format!(
                "channel {} is out of range (0-{})",
                self.index, MAX_CHANNEL
            )));
        }
        if !self.reference_voltage.is_finite() || self.reference_voltage <= 0.0 {
            return Err(ReadFailure::ConversionError(format!(
                "reference voltage must be positive, got {}",
                self.reference_voltage
            )));
        }
        Ok(())
    }
}

/// Scale a raw code linearly onto `[0, reference_voltage]`.
///
/// A code above `full_scale` means the transfer went wrong and is reported as
/// a transfer error.
pub fn raw_to_voltage(raw: u16, full_scale: u16, reference_voltage: f64) -> Result<f64, ReadFailure> {
    if full_scale == 0 {
        return Err(ReadFailure::ConversionError(
            "converter reports a full scale of 0".to_string(),
        ));
    }
    if raw > full_scale {
        return Err(TransferError::InvalidSample { raw, full_scale }.into());
    }
    Ok(f64::from(raw) / f64::from(full_scale) * reference_voltage)
}
