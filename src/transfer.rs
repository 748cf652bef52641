//! The bus-transfer seam between the read protocol and the hardware.
//!
//! A [`BusTransfer`] clocks one conversion out of the converter and returns the
//! raw code. Implementations must only be driven while the bus lock for their
//! wiring is held; [`ConverterReader`](crate::reader::ConverterReader) is what
//! guarantees that.

use thiserror::Error;

/// Failures reported by a bus-transfer implementation.
#[derive(Debug, Clone, Error)]
pub enum TransferError {
    /// The converter has no such input.
    #[error("channel {0} is out of range (0-7)")]
    InvalidChannel(u8),

    /// A GPIO line could not be configured or driven.
    #[error("gpio {pin}: {message}")]
    Gpio { pin: u8, message: String },

    /// The converter returned a code outside its full-scale range.
    #[error("sample {raw} exceeds full scale {full_scale}")]
    InvalidSample { raw: u16, full_scale: u16 },

    /// The transfer implementation panicked.
    #[error("transfer panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

/// One analog-to-digital conversion over a shared bus.
pub trait BusTransfer {
    /// Perform one conversion on `channel` and return the raw code.
    fn transfer(&mut self, channel: u8) -> Result<u16, TransferError>;

    /// The converter's full-scale code (1023 for a 10-bit part).
    fn full_scale(&self) -> u16;
}
