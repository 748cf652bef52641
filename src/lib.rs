//! adc-bus: lock-serialized reads of MCP3008 converters on a shared software SPI bus.
//!
//! Converters wired to the same clock/chip-select/MISO/MOSI lines share one
//! bus. A [`reader::ConverterReader`] takes the bus lock for its wiring
//! ([`locks::BusLock`]), samples one channel through a
//! [`transfer::BusTransfer`] and returns volts, so readers in any number of
//! threads or processes never interleave transfers on the same bus.

pub mod config;
pub mod diag;
pub mod error;
pub mod exit_codes;
pub mod locks;
pub mod logging;
pub mod mcp3008;
pub mod reader;
pub mod transfer;
pub mod wiring;

#[cfg(test)]
mod test_support;
