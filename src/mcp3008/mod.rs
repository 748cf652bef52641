//! Bit-banged MCP3008 driver.
//!
//! The MCP3008 is an 8-channel, 10-bit SAR converter on an SPI bus. Here the bus
//! is driven in software over four GPIO lines (SPI mode 0, MSB first). One
//! conversion is a 24-clock frame:
//!
//! ```text
//! MOSI: 1  1  D2 D1 D0 x  x  x | x ... x | x ... x
//!       |  |  \_ channel_/
//!       |  single-ended
//!       start
//! MISO: ...           0  B9 | B8 ... B1 | B0 x ...
//! ```
//!
//! The result occupies clocks 7 through 16.

mod sysfs;

#[cfg(test)]
mod tests;

pub use sysfs::SysfsLines;

use crate::reader::MAX_CHANNEL;
use crate::transfer::{BusTransfer, TransferError};

/// Full-scale code of the 10-bit converter.
pub const FULL_SCALE: u16 = 1023;

/// Number of single-ended inputs.
pub const CHANNELS: usize = MAX_CHANNEL as usize + 1;

/// The four lines of a software SPI bus.
pub trait SpiLines {
    /// Put the lines in their idle state. Called at the start of every frame;
    /// when driven through a reader, the bus lock is held.
    fn prepare(&mut self) -> Result<(), TransferError> {
        Ok(())
    }

    fn set_clock(&mut self, high: bool) -> Result<(), TransferError>;
    fn set_cs(&mut self, high: bool) -> Result<(), TransferError>;
    fn set_mosi(&mut self, high: bool) -> Result<(), TransferError>;
    fn read_miso(&mut self) -> Result<bool, TransferError>;
}

/// Build the command frame for a single-ended conversion on `channel`.
pub(crate) fn command_frame(channel: u8) -> [u8; 3] {
    [(0b11 << 6) | ((channel & 0x07) << 3), 0, 0]
}

/// Extract the 10-bit result from the bytes clocked in during a frame.
pub(crate) fn decode_frame(rx: [u8; 3]) -> u16 {
    let result = (u16::from(rx[0] & 0x01) << 9)
        | (u16::from(rx[1]) << 1)
        | (u16::from(rx[2] & 0x80) >> 7);
    result & FULL_SCALE
}

/// An MCP3008 behind a software SPI bus.
pub struct Mcp3008<L> {
    lines: L,
}

impl<L: SpiLines> Mcp3008<L> {
    pub fn new(lines: L) -> Self {
        Self { lines }
    }

    pub fn into_lines(self) -> L {
        self.lines
    }

    /// Convert one channel and return the raw 10-bit code.
    pub fn read_adc(&mut self, channel: u8) -> Result<u16, TransferError> {
        if channel > MAX_CHANNEL {
            return Err(TransferError::InvalidChannel(channel));
        }
        let rx = self.exchange(command_frame(channel))?;
        Ok(decode_frame(rx))
    }

    /// Convert every channel in order.
    pub fn sweep(&mut self) -> Result<[u16; CHANNELS], TransferError> {
        let mut values = [0u16; CHANNELS];
        for (channel, value) in (0..=MAX_CHANNEL).zip(values.iter_mut()) {
            *value = self.read_adc(channel)?;
        }
        Ok(values)
    }

    fn exchange(&mut self, tx: [u8; 3]) -> Result<[u8; 3], TransferError> {
        self.lines.prepare()?;
        self.lines.set_clock(false)?;
        self.lines.set_cs(false)?;

        let result = self.clock_bytes(tx);

        // Always deselect; report the first failure.
        let deselect = self.lines.set_cs(true);
        let rx = result?;
        deselect?;
        Ok(rx)
    }

    fn clock_bytes(&mut self, tx: [u8; 3]) -> Result<[u8; 3], TransferError> {
        let mut rx = [0u8; 3];
        for (&out, inp) in tx.iter().zip(rx.iter_mut()) {
            for bit in (0..8).rev() {
                self.lines.set_mosi((out >> bit) & 1 == 1)?;
                self.lines.set_clock(true)?;
                if self.lines.read_miso()? {
                    *inp |= 1 << bit;
                }
                self.lines.set_clock(false)?;
            }
        }
        Ok(rx)
    }
}

impl<L: SpiLines> BusTransfer for Mcp3008<L> {
    fn transfer(&mut self, channel: u8) -> Result<u16, TransferError> {
        self.read_adc(channel)
    }

    fn full_scale(&self) -> u16 {
        FULL_SCALE
    }
}
