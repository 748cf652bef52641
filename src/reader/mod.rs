//! Locked, calibrated reads of one converter channel.
//!
//! A [`ConverterReader`] owns the bus-transfer handle for one device. Every
//! [`read`](ConverterReader::read) takes the bus lock for the device's wiring,
//! waits out the bus settle time, clocks one conversion, scales it to volts and
//! gives the lock back, whatever happened in between. Failures come back as a
//! [`ReadFailure`] value; nothing escapes as a panic.

mod channel;


pub use channel::{ChannelSpec, DEFAULT_REFERENCE_VOLTAGE, MAX_CHANNEL, raw_to_voltage};

use crate::locks::{BusLock, LockError, LockSettings};
use crate::logging::DeviceLogger;
use crate::logging::prelude::*;
use crate::transfer::{BusTransfer, TransferError};
use crate::wiring::{DeviceWiring, LockKey};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Quiet period between taking the bus and starting a transfer.
pub const SETTLE_TIME: Duration = Duration::from_millis(100);

/// Why a read produced no voltage.
#[derive(Debug, Error)]
pub enum ReadFailure {
    /// The bus lock could not be taken; no transfer was attempted.
    #[error("bus lock unavailable: {0}")]
    LockUnavailable(#[from] LockError),

    /// The transfer failed or returned an invalid sample.
    #[error("bus transfer failed: {0}")]
    TransferError(#[from] TransferError),

    /// The channel configuration cannot be converted.
    #[error("invalid channel configuration: {0}")]
    ConversionError(String),
}

/// Outcome of one read: volts, or why there are none.
pub type ReadResult = Result<f64, ReadFailure>;

/// Reads one channel of one converter under its bus lock.
pub struct ConverterReader<T> {
    wiring: DeviceWiring,
    channel: ChannelSpec,
    transfer: T,
    settings: LockSettings,
    logger: DeviceLogger,
}

impl<T: BusTransfer> ConverterReader<T> {
    pub fn new(
        wiring: DeviceWiring,
        channel: ChannelSpec,
        transfer: T,
        settings: LockSettings,
        logger: DeviceLogger,
    ) -> Self {
        Self {
            wiring,
            channel,
            transfer,
            settings,
            logger,
        }
    }

    pub fn wiring(&self) -> &DeviceWiring {
        &self.wiring
    }

    pub fn channel(&self) -> &ChannelSpec {
        &self.channel
    }

    pub fn lock_key(&self) -> LockKey {
        self.wiring.lock_key()
    }

    /// Hand back the transfer handle.
    pub fn into_transfer(self) -> T {
        self.transfer
    }

    /// Take one sample and convert it to volts.
    ///
    /// The bus lock is held only for the settle time, the transfer and the
    /// conversion, and is released before this returns on every path.
    pub fn read(&mut self) -> ReadResult {
        let key = self.wiring.lock_key();
        let result = self.read_locked(&key);

        match &result {
            Ok(voltage) => self
                .logger
                .in_scope(|| debug!(lock = %key, channel = self.channel.index, voltage, "sample read")),
            Err(failure @ ReadFailure::LockUnavailable(_)) => self.logger.in_scope(|| {
                warn!(lock = %key, channel = self.channel.index, error = %failure, "read skipped");
            }),
            Err(failure) => self.logger.in_scope(|| {
                error!(lock = %key, channel = self.channel.index, error = %failure, "read failed");
            }),
        }

        result
    }

    /// Take one sample, rounded to four decimal places, or `None` if the read
    /// failed. The failure itself has already been logged by [`read`](Self::read).
    pub fn read_next(&mut self) -> Option<f64> {
        self.read()
            .ok()
            .map(|voltage| (voltage * 10_000.0).round() / 10_000.0)
    }

    fn read_locked(&mut self, key: &LockKey) -> ReadResult {
        self.channel.validate()?;

        let mut lock = BusLock::acquire(key, &self.settings, &self.logger)?;

        thread::sleep(SETTLE_TIME);

        let index = self.channel.index;
        let transfer = &mut self.transfer;
        let raw = panic::catch_unwind(AssertUnwindSafe(|| transfer.transfer(index)))
            .map_err(|payload| TransferError::Panicked(panic_message(payload.as_ref())))??;

        let voltage = raw_to_voltage(
            raw,
            self.transfer.full_scale(),
            self.channel.reference_voltage,
        );

        lock.release();
        voltage
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
