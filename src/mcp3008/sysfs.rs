//! Software SPI lines on Linux sysfs GPIO.

use super::SpiLines;
use crate::transfer::TransferError;
use crate::wiring::DeviceWiring;
use sysfs_gpio::{Direction, Pin};

const SYSFS_GPIO_PATH: &str = "/sys/class/gpio";

struct Line {
    number: u8,
    idle: Direction,
    pin: Pin,
}

impl Line {
    fn new(number: u8, idle: Direction) -> Self {
        Self {
            number,
            idle,
            pin: Pin::new(u64::from(number)),
        }
    }

    /// Export the pin if nobody has yet and put it in its idle state.
    fn configure(&self) -> Result<(), TransferError> {
        self.pin
            .export()
            .and_then(|()| self.pin.set_direction(self.idle))
            .map_err(|e| gpio_error(self.number, e))
    }

    fn set(&self, high: bool) -> Result<(), TransferError> {
        self.pin
            .set_value(u8::from(high))
            .map_err(|e| gpio_error(self.number, e))
    }

    fn get(&self) -> Result<bool, TransferError> {
        self.pin
            .get_value()
            .map(|value| value != 0)
            .map_err(|e| gpio_error(self.number, e))
    }
}

fn gpio_error(pin: u8, err: sysfs_gpio::Error) -> TransferError {
    TransferError::Gpio {
        pin,
        message: err.to_string(),
    }
}

/// The four bus lines, driven through `/sys/class/gpio`.
///
/// Opening touches no pin. Export and directions are applied in
/// [`SpiLines::prepare`], which runs at the start of every frame with the bus
/// lock held, so a process starting up never disturbs another holder's frame.
/// Pins stay exported when this is dropped: other processes may share them.
pub struct SysfsLines {
    clock: Line,
    cs: Line,
    miso: Line,
    mosi: Line,
}

impl SysfsLines {
    /// Bind the lines of `wiring`: chip select idles high, clock and MOSI idle
    /// low, MISO is an input.
    pub fn open(wiring: &DeviceWiring) -> Result<Self, TransferError> {
        if !std::path::Path::new(SYSFS_GPIO_PATH).is_dir() {
            return Err(TransferError::Other(format!(
                "GPIO is not supported on this system ({} missing)",
                SYSFS_GPIO_PATH
            )));
        }

        Ok(Self {
            cs: Line::new(wiring.cs, Direction::High),
            clock: Line::new(wiring.clock, Direction::Low),
            mosi: Line::new(wiring.mosi, Direction::Low),
            miso: Line::new(wiring.miso, Direction::In),
        })
    }
}

impl SpiLines for SysfsLines {
    fn prepare(&mut self) -> Result<(), TransferError> {
        self.cs.configure()?;
        self.clock.configure()?;
        self.mosi.configure()?;
        self.miso.configure()
    }

    fn set_clock(&mut self, high: bool) -> Result<(), TransferError> {
        self.clock.set(high)
    }

    fn set_cs(&mut self, high: bool) -> Result<(), TransferError> {
        self.cs.set(high)
    }

    fn set_mosi(&mut self, high: bool) -> Result<(), TransferError> {
        self.mosi.set(high)
    }

    fn read_miso(&mut self) -> Result<bool, TransferError> {
        self.miso.get()
    }
}
