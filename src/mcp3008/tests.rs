//! Protocol tests against a simulated MCP3008.

use super::*;
use crate::locks::{BusLock, LockError, LockSettings};
use std::path::PathBuf;
use crate::reader::{ChannelSpec, ConverterReader};
use crate::test_support::capturing_logger;
use crate::wiring::DeviceWiring;
use std::time::Duration;
use tempfile::TempDir;

const CANNED: [u16; CHANNELS] = [10, 200, 512, 1023, 0, 999, 300, 77];

/// Models the chip's side of the wire: samples MOSI on rising clock edges and
/// drives MISO with the null bit followed by the 10-bit result, MSB first.
struct SimulatedChip {
    values: [u16; CHANNELS],
    cs_high: bool,
    clock_high: bool,
    mosi: bool,
    received: Vec<bool>,
    frames: usize,
    conversions: Vec<u8>,
    fail_miso_at: Option<usize>,
    prepared: usize,
    ready: bool,
    selected_unprepared: bool,
}

impl SimulatedChip {
    fn new(values: [u16; CHANNELS]) -> Self {
        Self {
            values,
            cs_high: true,
            clock_high: false,
            mosi: false,
            received: Vec::new(),
            frames: 0,
            conversions: Vec::new(),
            fail_miso_at: None,
            prepared: 0,
            ready: false,
            selected_unprepared: false,
        }
    }

    fn bits_to_u8(bits: &[bool]) -> u8 {
        bits.iter().fold(0, |acc, &bit| (acc << 1) | u8::from(bit))
    }
}

impl SpiLines for SimulatedChip {
    fn prepare(&mut self) -> Result<(), TransferError> {
        self.prepared += 1;
        self.ready = true;
        Ok(())
    }

    fn set_clock(&mut self, high: bool) -> Result<(), TransferError> {
        if !self.cs_high && high && !self.clock_high {
            self.received.push(self.mosi);
        }
        self.clock_high = high;
        Ok(())
    }

    fn set_cs(&mut self, high: bool) -> Result<(), TransferError> {
        if !high && self.cs_high {
            self.received.clear();
            self.selected_unprepared |= !self.ready;
        }
        if high && !self.cs_high {
            self.frames += 1;
            self.ready = false;
        }
        self.cs_high = high;
        Ok(())
    }

    fn set_mosi(&mut self, high: bool) -> Result<(), TransferError> {
        self.mosi = high;
        Ok(())
    }

    fn read_miso(&mut self) -> Result<bool, TransferError> {
        let Some(index) = self.received.len().checked_sub(1) else {
            return Ok(false);
        };
        if self.fail_miso_at == Some(index) {
            return Err(TransferError::Gpio {
                pin: 23,
                message: "simulated read fault".to_string(),
            });
        }

        let Some(start) = self.received.iter().position(|&bit| bit) else {
            return Ok(false);
        };
        // start, SGL, D2..D0, sample clock, null bit, then B9..B0
        let first_data = start + 7;
        if index < first_data || index > first_data + 9 {
            return Ok(false);
        }

        let channel = Self::bits_to_u8(&self.received[start + 2..start + 5]);
        let offset = index - first_data;
        if offset == 0 {
            self.conversions.push(channel);
        }
        let value = self.values[usize::from(channel)];
        Ok((value >> (9 - offset)) & 1 == 1)
    }
}

#[test]
fn command_frame_encodes_start_single_ended_and_channel() {
    assert_eq!(command_frame(0), [0b1100_0000, 0, 0]);
    assert_eq!(command_frame(5), [0b1110_1000, 0, 0]);
    assert_eq!(command_frame(7), [0b1111_1000, 0, 0]);
}

#[test]
fn decode_frame_extracts_ten_bits() {
    assert_eq!(decode_frame([0x00, 0x00, 0x00]), 0);
    assert_eq!(decode_frame([0x01, 0xFF, 0x80]), 1023);
    assert_eq!(decode_frame([0x01, 0x00, 0x00]), 512);
    assert_eq!(decode_frame([0x00, 0x80, 0x00]), 256);
    assert_eq!(decode_frame([0x00, 0x00, 0x80]), 1);
    // Bits outside the result window are ignored.
    assert_eq!(decode_frame([0xFE, 0x00, 0x7F]), 0);
}

#[test]
fn read_adc_returns_each_channel() {
    let mut adc = Mcp3008::new(SimulatedChip::new(CANNED));

    for (channel, expected) in CANNED.iter().enumerate() {
        assert_eq!(adc.read_adc(channel as u8).unwrap(), *expected);
    }

    let chip = adc.into_lines();
    assert_eq!(chip.frames, CHANNELS);
    assert_eq!(chip.conversions, (0..8).collect::<Vec<u8>>());
}

#[test]
fn frame_leaves_bus_idle() {
    let mut adc = Mcp3008::new(SimulatedChip::new(CANNED));
    adc.read_adc(3).unwrap();

    let chip = adc.into_lines();
    assert!(chip.cs_high, "chip select must be released");
    assert!(!chip.clock_high, "clock must idle low");
    assert_eq!(chip.received.len(), 24);
}

#[test]
fn sweep_reads_channels_in_order() {
    let mut adc = Mcp3008::new(SimulatedChip::new(CANNED));
    assert_eq!(adc.sweep().unwrap(), CANNED);
}

#[test]
fn out_of_range_channel_is_rejected_without_clocking() {
    let mut adc = Mcp3008::new(SimulatedChip::new(CANNED));

    let err = adc.read_adc(8).unwrap_err();
    assert!(matches!(err, TransferError::InvalidChannel(8)));

    let chip = adc.into_lines();
    assert_eq!(chip.frames, 0);
    assert!(chip.received.is_empty());
}

#[test]
fn line_fault_aborts_frame_and_deselects() {
    let mut chip = SimulatedChip::new(CANNED);
    chip.fail_miso_at = Some(9);
    let mut adc = Mcp3008::new(chip);

    let err = adc.read_adc(2).unwrap_err();
    assert!(matches!(err, TransferError::Gpio { pin: 23, .. }), "got {:?}", err);

    let chip = adc.into_lines();
    assert!(chip.cs_high, "chip select must be released after a fault");
}

#[test]
fn bus_transfer_reports_ten_bit_full_scale() {
    let mut adc = Mcp3008::new(SimulatedChip::new(CANNED));
    assert_eq!(adc.full_scale(), 1023);
    assert_eq!(adc.transfer(5).unwrap(), 999);
}

#[test]
fn converter_reader_over_simulated_chip() {
    let dir = TempDir::new().unwrap();
    let (logger, _logs) = capturing_logger("greenhouse-soil");
    let settings = LockSettings {
        lock_dir: dir.path().to_path_buf(),
        timeout: Duration::from_secs(5),
        ..LockSettings::default()
    };

    let mut reader = ConverterReader::new(
        DeviceWiring::new(18, 25, 23, 24),
        ChannelSpec::new(2, 3.3),
        Mcp3008::new(SimulatedChip::new(CANNED)),
        settings,
        logger,
    );

    assert_eq!(reader.read_next(), Some(1.6516));
    assert_eq!(reader.read_next(), Some(1.6516));
    assert_eq!(reader.into_transfer().into_lines().conversions, vec![2, 2]);
}

#[test]
fn every_frame_prepares_lines_before_selecting() {
    let mut adc = Mcp3008::new(SimulatedChip::new(CANNED));
    adc.sweep().unwrap();

    let chip = adc.into_lines();
    assert_eq!(chip.prepared, CHANNELS);
    assert!(!chip.selected_unprepared, "chip selected before lines were prepared");
}

/// Lines that, when prepared, check whether another party could take the bus.
struct LockCheckingLines {
    chip: SimulatedChip,
    lock_dir: PathBuf,
    busy_while_preparing: Vec<bool>,
}

impl SpiLines for LockCheckingLines {
    fn prepare(&mut self) -> Result<(), TransferError> {
        let (logger, _logs) = capturing_logger("intruder");
        let settings = LockSettings {
            lock_dir: self.lock_dir.clone(),
            timeout: Duration::ZERO,
            poll_interval: Duration::from_millis(1),
            stale_after: None,
        };
        let key = DeviceWiring::new(18, 25, 23, 24).lock_key();
        let attempt = BusLock::acquire(&key, &settings, &logger);
        self.busy_while_preparing
            .push(matches!(attempt, Err(LockError::AcquireTimeout { .. })));
        self.chip.prepare()
    }

    fn set_clock(&mut self, high: bool) -> Result<(), TransferError> {
        self.chip.set_clock(high)
    }

    fn set_cs(&mut self, high: bool) -> Result<(), TransferError> {
        self.chip.set_cs(high)
    }

    fn set_mosi(&mut self, high: bool) -> Result<(), TransferError> {
        self.chip.set_mosi(high)
    }

    fn read_miso(&mut self) -> Result<bool, TransferError> {
        self.chip.read_miso()
    }
}

#[test]
fn reader_prepares_lines_only_while_holding_the_bus() {
    let dir = TempDir::new().unwrap();
    let (logger, _logs) = capturing_logger("greenhouse-soil");
    let lines = LockCheckingLines {
        chip: SimulatedChip::new(CANNED),
        lock_dir: dir.path().to_path_buf(),
        busy_while_preparing: Vec::new(),
    };
    let settings = LockSettings {
        lock_dir: dir.path().to_path_buf(),
        timeout: Duration::from_secs(5),
        ..LockSettings::default()
    };

    let mut reader = ConverterReader::new(
        DeviceWiring::new(18, 25, 23, 24),
        ChannelSpec::new(3, 3.3),
        Mcp3008::new(lines),
        settings,
        logger,
    );

    assert!(reader.read_next().is_some());
    assert!(reader.read_next().is_some());

    let lines = reader.into_transfer().into_lines();
    assert_eq!(lines.busy_while_preparing, vec![true, true]);
}
