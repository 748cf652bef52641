//! Implementation of the `adc-bus read` command.
//!
//! Opens the converter's GPIO lines and takes `--count` samples, each under the
//! bus lock. Failed samples are logged by the reader and skipped on stdout.
//! The exit code is 4 when the bus lock was never available, 2 when no sample
//! could be read for any other reason.

use super::hardware_error;
use crate::cli::ReadArgs;
use adc_bus::config::Config;
use adc_bus::error::{AdcError, Result};
use adc_bus::logging::DeviceLogger;
use adc_bus::mcp3008::{Mcp3008, SysfsLines};
use adc_bus::reader::{ChannelSpec, ConverterReader, DEFAULT_REFERENCE_VOLTAGE, ReadFailure};
use adc_bus::transfer::BusTransfer;
use adc_bus::wiring::DeviceWiring;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

/// What `read` will sample, after config and flags are merged.
#[derive(Debug, Clone, PartialEq)]
struct ReadTarget {
    device: String,
    wiring: DeviceWiring,
    channel: ChannelSpec,
}

pub fn cmd_read(config: &Config, args: ReadArgs) -> Result<()> {
    let target = resolve_target(config, &args)?;
    let interval = Duration::try_from_secs_f64(args.interval).map_err(|_| {
        AdcError::UserError(format!(
            "--interval must be a non-negative number of seconds, got {}",
            args.interval
        ))
    })?;

    let lines = SysfsLines::open(&target.wiring).map_err(hardware_error)?;
    let logger = DeviceLogger::current(target.device.as_str());
    let mut reader = ConverterReader::new(
        target.wiring,
        target.channel,
        Mcp3008::new(lines),
        config.lock_settings(),
        logger,
    );

    sample(
        &mut reader,
        &target.device,
        args.count,
        interval,
        &mut io::stdout().lock(),
    )
}

/// Take `count` samples and write one voltage per line to `out`.
///
/// Fails only when no sample was produced: with a lock error when the bus was
/// never available, with a read error otherwise.
fn sample<T: BusTransfer>(
    reader: &mut ConverterReader<T>,
    device: &str,
    count: u32,
    interval: Duration,
    out: &mut impl Write,
) -> Result<()> {
    let mut produced = 0u32;
    let mut lock_failures = 0u32;
    for attempt in 0..count {
        if attempt > 0 {
            thread::sleep(interval);
        }
        match reader.read() {
            Ok(voltage) => {
                writeln!(out, "{:.4}", voltage).map_err(|e| {
                    AdcError::UserError(format!("failed to write sample: {}", e))
                })?;
                produced += 1;
            }
            Err(ReadFailure::LockUnavailable(_)) => lock_failures += 1,
            Err(_) => {}
        }
    }

    if produced > 0 {
        return Ok(());
    }
    if lock_failures == count {
        return Err(AdcError::LockError(format!(
            "'{}' could not take bus {} in any of {} attempt(s)",
            device,
            reader.lock_key(),
            count
        )));
    }
    Err(AdcError::ReadFailed(format!(
        "no sample from '{}' on bus {} in {} attempt(s)",
        device,
        reader.lock_key(),
        count
    )))
}

/// Merge a configured device (or explicit pins) with the command-line overrides.
fn resolve_target(config: &Config, args: &ReadArgs) -> Result<ReadTarget> {
    let (device, wiring, mut channel) = match &args.device {
        Some(id) => {
            let device = config.device(id)?;
            (
                Some(device.id.clone()),
                device.wiring(),
                device.channel_spec(),
            )
        }
        None => {
            let pins = &args.pins;
            let (Some(clock), Some(cs), Some(miso), Some(mosi)) =
                (pins.clock, pins.cs, pins.miso, pins.mosi)
            else {
                return Err(AdcError::UserError(
                    "either --device or all of --clock, --cs, --miso and --mosi are required"
                        .to_string(),
                ));
            };
            (
                None,
                DeviceWiring::new(clock, cs, miso, mosi),
                ChannelSpec::new(0, DEFAULT_REFERENCE_VOLTAGE),
            )
        }
    };

    if let Some(index) = args.channel {
        channel.index = index;
    }
    if let Some(reference_voltage) = args.vref {
        channel.reference_voltage = reference_voltage;
    }
    channel
        .validate()
        .map_err(|e| AdcError::UserError(e.to_string()))?;

    let device =
        device.unwrap_or_else(|| format!("{}/ch{}", wiring.lock_key(), channel.index));

    Ok(ReadTarget {
        device,
        wiring,
        channel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PinArgs;
    use adc_bus::exit_codes;
    use adc_bus::locks::{BusLock, LockSettings};
    use adc_bus::transfer::TransferError;
    use tempfile::TempDir;

    /// Returns the same outcome for every conversion.
    struct FixedTransfer(std::result::Result<u16, TransferError>);

    impl BusTransfer for FixedTransfer {
        fn transfer(&mut self, _channel: u8) -> std::result::Result<u16, TransferError> {
            self.0.clone()
        }

        fn full_scale(&self) -> u16 {
            1023
        }
    }

    fn lock_settings(dir: &TempDir) -> LockSettings {
        LockSettings {
            lock_dir: dir.path().to_path_buf(),
            timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(10),
            stale_after: None,
        }
    }

    fn fixed_reader(
        dir: &TempDir,
        outcome: std::result::Result<u16, TransferError>,
    ) -> ConverterReader<FixedTransfer> {
        ConverterReader::new(
            DeviceWiring::new(18, 25, 23, 24),
            ChannelSpec::new(0, 3.3),
            FixedTransfer(outcome),
            lock_settings(dir),
            DeviceLogger::current("soil-moisture"),
        )
    }

    const CONFIG: &str = r#"
devices:
  - id: soil-moisture
    clock: 18
    cs: 25
    miso: 23
    mosi: 24
    channel: 2
    reference_voltage: 5.0
"#;

    fn args() -> ReadArgs {
        ReadArgs {
            device: None,
            pins: PinArgs {
                clock: None,
                cs: None,
                miso: None,
                mosi: None,
            },
            channel: None,
            vref: None,
            count: 1,
            interval: 1.0,
        }
    }

    #[test]
    fn configured_device_is_resolved() {
        let config = Config::from_yaml(CONFIG).unwrap();
        let mut args = args();
        args.device = Some("soil-moisture".to_string());

        let target = resolve_target(&config, &args).unwrap();
        assert_eq!(target.device, "soil-moisture");
        assert_eq!(target.wiring, DeviceWiring::new(18, 25, 23, 24));
        assert_eq!(target.channel, ChannelSpec::new(2, 5.0));
    }

    #[test]
    fn flags_override_configured_channel() {
        let config = Config::from_yaml(CONFIG).unwrap();
        let mut args = args();
        args.device = Some("soil-moisture".to_string());
        args.channel = Some(6);
        args.vref = Some(3.3);

        let target = resolve_target(&config, &args).unwrap();
        assert_eq!(target.channel, ChannelSpec::new(6, 3.3));
    }

    #[test]
    fn explicit_pins_get_a_derived_identity() {
        let mut args = args();
        args.pins = PinArgs {
            clock: Some(11),
            cs: Some(8),
            miso: Some(9),
            mosi: Some(10),
        };
        args.channel = Some(4);

        let target = resolve_target(&Config::default(), &args).unwrap();
        assert_eq!(target.device, "mcp3008-11-8-9-10/ch4");
        assert_eq!(target.channel.reference_voltage, DEFAULT_REFERENCE_VOLTAGE);
    }

    #[test]
    fn missing_pins_are_rejected() {
        let mut args = args();
        args.pins.clock = Some(11);

        let err = resolve_target(&Config::default(), &args).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
        assert!(err.to_string().contains("--device"));
    }

    #[test]
    fn out_of_range_channel_is_rejected_before_any_hardware() {
        let config = Config::from_yaml(CONFIG).unwrap();
        let mut args = args();
        args.device = Some("soil-moisture".to_string());
        args.channel = Some(8);

        let err = resolve_target(&config, &args).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
        assert!(err.to_string().contains("channel 8"));
    }

    #[test]
    fn unknown_device_is_rejected() {
        let mut args = args();
        args.device = Some("boiler".to_string());

        let err = resolve_target(&Config::default(), &args).unwrap_err();
        assert!(err.to_string().contains("unknown device 'boiler'"));
    }

    #[test]
    fn negative_interval_is_rejected() {
        let config = Config::from_yaml(CONFIG).unwrap();
        let mut args = args();
        args.device = Some("soil-moisture".to_string());
        args.interval = -1.0;

        let err = cmd_read(&config, args).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
        assert!(err.to_string().contains("--interval"));
    }

    #[test]
    fn samples_are_printed_one_per_line() {
        let dir = TempDir::new().unwrap();
        let mut reader = fixed_reader(&dir, Ok(512));
        let mut out = Vec::new();

        sample(&mut reader, "soil-moisture", 2, Duration::ZERO, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "1.6516\n1.6516\n");
    }

    #[test]
    fn failed_transfers_exit_with_read_failure() {
        let dir = TempDir::new().unwrap();
        let mut reader = fixed_reader(&dir, Err(TransferError::Other("no ack".to_string())));
        let mut out = Vec::new();

        let err = sample(&mut reader, "soil-moisture", 2, Duration::ZERO, &mut out).unwrap_err();

        assert_eq!(err.exit_code(), exit_codes::READ_FAILURE);
        assert!(out.is_empty());
    }

    #[test]
    fn busy_bus_exits_with_lock_failure() {
        let dir = TempDir::new().unwrap();
        let key = DeviceWiring::new(18, 25, 23, 24).lock_key();
        let _holder = BusLock::acquire(
            &key,
            &lock_settings(&dir),
            &DeviceLogger::current("other-process"),
        )
        .unwrap();

        let mut reader = fixed_reader(&dir, Ok(512));
        let mut out = Vec::new();

        let err = sample(&mut reader, "soil-moisture", 2, Duration::ZERO, &mut out).unwrap_err();

        assert_eq!(err.exit_code(), exit_codes::LOCK_FAILURE);
        assert!(err.to_string().contains("mcp3008-18-25-23-24"), "got {}", err);
        assert!(out.is_empty());
    }
}
