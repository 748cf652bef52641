//! Implementation of the `adc-bus probe` command.
//!
//! A raw wiring check: talks to the converter directly, without the bus lock,
//! so it can interleave with readers on the same bus. Meant for bench use.

use super::hardware_error;
use crate::cli::ProbeArgs;
use adc_bus::diag::{format_single, format_sweep};
use adc_bus::error::Result;
use adc_bus::mcp3008::{Mcp3008, SpiLines, SysfsLines};
use adc_bus::wiring::DeviceWiring;

pub fn cmd_probe(args: ProbeArgs) -> Result<()> {
    let wiring = DeviceWiring::new(args.clock, args.cs, args.miso, args.mosi);
    let lines = SysfsLines::open(&wiring).map_err(hardware_error)?;

    println!("{}", probe(Mcp3008::new(lines), args.channel)?);
    Ok(())
}

/// One channel as `ADC Channel: N, Output: RAW`, or the full sweep row.
fn probe<L: SpiLines>(mut adc: Mcp3008<L>, channel: Option<u8>) -> Result<String> {
    match channel {
        Some(channel) => {
            let raw = adc.read_adc(channel).map_err(hardware_error)?;
            Ok(format_single(channel, raw))
        }
        None => {
            let values = adc.sweep().map_err(hardware_error)?;
            Ok(format_sweep(&values))
        }
    }
}
