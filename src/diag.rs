//! Report formatting for the unlocked diagnostic probe.

use crate::mcp3008::CHANNELS;

/// One raw reading: `ADC Channel: 3, Output: 1023`.
pub fn format_single(channel: u8, raw: u16) -> String {
    format!("ADC Channel: {}, Output: {}", channel, raw)
}

/// All channels as one table row of right-aligned 4-character fields.
pub fn format_sweep(values: &[u16; CHANNELS]) -> String {
    values
        .iter()
        .fold(String::from("|"), |row, value| format!("{} {:>4} |", row, value))
}
