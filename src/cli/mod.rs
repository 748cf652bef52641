//! CLI argument parsing for adc-bus.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// adc-bus: read MCP3008 converter channels over a shared, lock-serialized SPI bus.
///
/// Every converter wired to the same four GPIO lines shares one bus lock, so
/// concurrent readers (other processes included) never interleave transfers.
#[derive(Parser, Debug)]
#[command(name = "adc-bus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to $ADC_BUS_CONFIG, then /etc/adc-bus.yaml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for adc-bus.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a channel as volts.
    ///
    /// Each sample is taken under the bus lock and printed with four decimals.
    Read(ReadArgs),

    /// Read raw converter codes without taking the bus lock.
    ///
    /// Reads one channel, or sweeps all eight when no channel is given.
    Probe(ProbeArgs),

    /// Bus lock management commands.
    ///
    /// List or clear lock artifacts in the lock directory.
    Lock(LockCommand),
}

/// GPIO lines of one converter.
#[derive(Args, Debug, Clone)]
pub struct PinArgs {
    /// SPI clock pin.
    #[arg(long)]
    pub clock: Option<u8>,

    /// Chip-select pin.
    #[arg(long)]
    pub cs: Option<u8>,

    /// MISO pin (converter data out).
    #[arg(long)]
    pub miso: Option<u8>,

    /// MOSI pin (converter data in).
    #[arg(long)]
    pub mosi: Option<u8>,
}

/// Arguments for the `read` command.
#[derive(Parser, Debug)]
pub struct ReadArgs {
    /// Configured device to read.
    #[arg(long, conflicts_with_all = ["clock", "cs", "miso", "mosi"])]
    pub device: Option<String>,

    #[command(flatten)]
    pub pins: PinArgs,

    /// Channel to read (0-7); overrides the configured channel.
    #[arg(long)]
    pub channel: Option<u8>,

    /// Reference voltage; overrides the configured one.
    #[arg(long, value_name = "VOLTS")]
    pub vref: Option<f64>,

    /// Number of samples to take.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Seconds between samples.
    #[arg(long, default_value_t = 1.0, value_name = "SECS")]
    pub interval: f64,
}

/// Arguments for the `probe` command.
#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// SPI clock pin.
    #[arg(long)]
    pub clock: u8,

    /// Chip-select pin.
    #[arg(long)]
    pub cs: u8,

    /// MISO pin (converter data out).
    #[arg(long)]
    pub miso: u8,

    /// MOSI pin (converter data in).
    #[arg(long)]
    pub mosi: u8,

    /// Single channel to read; all eight are swept when omitted.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=7))]
    pub channel: Option<u8>,
}

/// Lock subcommands.
#[derive(Parser, Debug)]
pub struct LockCommand {
    #[command(subcommand)]
    pub action: LockAction,
}

/// Available lock actions.
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// List all bus lock artifacts.
    ///
    /// Shows each bus with its state, owner and age.
    List,

    /// Clear a specific lock.
    ///
    /// Requires --force flag to prevent accidental clearing.
    Clear(LockClearArgs),
}

/// Arguments for the `lock clear` command.
#[derive(Parser, Debug)]
pub struct LockClearArgs {
    /// Lock key to clear, e.g. mcp3008-18-25-23-24.
    pub lock_id: String,

    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
