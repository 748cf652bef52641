//! Command implementations for adc-bus.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod lock;
mod probe;
mod read;

use crate::cli::{Cli, Command, LockAction, LockCommand};
use adc_bus::config::Config;
use adc_bus::error::{AdcError, Result};
use adc_bus::transfer::TransferError;

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. Each command
/// is routed to its handler function.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Read(args) => {
            let config = Config::load_resolved(cli.config.as_deref())?;
            read::cmd_read(&config, args)
        }
        Command::Probe(args) => probe::cmd_probe(args),
        Command::Lock(lock_cmd) => {
            let config = Config::load_resolved(cli.config.as_deref())?;
            dispatch_lock(&config, lock_cmd)
        }
    }
}

/// Dispatch lock subcommands.
fn dispatch_lock(config: &Config, lock_cmd: LockCommand) -> Result<()> {
    match lock_cmd.action {
        LockAction::List => lock::cmd_lock_list(config),
        LockAction::Clear(args) => lock::cmd_lock_clear(config, args),
    }
}

/// Map a failure to open or drive the converter onto an exit-code carrying error.
fn hardware_error(err: TransferError) -> AdcError {
    match err {
        TransferError::InvalidChannel(_) => AdcError::UserError(err.to_string()),
        other => AdcError::HardwareError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adc_bus::exit_codes;

    #[test]
    fn invalid_channel_is_a_user_error() {
        let err = hardware_error(TransferError::InvalidChannel(9));
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn gpio_failure_is_a_hardware_error() {
        let err = hardware_error(TransferError::Gpio {
            pin: 18,
            message: "permission denied".to_string(),
        });
        assert_eq!(err.exit_code(), exit_codes::HARDWARE_FAILURE);
        assert!(err.to_string().contains("gpio 18: permission denied"));
    }
}
