//! Application-level error type for the adc-bus CLI and operator tooling.
//!
//! The read path itself never returns this type; it reports a
//! [`ReadFailure`](crate::reader::ReadFailure) instead. `AdcError` covers
//! configuration, lock administration and command dispatch.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for adc-bus operations.
///
/// Each variant maps to a specific exit code.
#[derive(Error, Debug)]
pub enum AdcError {
    /// User provided invalid arguments or configuration.
    #[error("{0}")]
    UserError(String),

    /// No sample could be read.
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// GPIO lines or the converter could not be driven.
    #[error("Hardware error: {0}")]
    HardwareError(String),

    /// A bus lock could not be acquired, inspected or cleared.
    #[error("Lock operation failed: {0}")]
    LockError(String),
}

impl AdcError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            AdcError::UserError(_) => exit_codes::USER_ERROR,
            AdcError::ReadFailed(_) => exit_codes::READ_FAILURE,
            AdcError::HardwareError(_) => exit_codes::HARDWARE_FAILURE,
            AdcError::LockError(_) => exit_codes::LOCK_FAILURE,
        }
    }
}

/// Result type alias for adc-bus operations.
pub type Result<T> = std::result::Result<T, AdcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = AdcError::UserError("bad argument".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn read_failed_has_correct_exit_code() {
        let err = AdcError::ReadFailed("3 of 3 samples failed".to_string());
        assert_eq!(err.exit_code(), exit_codes::READ_FAILURE);
    }

    #[test]
    fn hardware_error_has_correct_exit_code() {
        let err = AdcError::HardwareError("gpio 18 busy".to_string());
        assert_eq!(err.exit_code(), exit_codes::HARDWARE_FAILURE);
    }

    #[test]
    fn lock_error_has_correct_exit_code() {
        let err = AdcError::LockError("bus locked".to_string());
        assert_eq!(err.exit_code(), exit_codes::LOCK_FAILURE);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = AdcError::ReadFailed("all samples failed".to_string());
        assert_eq!(err.to_string(), "Read failed: all samples failed");

        let err = AdcError::LockError("no such lock".to_string());
        assert_eq!(err.to_string(), "Lock operation failed: no such lock");
    }
}
