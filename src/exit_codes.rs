//! Exit code constants for the adc-bus CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config)
//! - 2: Read failure (every requested sample failed)
//! - 3: Hardware failure (GPIO lines could not be opened or driven)
//! - 4: Lock failure (bus lock could not be acquired or cleared)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, unknown device.
pub const USER_ERROR: i32 = 1;

/// Read failure: no sample could be produced.
pub const READ_FAILURE: i32 = 2;

/// Hardware failure: the GPIO lines backing the bus are unusable.
pub const HARDWARE_FAILURE: i32 = 3;

/// Lock failure: the bus lock could not be acquired or cleared.
pub const LOCK_FAILURE: i32 = 4;
