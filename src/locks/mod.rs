//! Bus locking for adc-bus.
//!
//! One lock exists per physical bus, keyed by its wiring
//! (`mcp3008-{clock}-{cs}-{miso}-{mosi}`). Every process on the host that wants
//! to clock a conversion out of that bus takes the lock first.
//!
//! # Lock Files
//!
//! Lock files live in a shared lock directory (`/var/lock` by default). Mutual
//! exclusion comes from an advisory lock on an open handle to the file, not
//! from the file's existence, so a holder that dies loses the lock with its
//! file descriptors.
//!
//! # Lock Metadata
//!
//! While held, the file contains JSON metadata:
//! - `owner`: The owner of the lock (e.g., `pi@greenhouse`)
//! - `pid`: The process ID
//! - `created_at`: RFC3339 timestamp
//! - `device`: The reader's device identity
//!
//! A clean release truncates the file. Metadata in a file nobody holds means
//! the holder exited without releasing.
//!
//! # Stale Locks
//!
//! When a wait times out and the holder is gone or older than the stale
//! threshold, the artifact is removed and the attempt reports
//! `StaleLockRecovered`. Removing the artifact of a holder that is alive but
//! merely slow breaks its exclusivity; that trade is accepted so a wedged
//! process cannot make the bus unusable forever.

mod guard;
mod metadata;
mod operations;
mod types;


// Re-export public API
pub use guard::BusLock;
pub use metadata::LockMetadata;
pub use operations::{clear_lock, list_locks};
pub use types::{
    DEFAULT_LOCK_DIR, DEFAULT_POLL_INTERVAL, DEFAULT_STALE_AFTER, DEFAULT_TIMEOUT, LockError,
    LockInfo, LockSettings, LockState, MAX_TIMEOUT,
};
