//! Lock settings, failure signals and information structures.

use super::metadata::LockMetadata;
use crate::wiring::{DeviceWiring, LockKey};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default directory holding bus lock artifacts.
pub const DEFAULT_LOCK_DIR: &str = "/var/lock";

/// Default bound on how long `acquire` waits for a busy bus.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest wait `acquire` will honor; larger timeouts are cut down to this.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Default pause between attempts while the bus is busy.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default age after which a holder that still has the lock is considered hung.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(600);

/// Parameters for one acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSettings {
    /// Directory holding the lock artifacts.
    pub lock_dir: PathBuf,

    /// Upper bound on the wait for a busy bus.
    pub timeout: Duration,

    /// Pause between attempts while the bus is busy.
    pub poll_interval: Duration,

    /// Holder age after which the holder is treated as unresponsive.
    /// `None` disables the age check; only dead owners are then recovered.
    pub stale_after: Option<Duration>,
}

impl LockSettings {
    /// The wait `acquire` actually honors.
    pub fn effective_timeout(&self) -> Duration {
        self.timeout.min(MAX_TIMEOUT)
    }
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            lock_dir: PathBuf::from(DEFAULT_LOCK_DIR),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            stale_after: Some(DEFAULT_STALE_AFTER),
        }
    }
}

/// Why a bus lock could not be handed out.
#[derive(Debug, Error)]
pub enum LockError {
    /// The bus stayed busy for the whole wait and its holder looks alive.
    #[error("bus lock '{key}' still held after {waited:?}")]
    AcquireTimeout { key: LockKey, waited: Duration },

    /// An abandoned artifact was removed; this attempt fails, the next may succeed.
    #[error("removed stale bus lock '{key}' left by {owner}; retry the read")]
    StaleLockRecovered { key: LockKey, owner: String },

    /// The lock directory or artifact could not be used at all.
    #[error("lock artifact '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Observed state of a lock artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Nobody holds the lock and no leftover metadata is present.
    Idle,
    /// A live process holds the lock.
    Held,
    /// Leftover of a dead owner, or a holder older than the stale threshold.
    Stale,
}

impl LockState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockState::Idle => "idle",
            LockState::Held => "held",
            LockState::Stale => "stale",
        }
    }
}

/// Information about one lock artifact in the lock directory.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The lock file path.
    pub path: PathBuf,

    /// The lock key (also the file name).
    pub key: LockKey,

    /// The bus the artifact serializes.
    pub wiring: DeviceWiring,

    /// Metadata written by the last holder, if any.
    pub metadata: Option<LockMetadata>,

    pub state: LockState,
}

impl fmt::Display for LockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {}", self.key, self.wiring, self.state.as_str())?;
        if let Some(meta) = &self.metadata {
            write!(
                f,
                ", owner: {}, age: {}, device: {}",
                meta.owner,
                meta.age_string(),
                meta.device
            )?;
        }
        f.write_str(")")
    }
}
