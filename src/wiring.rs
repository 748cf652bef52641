//! Physical bus identity and the lock key derived from it.
//!
//! A bus instance is identified by the four GPIO lines that connect the host to
//! the converter. The lock key is `mcp3008-{clock}-{cs}-{miso}-{mosi}`, so an
//! operator looking at the lock directory can tell which bus a file serializes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const KEY_PREFIX: &str = "mcp3008";

/// The four pins that together identify one physical bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceWiring {
    pub clock: u8,
    pub cs: u8,
    pub miso: u8,
    pub mosi: u8,
}

impl DeviceWiring {
    pub fn new(clock: u8, cs: u8, miso: u8, mosi: u8) -> Self {
        Self {
            clock,
            cs,
            miso,
            mosi,
        }
    }

    /// Derive the host-wide lock key for this bus.
    pub fn lock_key(&self) -> LockKey {
        LockKey(format!(
            "{}-{}-{}-{}-{}",
            KEY_PREFIX, self.clock, self.cs, self.miso, self.mosi
        ))
    }
}

impl fmt::Display for DeviceWiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "clock={} cs={} miso={} mosi={}",
            self.clock, self.cs, self.miso, self.mosi
        )
    }
}

/// Name of a bus lock artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey(String);

impl LockKey {
    /// Parse a lock artifact name back into the wiring it serializes.
    ///
    /// Returns `None` for names that were not produced by [`DeviceWiring::lock_key`].
    pub fn parse(name: &str) -> Option<(LockKey, DeviceWiring)> {
        let rest = name.strip_prefix(KEY_PREFIX)?.strip_prefix('-')?;
        let pins: Vec<u8> = rest
            .split('-')
            .map(|part| part.parse::<u8>().ok())
            .collect::<Option<_>>()?;

        let [clock, cs, miso, mosi] = pins[..] else {
            return None;
        };
        let wiring = DeviceWiring::new(clock, cs, miso, mosi);

        // Reject non-canonical spellings such as leading zeros.
        let key = wiring.lock_key();
        (key.as_str() == name).then_some((key, wiring))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the lock artifact for this key inside `lock_dir`.
    pub fn path_in(&self, lock_dir: &Path) -> PathBuf {
        lock_dir.join(&self.0)
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
