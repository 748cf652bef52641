//! Lock metadata written into a held artifact, and owner liveness checks.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata stored in a held lock artifact.
///
/// A clean release truncates the artifact, so metadata found in an artifact
/// nobody holds was left by a holder that never released.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockMetadata {
    /// Owner of the lock (e.g., `pi@greenhouse`).
    pub owner: String,

    /// Process ID of the lock holder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// Timestamp when the lock was taken (RFC3339).
    pub created_at: DateTime<Utc>,

    /// Device identity of the reader holding the bus.
    pub device: String,
}

impl LockMetadata {
    /// Metadata for the current process, stamped now.
    pub fn new(device: &str) -> Self {
        Self {
            owner: get_owner_string(),
            pid: Some(std::process::id()),
            created_at: Utc::now(),
            device: device.to_string(),
        }
    }

    /// Parse artifact contents. Empty or unreadable contents mean "no owner recorded".
    pub fn parse(content: &str) -> Option<Self> {
        if content.trim().is_empty() {
            return None;
        }
        serde_json::from_str(content).ok()
    }

    /// Read metadata from an artifact on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Option<Self>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::parse(&content))
    }

    /// Serialize lock metadata to JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Calculate the age of the lock.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let seconds = age.num_seconds();
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds % 60)
        } else {
            format!("{}s", seconds.max(0))
        }
    }

    /// Whether the lock has been held longer than `stale_after`.
    pub fn is_stale(&self, stale_after: std::time::Duration) -> bool {
        Duration::from_std(stale_after)
            .map(|limit| self.age() > limit)
            .unwrap_or(false)
    }

    /// Host part of `owner`.
    pub fn host(&self) -> &str {
        self.owner
            .rsplit_once('@')
            .map(|(_, host)| host)
            .unwrap_or("")
    }

    /// Whether the recorded owner is known to have exited.
    ///
    /// Only owners on this host with a recorded pid can be checked; anything
    /// else is assumed alive.
    pub fn owner_is_gone(&self) -> bool {
        match self.pid {
            Some(pid) if self.host() == current_host() => !process_alive(pid),
            _ => false,
        }
    }
}

/// Get the owner string for lock metadata.
pub(crate) fn get_owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, current_host())
}

fn current_host() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(target_os = "linux")]
pub(crate) fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn process_alive(_pid: u32) -> bool {
    // No cheap liveness probe; never declare an owner dead.
    true
}
