//! The held bus lock.

use crate::logging::DeviceLogger;
use crate::logging::prelude::*;
use crate::wiring::LockKey;
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Exclusive ownership of one bus, backed by an advisory lock on its artifact.
///
/// Releasing truncates the artifact (so no owner is recorded any more) and
/// drops the advisory lock. The artifact file itself stays in place for
/// operators to inspect. Release runs on drop as well, so a holder that
/// returns early or unwinds still gives the bus back.
#[derive(Debug)]
pub struct BusLock {
    key: LockKey,
    path: PathBuf,
    file: Option<File>,
    logger: DeviceLogger,
}

impl BusLock {
    pub(super) fn new(key: LockKey, path: PathBuf, file: File, logger: DeviceLogger) -> Self {
        Self {
            key,
            path,
            file: Some(file),
            logger,
        }
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    /// Get the path to the lock artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this handle still holds the bus.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Give the bus back.
    ///
    /// Idempotent. Cleanup failures are logged, never returned: once this
    /// returns the handle no longer holds the bus either way, because closing
    /// the file drops the advisory lock.
    pub fn release(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };

        if let Err(e) = file.set_len(0) {
            self.logger.in_scope(|| {
                warn!(lock = %self.key, error = %e, "failed to clear bus lock metadata");
            });
        }
        if let Err(e) = FileExt::unlock(&file) {
            self.logger.in_scope(|| {
                warn!(lock = %self.key, error = %e, "failed to unlock bus lock; closing handle");
            });
        }
        self.logger
            .in_scope(|| trace!(lock = %self.key, "bus lock released"));
    }
}

impl Drop for BusLock {
    fn drop(&mut self) {
        self.release();
    }
}
