//! Lock acquisition, listing, and clearing operations.

use super::guard::BusLock;
use super::metadata::LockMetadata;
use super::types::{LockError, LockInfo, LockSettings, LockState};
use crate::error::{AdcError, Result};
use crate::logging::DeviceLogger;
use crate::logging::prelude::*;
use crate::wiring::{DeviceWiring, LockKey};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

impl BusLock {
    /// Take exclusive ownership of the bus named by `key`, waiting at most
    /// `settings.timeout` (capped at [`MAX_TIMEOUT`](super::MAX_TIMEOUT)).
    ///
    /// The wait polls a non-blocking advisory lock on the artifact. When the
    /// wait runs out, the current holder is checked: if it has exited or has
    /// held the bus longer than `settings.stale_after`, its artifact is removed
    /// and `StaleLockRecovered` is returned so the next attempt starts clean.
    /// An artifact that is unlocked but still names a dead owner is treated
    /// the same way without waiting.
    ///
    /// # Returns
    ///
    /// * `Ok(BusLock)` - The bus is held until the handle is released or dropped
    /// * `Err(LockError::AcquireTimeout)` - Busy for the whole wait, holder alive
    /// * `Err(LockError::StaleLockRecovered)` - Abandoned artifact removed
    /// * `Err(LockError::Io)` - The lock directory or artifact is unusable
    pub fn acquire(
        key: &LockKey,
        settings: &LockSettings,
        logger: &DeviceLogger,
    ) -> std::result::Result<BusLock, LockError> {
        let path = key.path_in(&settings.lock_dir);
        ensure_lock_dir(&settings.lock_dir)?;

        let started = Instant::now();
        let deadline = started
            .checked_add(settings.effective_timeout())
            .unwrap_or(started);

        loop {
            let file = open_artifact(&path)?;

            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    // Someone may have removed the artifact between our open and
                    // our lock; a lock on an unlinked inode excludes nobody.
                    if is_current_artifact(&file, &path)? {
                        return claim(key, path, file, logger);
                    }
                    logger.in_scope(|| debug!(lock = %key, "bus lock artifact replaced; retrying"));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(io_error(&path, e)),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(recover_stale(key, &path, settings, logger));
            }
            thread::sleep(settings.poll_interval.min(deadline - now));
        }
    }
}

fn io_error(path: &Path, source: io::Error) -> LockError {
    LockError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn ensure_lock_dir(lock_dir: &Path) -> std::result::Result<(), LockError> {
    if lock_dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(lock_dir).map_err(|e| io_error(lock_dir, e))
}

fn open_artifact(path: &Path) -> std::result::Result<File, LockError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| io_error(path, e))
}

#[cfg(unix)]
fn is_current_artifact(file: &File, path: &Path) -> std::result::Result<bool, LockError> {
    use std::os::unix::fs::MetadataExt;

    let held = file.metadata().map_err(|e| io_error(path, e))?;
    match fs::metadata(path) {
        Ok(on_disk) => Ok(held.dev() == on_disk.dev() && held.ino() == on_disk.ino()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error(path, e)),
    }
}

#[cfg(not(unix))]
fn is_current_artifact(_file: &File, path: &Path) -> std::result::Result<bool, LockError> {
    Ok(path.exists())
}

/// We hold the advisory lock: check for a crashed previous holder, then stamp
/// our own metadata.
fn claim(
    key: &LockKey,
    path: PathBuf,
    mut file: File,
    logger: &DeviceLogger,
) -> std::result::Result<BusLock, LockError> {
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| io_error(&path, e))?;

    if let Some(previous) = LockMetadata::parse(&content)
        && previous.owner_is_gone()
    {
        logger.in_scope(|| {
            warn!(
                lock = %key,
                owner = %previous.owner,
                pid = ?previous.pid,
                "bus lock left behind by exited process; removing it"
            );
        });
        fs::remove_file(&path).map_err(|e| io_error(&path, e))?;
        // Dropping `file` releases the advisory lock on the unlinked inode.
        return Err(LockError::StaleLockRecovered {
            key: key.clone(),
            owner: previous.owner,
        });
    }

    let metadata = LockMetadata::new(logger.device());
    let json = metadata
        .to_json()
        .map_err(|e| io_error(&path, io::Error::other(e)))?;

    write_metadata(&mut file, &json).map_err(|e| io_error(&path, e))?;

    logger.in_scope(|| trace!(lock = %key, "bus lock acquired"));
    Ok(BusLock::new(key.clone(), path, file, logger.clone()))
}

fn write_metadata(file: &mut File, json: &str) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(json.as_bytes())?;
    file.sync_data()
}

/// The wait ran out. Decide between "busy" and "abandoned".
fn recover_stale(
    key: &LockKey,
    path: &Path,
    settings: &LockSettings,
    logger: &DeviceLogger,
) -> LockError {
    let timeout = LockError::AcquireTimeout {
        key: key.clone(),
        waited: settings.effective_timeout(),
    };

    let holder = match LockMetadata::from_file(path) {
        Ok(Some(holder)) => holder,
        // No owner recorded: nothing to judge, so assume a live holder.
        Ok(None) => return timeout,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return timeout,
        Err(e) => return io_error(path, e),
    };

    let gone = holder.owner_is_gone();
    let hung = settings
        .stale_after
        .is_some_and(|stale_after| holder.is_stale(stale_after));
    if !gone && !hung {
        return timeout;
    }

    // Known risk: a holder that is alive but slow loses its exclusivity here.
    logger.in_scope(|| {
        warn!(
            lock = %key,
            owner = %holder.owner,
            pid = ?holder.pid,
            age = %holder.age_string(),
            owner_exited = gone,
            "breaking stale bus lock after {:?}",
            settings.effective_timeout()
        );
    });

    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return io_error(path, e),
    }

    LockError::StaleLockRecovered {
        key: key.clone(),
        owner: holder.owner,
    }
}

/// Inspect one artifact without disturbing a holder.
fn inspect(
    path: PathBuf,
    key: LockKey,
    wiring: DeviceWiring,
    stale_after: Option<Duration>,
) -> Result<LockInfo> {
    let file = File::open(&path).map_err(|e| {
        AdcError::LockError(format!("failed to open '{}': {}", path.display(), e))
    })?;

    let held = match FileExt::try_lock_shared(&file) {
        Ok(()) => {
            let _ = FileExt::unlock(&file);
            false
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => true,
        Err(e) => {
            return Err(AdcError::LockError(format!(
                "failed to probe '{}': {}",
                path.display(),
                e
            )));
        }
    };

    let metadata = LockMetadata::from_file(&path).map_err(|e| {
        AdcError::LockError(format!("failed to read '{}': {}", path.display(), e))
    })?;

    let state = match (&metadata, held) {
        (Some(meta), true)
            if meta.owner_is_gone() || stale_after.is_some_and(|s| meta.is_stale(s)) =>
        {
            LockState::Stale
        }
        (_, true) => LockState::Held,
        (Some(_), false) => LockState::Stale,
        (None, false) => LockState::Idle,
    };

    Ok(LockInfo {
        path,
        key,
        wiring,
        metadata,
        state,
    })
}

/// List every bus lock artifact in `lock_dir`.
///
/// Files whose names are not bus lock keys are skipped.
pub fn list_locks(lock_dir: &Path, stale_after: Option<Duration>) -> Result<Vec<LockInfo>> {
    let mut locks = Vec::new();

    if !lock_dir.exists() {
        return Ok(locks);
    }

    let entries = fs::read_dir(lock_dir).map_err(|e| {
        AdcError::UserError(format!(
            "failed to read lock directory '{}': {}",
            lock_dir.display(),
            e
        ))
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            AdcError::UserError(format!("failed to read lock directory entry: {}", e))
        })?;

        let path = entry.path();
        let Some((key, wiring)) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(LockKey::parse)
        else {
            continue;
        };

        match inspect(path, key, wiring, stale_after) {
            Ok(info) => locks.push(info),
            // Removed between read_dir and open.
            Err(_) if !entry.path().exists() => continue,
            Err(e) => return Err(e),
        }
    }

    // Sort by key for consistent output
    locks.sort_by(|a, b| a.key.as_str().cmp(b.key.as_str()));

    Ok(locks)
}

/// Remove a lock artifact by key.
///
/// The caller is responsible for deciding that clearing is appropriate (the
/// CLI insists on `--force`). Returns what the artifact looked like just
/// before removal.
pub fn clear_lock(lock_dir: &Path, lock_id: &str, stale_after: Option<Duration>) -> Result<LockInfo> {
    let (key, wiring) = LockKey::parse(lock_id).ok_or_else(|| {
        AdcError::UserError(format!(
            "'{}' is not a bus lock key (expected mcp3008-<clock>-<cs>-<miso>-<mosi>)",
            lock_id
        ))
    })?;

    let path = key.path_in(lock_dir);
    if !path.exists() {
        return Err(AdcError::UserError(format!(
            "lock '{}' does not exist at: {}",
            lock_id,
            path.display()
        )));
    }

    let info = inspect(path, key, wiring, stale_after)?;

    fs::remove_file(&info.path).map_err(|e| {
        AdcError::LockError(format!(
            "failed to clear lock '{}': {}",
            info.path.display(),
            e
        ))
    })?;

    Ok(info)
}
