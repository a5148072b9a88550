//! Cross-process exclusive lock on a sibling lock file
//!
//! Each acquisition opens its own handle, so the lock also excludes other
//! threads of the same process.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{StoreError, StoreResult};

/// Held lock; released on drop
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
    acquired_at: Instant,
}

impl LockGuard {
    /// Acquire the lock at `path`, polling every `poll` until `timeout`
    ///
    /// The lock file and its directory are created when missing.
    ///
    /// # Errors
    /// - [`StoreError::LockTimeout`] if the lock stays held past `timeout`
    /// - [`StoreError::Io`] if the lock file cannot be opened or locked
    pub fn acquire(path: &Path, timeout: Duration, poll: Duration) -> StoreResult<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|err| StoreError::io(dir, err))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|err| StoreError::io(path, err))?;

        let start = Instant::now();
        let mut attempts = 0_u32;
        loop {
            attempts += 1;
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    tracing::debug!(
                        path = %path.display(),
                        attempts,
                        waited_ms = start.elapsed().as_millis(),
                        "lock acquired"
                    );
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                        acquired_at: Instant::now(),
                    });
                }
                Err(err) if is_contended(&err) => {}
                Err(err) => return Err(StoreError::io(path, err)),
            }
            let waited = start.elapsed();
            if waited >= timeout {
                tracing::warn!(path = %path.display(), attempts, "lock acquisition timed out");
                return Err(StoreError::LockTimeout {
                    path: path.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(poll.min(timeout - waited));
        }
    }

    /// Lock file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to release lock");
            return;
        }
        tracing::debug!(
            path = %self.path.display(),
            held_ms = self.acquired_at.elapsed().as_millis(),
            "lock released"
        );
    }
}

fn is_contended(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::TempDir;

    const POLL: Duration = Duration::from_millis(5);

    #[test]
    fn acquire_and_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(".config.lock");
        let guard = LockGuard::acquire(&path, Duration::from_secs(1), POLL).unwrap();
        assert_eq!(guard.path(), path);
        drop(guard);
        LockGuard::acquire(&path, Duration::from_secs(1), POLL).unwrap();
    }

    #[test]
    fn second_holder_times_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".config.lock");
        let _held = LockGuard::acquire(&path, Duration::from_secs(1), POLL).unwrap();
        let err = LockGuard::acquire(&path, Duration::from_millis(50), POLL).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn waiter_proceeds_after_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".config.lock");
        let held = LockGuard::acquire(&path, Duration::from_secs(1), POLL).unwrap();
        let (tx, rx) = mpsc::channel();
        let waiter_path = path.clone();
        let waiter = thread::spawn(move || {
            tx.send(()).unwrap();
            LockGuard::acquire(&waiter_path, Duration::from_secs(5), POLL).map(|_| ())
        });
        rx.recv().unwrap();
        thread::sleep(Duration::from_millis(30));
        drop(held);
        assert!(waiter.join().unwrap().is_ok());
    }
}
