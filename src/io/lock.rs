use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long a CLI write waits for another `ct` process by default
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const LOCK_FILE: &str = ".lock";

/// Exclusive advisory lock on a data directory.
///
/// Held for the whole load-modify-save cycle of a mutating command so two
/// `ct` processes never interleave writes to the same collection files.
/// Released when dropped.
#[derive(Debug)]
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("timed out waiting for {path}: another ct process is writing")]
    Timeout { path: PathBuf },
}

impl FileLock {
    /// Lock `data_dir`, polling until `timeout` elapses
    pub fn acquire(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = data_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let started = Instant::now();
        while try_lock(&file).is_err() {
            if started.elapsed() >= timeout {
                return Err(LockError::Timeout { path });
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        tracing::trace!(path = %path.display(), "acquired data directory lock");
        Ok(FileLock { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// The lock file is never removed; waiters must see the same inode.

#[cfg(unix)]
fn try_lock(file: &File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reacquire_after_drop() {
        let tmp = TempDir::new().unwrap();
        let lock = FileLock::acquire(tmp.path(), DEFAULT_LOCK_TIMEOUT).unwrap();
        assert!(lock.path().ends_with(".lock"));
        drop(lock);
        assert!(FileLock::acquire(tmp.path(), DEFAULT_LOCK_TIMEOUT).is_ok());
    }

    #[test]
    fn second_holder_times_out() {
        let tmp = TempDir::new().unwrap();
        let _held = FileLock::acquire(tmp.path(), DEFAULT_LOCK_TIMEOUT).unwrap();
        let second = FileLock::acquire(tmp.path(), Duration::from_millis(50));
        assert!(matches!(second, Err(LockError::Timeout { .. })));
    }

    #[test]
    fn missing_directory_is_open_error() {
        let tmp = TempDir::new().unwrap();
        let gone = tmp.path().join("nope");
        assert!(matches!(
            FileLock::acquire(&gone, Duration::from_millis(10)),
            Err(LockError::Open { .. })
        ));
    }
}
