use std::fs::File;
use std::io;
use std::path::Path;

/// Lock file the daemon holds for as long as it serves a config root.
pub const LOCK_FILE: &str = "daemon.lock";

/// Answers whether a daemon currently owns a config root.
pub trait LockProbe: Send + Sync {
    fn is_locked(&self, config_root: &Path) -> bool;
}

/// Probes `<root>/daemon.lock` with a non-blocking exclusive `flock`.
///
/// Acquiring the lock means no daemon holds it; it is released again
/// immediately. A missing lock file means no daemon has ever run there.
/// Any other failure is reported as locked so the caller tries the daemon.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLockProbe;

impl LockProbe for FileLockProbe {
    fn is_locked(&self, config_root: &Path) -> bool {
        let path = config_root.join(LOCK_FILE);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return false,
            Err(e) => {
                tracing::warn!(path = %path.display(), "cannot open daemon lock: {}", e);
                return true;
            }
        };

        match try_flock_exclusive(&file) {
            Ok(true) => {
                if let Err(e) = unlock(&file) {
                    tracing::debug!("failed to release probe lock: {}", e);
                }
                false
            }
            Ok(false) => true,
            Err(e) => {
                tracing::warn!(path = %path.display(), "daemon lock probe failed: {}", e);
                true
            }
        }
    }
}

/// `Ok(true)` when the exclusive lock was acquired, `Ok(false)` when it is held elsewhere.
fn try_flock_exclusive(file: &File) -> io::Result<bool> {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        let fd = file.as_raw_fd();
        // SAFETY: fd is a valid descriptor owned by `file` for the duration of the call.
        let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
        if result == 0 {
            return Ok(true);
        }
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(libc::EWOULDBLOCK)
        {
            return Ok(false);
        }
        Err(err)
    }
    #[cfg(not(unix))]
    {
        let _ = file;
        Ok(true)
    }
}

fn unlock(file: &File) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        // SAFETY: as above.
        let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    #[cfg(not(unix))]
    let _ = file;
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::io::AsRawFd;

    use super::*;

    #[test]
    fn test_missing_lock_file_is_unlocked() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(!FileLockProbe.is_locked(dir.path()));
        // probing never creates the file
        assert!(!dir.path().join(LOCK_FILE).exists());
    }

    #[test]
    fn test_unheld_lock_file_is_unlocked() {
        let dir = tempfile::TempDir::new().unwrap();
        File::create(dir.path().join(LOCK_FILE)).unwrap();
        assert!(!FileLockProbe.is_locked(dir.path()));
        // the probe released its lock, so a second probe agrees
        assert!(!FileLockProbe.is_locked(dir.path()));
    }

    #[test]
    fn test_held_lock_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let holder = File::create(dir.path().join(LOCK_FILE)).unwrap();
        let rc = unsafe { libc::flock(holder.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        assert_eq!(rc, 0);

        assert!(FileLockProbe.is_locked(dir.path()));

        drop(holder);
        assert!(!FileLockProbe.is_locked(dir.path()));
    }
}
