//! Single-instance lock on a pid file.
//!
//! The daemon holds an exclusive `flock` on a pid file under the runtime
//! directory for its whole lifetime. The lock is never explicitly
//! released; the OS drops it when the last descriptor closes, so a
//! crashed daemon leaves nothing stale behind. The file's content (our
//! pid) is advisory metadata for the replace protocol, not the lock
//! itself.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use nix::errno::Errno;
use nix::fcntl::{flock, FlockArg};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{debug, warn};
use xdpw_core::{DaemonError, DaemonResult};

/// File name of the instance lock under the runtime directory.
pub const LOCK_FILE_NAME: &str = "xdpw.pid";

/// Upper bound on the composed lock path length.
const LOCK_PATH_MAX: usize = 256;

/// How long a replaced instance gets to exit before SIGKILL.
const REPLACE_GRACE: Duration = Duration::from_secs(1);

/// Longest believable pid content in the lock file.
const PID_READ_MAX: usize = 15;

/// Exclusive ownership of the instance lock.
///
/// Dropping the value releases the lock. The pid file itself is left in
/// place for the next instance to reuse.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Acquires the instance lock under the runtime directory.
    ///
    /// With `replace` set, a running owner is sent SIGTERM, given
    /// [`REPLACE_GRACE`] to exit, then SIGKILL, and the acquisition is
    /// retried exactly once.
    pub fn acquire(replace: bool) -> DaemonResult<Self> {
        let path = lock_file_path(&xdpw_protocol::runtime_dir())?;
        Self::acquire_at(&path, replace)
    }

    /// Acquires the lock at an explicit path.
    pub fn acquire_at(path: &Path, replace: bool) -> DaemonResult<Self> {
        let mut replace = replace;
        // Two attempts at most: the retry after a replacement runs with
        // replace forced off, so a holder that survives the grace period
        // ends the acquisition for good.
        for _ in 0..2 {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(path)
                .map_err(DaemonError::LockIo)?;
            match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
                Ok(()) => {
                    let mut lock = Self {
                        file,
                        path: path.to_path_buf(),
                    };
                    lock.write_pid()?;
                    debug!(path = %lock.path.display(), "instance lock acquired");
                    return Ok(lock);
                }
                Err(Errno::EWOULDBLOCK) => {
                    let owner = read_owner(&file).unwrap_or_default();
                    if !replace {
                        return Err(DaemonError::AlreadyRunning {
                            pid: (!owner.is_empty()).then_some(owner),
                        });
                    }
                    let Some(pid) = parse_pid(&owner) else {
                        // No parsable owner pid means no safe target to
                        // signal; treat the lock as simply taken.
                        return Err(DaemonError::AlreadyRunning { pid: None });
                    };
                    warn!(pid, "replacing running instance");
                    terminate(pid);
                    replace = false;
                }
                Err(errno) => return Err(DaemonError::LockIo(errno.into())),
            }
        }
        Err(DaemonError::AlreadyRunning { pid: None })
    }

    /// Path of the held lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_pid(&mut self) -> DaemonResult<()> {
        let pid = std::process::id().to_string();
        self.file.set_len(0).map_err(DaemonError::LockIo)?;
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(DaemonError::LockIo)?;
        self.file
            .write_all(pid.as_bytes())
            .map_err(DaemonError::LockIo)?;
        self.file.sync_all().map_err(DaemonError::LockIo)?;
        Ok(())
    }
}

/// Composes the lock file path under `dir`.
///
/// A runtime directory long enough to push the composed path past
/// [`LOCK_PATH_MAX`] is rejected rather than truncated.
pub fn lock_file_path(dir: &Path) -> DaemonResult<PathBuf> {
    let composed = dir.join(LOCK_FILE_NAME);
    if composed.as_os_str().len() > LOCK_PATH_MAX {
        return Err(DaemonError::PathOverflow(LOCK_PATH_MAX));
    }
    Ok(composed)
}

fn read_owner(mut file: &File) -> io::Result<String> {
    let mut buf = [0u8; PID_READ_MAX];
    let n = file.read(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf[..n]).trim().to_string())
}

fn parse_pid(raw: &str) -> Option<i32> {
    raw.parse::<i32>().ok().filter(|pid| *pid > 0)
}

/// Terminates the current lock owner, escalating to SIGKILL after the
/// grace period. Signal errors are ignored; the owner may already be
/// gone, and the retry decides the outcome either way.
fn terminate(pid: i32) {
    let target = Pid::from_raw(pid);
    let _ = kill(target, Signal::SIGTERM);
    thread::sleep(REPLACE_GRACE);
    let _ = kill(target, Signal::SIGKILL);
}
