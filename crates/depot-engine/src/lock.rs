use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

// Liveness of a recorded owner is decided by signaling the pid, never by
// lock-file existence. Injectable so tests need not spawn processes.
pub trait ProcessProbe {
    fn is_alive(&self, pid: u32) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe;

impl ProcessProbe for HostProbe {
    fn is_alive(&self, pid: u32) -> Result<bool> {
        match kill(Pid::from_raw(pid as i32), None) {
            Ok(()) => Ok(true),
            Err(Errno::ESRCH) => Ok(false),
            // The process exists but belongs to someone else.
            Err(Errno::EPERM) => Ok(true),
            Err(err) => Err(anyhow!("cannot probe pid {pid}: {err}")),
        }
    }
}

#[derive(Debug)]
pub enum LockAcquire {
    Acquired(SessionLock),
    Busy { owner: u32 },
}

// The host-wide exclusive-session lock: a file whose sole content is the
// owning pid. Acquisition is attempt-once; a live owner means Busy, never
// waiting or queueing.
#[derive(Debug)]
pub struct SessionLock {
    path: PathBuf,
    released: bool,
}

impl SessionLock {
    pub fn acquire(path: &Path, pid: u32, probe: &dyn ProcessProbe) -> Result<LockAcquire> {
        loop {
            match try_claim(path, pid) {
                Ok(()) => {
                    return Ok(LockAcquire::Acquired(SessionLock {
                        path: path.to_path_buf(),
                        released: false,
                    }));
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to claim lock: {}", path.display()));
                }
            }

            let raw = match fs::read_to_string(path) {
                Ok(raw) => raw,
                // Raced with the owner's release; try to claim again.
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to read lock: {}", path.display()));
                }
            };

            match raw.trim().parse::<u32>() {
                Err(_) => {
                    // Bogus pid data; the lock is corrupt. Throw it away.
                    remove_lock_file(path)?;
                }
                Ok(owner) => {
                    if probe.is_alive(owner)? {
                        return Ok(LockAcquire::Busy { owner });
                    }
                    // Stale: the recorded owner is gone.
                    remove_lock_file(path)?;
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Idempotent: releasing an already-released lock is a no-op.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        remove_lock_file(&self.path)?;
        self.released = true;
        Ok(())
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn try_claim(path: &Path, pid: u32) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options.open(path)?;
    file.write_all(format!("{pid}\n").as_bytes())?;
    file.flush()
}

fn remove_lock_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => {
            Err(err).with_context(|| format!("failed to remove lock: {}", path.display()))
        }
    }
}
