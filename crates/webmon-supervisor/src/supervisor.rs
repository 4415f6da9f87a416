//! Process supervisor — sole owner of the monitored process handle.

use tracing::{info, warn};

use crate::error::LaunchResult;
use crate::process::{Launcher, ProcessHandle};

/// Owns the launcher and the single live handle of the monitored server.
///
/// The handle is only swapped inside [`replace`](Self::replace) and
/// [`restart`](Self::restart), so callers never observe two live handles.
pub struct ProcessSupervisor<L: Launcher> {
    launcher: L,
    handle: L::Handle,
    restarts: u64,
}

impl<L: Launcher> ProcessSupervisor<L> {
    /// Launch the server for the first time.
    pub fn start(launcher: L) -> LaunchResult<Self> {
        let handle = launcher.launch()?;
        info!(pid = ?handle.id(), "server process started");
        Ok(Self {
            launcher,
            handle,
            restarts: 0,
        })
    }

    pub fn is_running(&mut self) -> bool {
        self.handle.is_running()
    }

    /// Launch a replacement for a process that is no longer running.
    ///
    /// The new handle is obtained before the old one is dropped; if the
    /// launch fails the old handle stays in place.
    pub fn replace(&mut self) -> LaunchResult<()> {
        let new = self.launcher.launch()?;
        let old = std::mem::replace(&mut self.handle, new);
        self.restarts += 1;
        info!(old_pid = ?old.id(), pid = ?self.handle.id(), "server process replaced");
        Ok(())
    }

    /// Terminate the current process and launch a new one.
    pub fn restart(&mut self) -> LaunchResult<()> {
        let old_pid = self.handle.id();
        self.handle.terminate();
        self.handle = self.launcher.launch()?;
        self.restarts += 1;
        info!(?old_pid, pid = ?self.handle.id(), "server process restarted");
        Ok(())
    }

    /// Terminate the process if it is still running.
    pub fn shutdown(&mut self) {
        if self.handle.is_running() {
            warn!(pid = ?self.handle.id(), "terminating server process");
            self.handle.terminate();
        }
    }

    /// Number of replacements and restarts since [`start`](Self::start).
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn handle(&self) -> &L::Handle {
        &self.handle
    }
}
