//! Launch capability and process handles.

use std::path::{Path, PathBuf};

use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{LaunchError, LaunchResult};

/// Opaque handle to a launched server process.
pub trait ProcessHandle {
    /// Whether the process is still alive. A process that has exited or
    /// cannot be queried reports `false`.
    fn is_running(&mut self) -> bool;

    /// Request termination. Does not wait for the process to exit.
    fn terminate(&mut self);

    /// OS process id, if still known.
    fn id(&self) -> Option<u32>;
}

/// Something that can start the monitored server.
pub trait Launcher {
    type Handle: ProcessHandle;

    fn launch(&self) -> LaunchResult<Self::Handle>;
}

/// How to start the monitored server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Appended as the final argument when set.
    pub port: Option<u16>,
    pub working_dir: Option<PathBuf>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            port: None,
            working_dir: None,
        }
    }

    /// Spec for a server entry point, optionally run through an interpreter
    /// (`python server.py <port>`). The entry point is made absolute so the
    /// launch does not depend on later working-directory changes.
    pub fn entry_point(path: &Path, interpreter: Option<&str>, port: u16) -> LaunchResult<Self> {
        let entry = std::path::absolute(path).map_err(|source| LaunchError::EntryPoint {
            path: path.to_path_buf(),
            source,
        })?;

        let spec = match interpreter {
            Some(interpreter) => {
                LaunchSpec::new(interpreter).arg(entry.to_string_lossy().into_owned())
            }
            None => LaunchSpec::new(entry),
        };
        Ok(spec.with_port(port))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Full argument list passed to the program.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = self.args.clone();
        if let Some(port) = self.port {
            argv.push(port.to_string());
        }
        argv
    }
}

/// Spawns a [`LaunchSpec`] as a tokio child process.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    spec: LaunchSpec,
}

impl CommandLauncher {
    pub fn new(spec: LaunchSpec) -> Self {
        Self { spec }
    }
}

impl Launcher for CommandLauncher {
    type Handle = ChildHandle;

    fn launch(&self) -> LaunchResult<ChildHandle> {
        let mut cmd = Command::new(&self.spec.program);
        cmd.args(self.spec.argv());
        if let Some(dir) = &self.spec.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            program: self.spec.program.clone(),
            source,
        })?;

        debug!(
            program = %self.spec.program.display(),
            pid = ?child.id(),
            "server process spawned"
        );
        Ok(ChildHandle { child })
    }
}

/// Handle to a spawned child process.
#[derive(Debug)]
pub struct ChildHandle {
    child: Child,
}

impl ProcessHandle for ChildHandle {
    fn is_running(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(pid = ?self.child.id(), %status, "server process exited");
                false
            }
            Err(e) => {
                warn!(error = %e, "failed to query server process");
                false
            }
        }
    }

    fn terminate(&mut self) {
        let Some(pid) = self.child.id() else {
            // Already reaped.
            return;
        };

        #[cfg(unix)]
        {
            // SAFETY: `kill` has no memory-safety preconditions; `pid` is our own child.
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
            if rc == 0 {
                debug!(pid, "sent SIGTERM to server process");
                return;
            }
            warn!(pid, error = %std::io::Error::last_os_error(), "SIGTERM failed, killing");
        }

        if let Err(e) = self.child.start_kill() {
            warn!(pid, error = %e, "failed to kill server process");
        }
    }

    fn id(&self) -> Option<u32> {
        self.child.id()
    }
}
