//! webmon-supervisor — ownership of the monitored server process.
//!
//! A [`ProcessSupervisor`] owns exactly one [`ProcessHandle`] at a time.
//! Handles come from a [`Launcher`]; the production launcher spawns the
//! server entry point as a child process with the monitored port as its
//! final argument.
//!
//! ```text
//! ProcessSupervisor
//!   ├── Launcher::launch() → Handle     (start, replace, restart)
//!   ├── Handle::is_running() → bool     (never fails)
//!   └── Handle::terminate()             (best effort, SIGTERM on unix)
//! ```

pub mod error;
pub mod process;
pub mod supervisor;

pub use error::{LaunchError, LaunchResult};
pub use process::{ChildHandle, CommandLauncher, LaunchSpec, Launcher, ProcessHandle};
pub use supervisor::ProcessSupervisor;
