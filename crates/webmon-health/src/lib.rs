//! webmon-health — health probing and self-healing for one monitored server.
//!
//! # Architecture
//!
//! ```text
//! Monitor
//!   ├── CheckLiveness   ProcessSupervisor::is_running()  (dead → replace, sleep)
//!   ├── Probing         retry::run_cycle() → CycleResult
//!   │     └── Probe::probe() → ProbeOutcome → OutcomeKey → PolicyEntry
//!   ├── Deciding        dispatch::dispatch() → Decision (restart or log)
//!   └── Sleeping        poll interval, then CheckLiveness again
//! ```
//!
//! Every observable step is written to an [`EventSink`] as a [`MonitorEvent`]
//! and mirrored to `tracing`.

pub mod checker;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod monitor;
pub mod retry;

pub use checker::{HttpProbe, Probe};
pub use dispatch::{Decision, dispatch};
pub use error::{MonitorError, MonitorResult};
pub use events::{EventSink, FileSink, MemorySink, MonitorEvent, emit};
pub use monitor::{CycleReport, Monitor, Phase};
pub use retry::{CycleResult, run_cycle};
