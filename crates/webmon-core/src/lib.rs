//! webmon-core — outcome classification and retry policy for webmon.
//!
//! Every probe of the monitored server yields a [`ProbeOutcome`]. The
//! outcome is classified into an [`OutcomeKey`], and the key selects a
//! [`PolicyEntry`] from the [`Policy`] table loaded at startup.
//!
//! ```text
//! ProbeOutcome ──classify──▶ OutcomeKey ──lookup──▶ PolicyEntry { retry_times, action }
//! ```
//!
//! Keys missing from the table resolve to `{ retry_times: 0, action: Nothing }`,
//! so an unexpected status never triggers a restart.

pub mod config;
pub mod error;
pub mod policy;
pub mod types;

pub use config::{WebmonConfig, load_policy};
pub use error::{ConfigError, ConfigResult};
pub use policy::{Action, Policy, PolicyEntry};
pub use types::*;
