//! Monitor error types.

use thiserror::Error;

use webmon_supervisor::LaunchError;

pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors that stop the monitor loop.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("server launch failed: {0}")]
    Launch(#[from] LaunchError),
}
