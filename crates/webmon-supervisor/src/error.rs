//! Process launch errors.

use std::path::PathBuf;

use thiserror::Error;

pub type LaunchResult<T> = Result<T, LaunchError>;

/// The monitored server could not be started.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to resolve server entry point {path}: {source}")]
    EntryPoint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
