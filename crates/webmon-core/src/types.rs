//! Probe outcomes and their canonical keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Result of a single probe attempt against the monitored endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The server answered with this HTTP status code.
    Status(u16),
    /// No answer within the configured wait time.
    Timeout,
    /// Connection or protocol failure.
    Error,
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Status(code) => write!(f, "{code}"),
            ProbeOutcome::Timeout => f.write_str("timeout"),
            ProbeOutcome::Error => f.write_str("error"),
        }
    }
}

/// Canonical lookup key derived from a [`ProbeOutcome`]: `http<code>`,
/// `timeout` or `error`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeKey(String);

impl OutcomeKey {
    pub const TIMEOUT: &'static str = "timeout";
    pub const ERROR: &'static str = "error";
    const HTTP_PREFIX: &'static str = "http";

    /// Classify a probe outcome. Total and deterministic.
    pub fn classify(outcome: &ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Status(code) => OutcomeKey(format!("{}{code}", Self::HTTP_PREFIX)),
            ProbeOutcome::Timeout => OutcomeKey(Self::TIMEOUT.to_string()),
            ProbeOutcome::Error => OutcomeKey(Self::ERROR.to_string()),
        }
    }

    /// Parse a key written in a policy document.
    ///
    /// Accepts `timeout`, `error`, and `http` followed by a status in 100..=599.
    pub fn parse(raw: &str) -> ConfigResult<Self> {
        let key = raw.trim();
        if key == Self::TIMEOUT || key == Self::ERROR {
            return Ok(OutcomeKey(key.to_string()));
        }
        let code = key
            .strip_prefix(Self::HTTP_PREFIX)
            .filter(|digits| digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u16>().ok())
            .filter(|code| (100..=599).contains(code))
            .ok_or_else(|| ConfigError::InvalidOutcomeKey(raw.to_string()))?;
        Ok(Self::classify(&ProbeOutcome::Status(code)))
    }

    /// The key of a plain `200 OK`, the baseline healthy response.
    pub fn healthy() -> Self {
        Self::classify(&ProbeOutcome::Status(200))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<ProbeOutcome> for OutcomeKey {
    fn from(outcome: ProbeOutcome) -> Self {
        OutcomeKey::classify(&outcome)
    }
}

impl fmt::Display for OutcomeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
