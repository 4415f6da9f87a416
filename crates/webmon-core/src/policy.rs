//! Policy table: outcome key → retry budget and corrective action.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::OutcomeKey;

/// Default probe timeout when a policy is built in code.
pub const DEFAULT_WAIT_TIME: Duration = Duration::from_secs(2);

/// Pause between two probes of the same cycle.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Pause between two monitoring cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Corrective action taken once an outcome exhausts its retry budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Terminate the monitored process and launch a new one.
    Restart,
    /// Log the failure and keep going.
    #[default]
    Nothing,
}

/// Retry budget and action for one outcome key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub retry_times: u32,
    pub action: Action,
}

impl PolicyEntry {
    pub fn new(retry_times: u32, action: Action) -> Self {
        Self { retry_times, action }
    }

    /// Total probes allowed in a cycle: the first one plus the retries.
    pub fn max_attempts(&self) -> u32 {
        self.retry_times.saturating_add(1)
    }
}

/// Immutable monitoring policy, built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    /// Probe timeout.
    pub wait_time: Duration,
    pub retry_interval: Duration,
    pub poll_interval: Duration,
    /// Outcome that never counts as a failure.
    pub healthy_key: OutcomeKey,
    entries: HashMap<OutcomeKey, PolicyEntry>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            wait_time: DEFAULT_WAIT_TIME,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            healthy_key: OutcomeKey::healthy(),
            entries: HashMap::new(),
        }
    }
}

impl Policy {
    /// Policy with no entries and the given probe timeout.
    pub fn new(wait_time: Duration) -> Self {
        Self {
            wait_time,
            ..Self::default()
        }
    }

    pub fn with_entry(mut self, key: OutcomeKey, entry: PolicyEntry) -> Self {
        self.entries.insert(key, entry);
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_healthy_key(mut self, key: OutcomeKey) -> Self {
        self.healthy_key = key;
        self
    }

    /// Entry for `key`, or `{ retry_times: 0, action: Nothing }` when absent.
    pub fn lookup(&self, key: &OutcomeKey) -> PolicyEntry {
        self.entries.get(key).copied().unwrap_or_default()
    }

    /// Whether the table has an explicit entry for `key`.
    pub fn contains(&self, key: &OutcomeKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
