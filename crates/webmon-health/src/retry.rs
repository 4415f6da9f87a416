//! Retry engine: one monitoring cycle of bounded re-probing.
//!
//! The retry budget is fixed by the first outcome of the cycle. Retrying
//! continues while the freshly classified key equals that first key, and
//! stops early as soon as it changes, without looking up a new budget.

use tracing::debug;

use webmon_core::{OutcomeKey, Policy, PolicyEntry, ProbeOutcome};

use crate::checker::Probe;
use crate::events::{EventSink, MonitorEvent, emit};

/// Outcome of one monitoring cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleResult {
    /// Last observed outcome.
    pub final_outcome: ProbeOutcome,
    /// Key of `final_outcome`.
    pub outcome_key: OutcomeKey,
    /// Key of the first outcome, which selected the budget.
    pub tracked_key: OutcomeKey,
    /// Policy entry of `tracked_key`.
    pub entry: PolicyEntry,
    pub attempts: u32,
    pub max_attempts: u32,
    /// Probes actually issued.
    pub probes: u32,
}

impl CycleResult {
    /// Whether the cycle ended on the same outcome it started with.
    pub fn persisted(&self) -> bool {
        self.outcome_key == self.tracked_key
    }
}

/// Run one cycle: probe, then retry against the first outcome's budget.
///
/// Each spent retry is recorded as [`MonitorEvent::Attempt`]. Once the
/// attempt counter reaches the budget no further probe is issued.
pub async fn run_cycle<P, S>(policy: &Policy, probe: &P, sink: &mut S) -> CycleResult
where
    P: Probe + ?Sized,
    S: EventSink + ?Sized,
{
    let mut outcome = probe.probe().await;
    let mut probes = 1;

    let tracked_key = OutcomeKey::classify(&outcome);
    let entry = policy.lookup(&tracked_key);
    let max_attempts = entry.max_attempts();

    let mut outcome_key = tracked_key.clone();
    let mut attempts = 1;

    while attempts < max_attempts && outcome_key == tracked_key {
        emit(
            sink,
            MonitorEvent::Attempt {
                attempt: attempts,
                max: max_attempts,
                outcome,
            },
        );
        attempts += 1;
        if attempts >= max_attempts {
            break;
        }

        tokio::time::sleep(policy.retry_interval).await;
        outcome = probe.probe().await;
        probes += 1;
        outcome_key = OutcomeKey::classify(&outcome);
    }

    debug!(
        key = %tracked_key,
        last = %outcome_key,
        attempts,
        max_attempts,
        probes,
        "cycle finished"
    );

    CycleResult {
        final_outcome: outcome,
        outcome_key,
        tracked_key,
        entry,
        attempts,
        max_attempts,
        probes,
    }
}
