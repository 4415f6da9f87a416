//! Action dispatcher: turn a finished cycle into a log record and, when
//! the policy asks for it, a server restart.

use webmon_core::{Action, Policy};
use webmon_supervisor::{LaunchResult, Launcher, ProcessSupervisor};

use crate::events::{EventSink, MonitorEvent, emit};
use crate::retry::CycleResult;

/// What the dispatcher concluded for a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Healthy outcome, or the outcome changed during retries.
    Healthy,
    /// Undesirable outcome persisted; the policy action is `nothing`.
    Failed,
    /// Undesirable outcome persisted and the server was restarted.
    Restarted,
}

/// Apply the policy entry of the cycle's first outcome to a finished cycle.
///
/// A cycle fails when its last outcome still carries the key that started
/// it and that key is not `policy.healthy_key`. The action is taken as
/// configured; only the healthy key is exempt from the failure branch.
pub fn dispatch<L, S>(
    result: &CycleResult,
    policy: &Policy,
    supervisor: &mut ProcessSupervisor<L>,
    sink: &mut S,
) -> LaunchResult<Decision>
where
    L: Launcher,
    S: EventSink + ?Sized,
{
    if !result.persisted() || result.tracked_key == policy.healthy_key {
        emit(
            sink,
            MonitorEvent::Success {
                outcome: result.final_outcome,
                attempts: result.attempts,
            },
        );
        return Ok(Decision::Healthy);
    }

    emit(
        sink,
        MonitorEvent::AttemptFailed {
            attempt: result.attempts,
            max: result.max_attempts,
            outcome: result.final_outcome,
        },
    );

    match policy.lookup(&result.tracked_key).action {
        Action::Restart => {
            supervisor.restart()?;
            emit(
                sink,
                MonitorEvent::RestartedByPolicy {
                    key: result.tracked_key.clone(),
                },
            );
            Ok(Decision::Restarted)
        }
        Action::Nothing => Ok(Decision::Failed),
    }
}
