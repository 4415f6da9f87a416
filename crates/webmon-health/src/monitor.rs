//! Monitor loop — the top-level driver for one supervised server.
//!
//! Each cycle moves through explicit phases:
//!
//! ```text
//! CheckLiveness ─dead──────────────────────────────┐
//!      │ alive                                      ▼
//!   Probing ──CycleResult──▶ Deciding ──────────▶ Sleeping ──▶ CheckLiveness
//! ```
//!
//! The supervisor's handle only changes in `CheckLiveness` and `Deciding`.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use webmon_core::Policy;
use webmon_supervisor::{LaunchError, Launcher, ProcessSupervisor};

use crate::checker::Probe;
use crate::dispatch::{Decision, dispatch};
use crate::error::{MonitorError, MonitorResult};
use crate::events::{EventSink, MonitorEvent, emit};
use crate::retry::{CycleResult, run_cycle};

/// Position of the monitor in its cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    CheckLiveness,
    Probing,
    Deciding(CycleResult),
    Sleeping,
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// The server was dead and got relaunched; nothing was probed.
    Restarted,
    Probed {
        result: CycleResult,
        decision: Decision,
    },
}

/// Drives probing, retries and corrective actions for one server.
pub struct Monitor<P, L, S>
where
    P: Probe,
    L: Launcher,
    S: EventSink,
{
    policy: Policy,
    probe: P,
    supervisor: ProcessSupervisor<L>,
    sink: S,
    cycles: u64,
}

impl<P, L, S> Monitor<P, L, S>
where
    P: Probe,
    L: Launcher,
    S: EventSink,
{
    pub fn new(policy: Policy, probe: P, supervisor: ProcessSupervisor<L>, sink: S) -> Self {
        Self {
            policy,
            probe,
            supervisor,
            sink,
            cycles: 0,
        }
    }

    /// Perform one phase transition.
    pub async fn step(&mut self, phase: Phase) -> MonitorResult<Phase> {
        match phase {
            Phase::CheckLiveness => {
                if self.check_liveness()? {
                    Ok(Phase::Probing)
                } else {
                    Ok(Phase::Sleeping)
                }
            }
            Phase::Probing => Ok(Phase::Deciding(self.probe_cycle().await)),
            Phase::Deciding(result) => {
                self.decide(&result)?;
                Ok(Phase::Sleeping)
            }
            Phase::Sleeping => {
                tokio::time::sleep(self.policy.poll_interval).await;
                Ok(Phase::CheckLiveness)
            }
        }
    }

    /// Run one cycle from `CheckLiveness` up to, not including, `Sleeping`.
    pub async fn run_cycle(&mut self) -> MonitorResult<CycleReport> {
        if !self.check_liveness()? {
            return Ok(CycleReport::Restarted);
        }
        let result = self.probe_cycle().await;
        let decision = self.decide(&result)?;
        Ok(CycleReport::Probed { result, decision })
    }

    /// Loop until `shutdown` is set to `true` or the server cannot be launched.
    ///
    /// Shutdown is only observed while sleeping between cycles; a probe in
    /// flight always completes first. A dropped sender never stops the loop.
    /// The server is terminated on the way out.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> MonitorResult<()> {
        info!(
            wait_time = ?self.policy.wait_time,
            poll_interval = ?self.policy.poll_interval,
            entries = self.policy.len(),
            "monitor loop starting"
        );

        let mut listening = true;
        let mut phase = Phase::CheckLiveness;
        loop {
            phase = match phase {
                Phase::Sleeping => {
                    if self.pause(&mut shutdown, &mut listening).await {
                        debug!("monitor loop shutting down");
                        break;
                    }
                    Phase::CheckLiveness
                }
                other => self.step(other).await?,
            };
        }

        self.supervisor.shutdown();
        info!(cycles = self.cycles, restarts = self.supervisor.restarts(), "monitor loop stopped");
        Ok(())
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn supervisor(&self) -> &ProcessSupervisor<L> {
        &self.supervisor
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Completed cycles, including liveness restarts.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// `true` when the server is alive; otherwise relaunch it and return `false`.
    fn check_liveness(&mut self) -> MonitorResult<bool> {
        if self.supervisor.is_running() {
            return Ok(true);
        }
        self.supervisor.replace().map_err(|e| self.fatal(e))?;
        emit(&mut self.sink, MonitorEvent::RestartedNotRunning);
        self.cycles += 1;
        Ok(false)
    }

    /// Sleep one poll interval. Returns `true` if shutdown was requested.
    ///
    /// Once the sender is gone, `listening` is cleared and later pauses are
    /// plain sleeps.
    async fn pause(&self, shutdown: &mut watch::Receiver<bool>, listening: &mut bool) -> bool {
        let sleep = tokio::time::sleep(self.policy.poll_interval);
        tokio::pin!(sleep);

        while *listening {
            let changed = tokio::select! {
                _ = &mut sleep => return false,
                changed = shutdown.changed() => changed,
            };
            match changed {
                Ok(()) if *shutdown.borrow_and_update() => return true,
                Ok(()) => {}
                Err(_) => {
                    warn!("shutdown channel closed, monitoring continues");
                    *listening = false;
                }
            }
        }

        sleep.await;
        false
    }

    async fn probe_cycle(&mut self) -> CycleResult {
        run_cycle(&self.policy, &self.probe, &mut self.sink).await
    }

    fn decide(&mut self, result: &CycleResult) -> MonitorResult<Decision> {
        let decision = dispatch(result, &self.policy, &mut self.supervisor, &mut self.sink)
            .map_err(|e| self.fatal(e))?;
        self.cycles += 1;
        Ok(decision)
    }

    fn fatal(&mut self, error: LaunchError) -> MonitorError {
        emit(
            &mut self.sink,
            MonitorEvent::LaunchFailed {
                reason: error.to_string(),
            },
        );
        MonitorError::Launch(error)
    }
}
