//! Test doubles for the monitor: a scripted probe and an in-memory process table.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use webmon_core::ProbeOutcome;
use webmon_health::Probe;
use webmon_supervisor::{LaunchError, LaunchResult, Launcher, ProcessHandle};

/// Returns scripted outcomes in order, `Status(200)` once the script runs out.
#[derive(Default)]
pub struct ScriptedProbe {
    outcomes: Mutex<VecDeque<ProbeOutcome>>,
    issued: Mutex<u32>,
}

impl ScriptedProbe {
    pub fn new(outcomes: &[ProbeOutcome]) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.iter().copied().collect()),
            issued: Mutex::new(0),
        }
    }

    pub fn issued(&self) -> u32 {
        *self.issued.lock().unwrap()
    }
}

impl Probe for ScriptedProbe {
    async fn probe(&self) -> ProbeOutcome {
        *self.issued.lock().unwrap() += 1;
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ProbeOutcome::Status(200))
    }
}

#[derive(Debug, Default)]
struct Table {
    /// Alive flag per launched pid, index = pid - 1.
    alive: Vec<bool>,
    journal: Vec<String>,
    fail_launches: bool,
}

/// Shared view of every fake process launched so far.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable(Arc<Mutex<Table>>);

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launcher(&self) -> FakeLauncher {
        FakeLauncher { table: self.clone() }
    }

    pub fn launches(&self) -> usize {
        self.0.lock().unwrap().alive.len()
    }

    pub fn terminations(&self) -> usize {
        self.journal().iter().filter(|e| e.starts_with("terminate")).count()
    }

    pub fn journal(&self) -> Vec<String> {
        self.0.lock().unwrap().journal.clone()
    }

    /// Mark the most recent process as crashed.
    pub fn crash_latest(&self) {
        let mut table = self.0.lock().unwrap();
        if let Some(last) = table.alive.last_mut() {
            *last = false;
        }
    }

    pub fn fail_launches(&self, fail: bool) {
        self.0.lock().unwrap().fail_launches = fail;
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        self.0.lock().unwrap().alive[pid as usize - 1]
    }
}

pub struct FakeLauncher {
    table: ProcessTable,
}

impl Launcher for FakeLauncher {
    type Handle = FakeHandle;

    fn launch(&self) -> LaunchResult<FakeHandle> {
        let mut table = self.table.0.lock().unwrap();
        if table.fail_launches {
            return Err(LaunchError::Spawn {
                program: PathBuf::from("/opt/ubs/server"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
        table.alive.push(true);
        let pid = table.alive.len() as u32;
        table.journal.push(format!("launch {pid}"));
        Ok(FakeHandle {
            pid,
            table: self.table.clone(),
        })
    }
}

pub struct FakeHandle {
    pid: u32,
    table: ProcessTable,
}

impl ProcessHandle for FakeHandle {
    fn is_running(&mut self) -> bool {
        self.table.is_alive(self.pid)
    }

    fn terminate(&mut self) {
        let mut table = self.table.0.lock().unwrap();
        table.alive[self.pid as usize - 1] = false;
        table.journal.push(format!("terminate {}", self.pid));
    }

    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }
}
