//! Monitor event records and the append-only log sink.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use webmon_core::{OutcomeKey, ProbeOutcome};

/// Something that happened during monitoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// The server was found dead at the liveness check and relaunched.
    RestartedNotRunning,
    /// A retry is about to be spent on an outcome.
    Attempt {
        attempt: u32,
        max: u32,
        outcome: ProbeOutcome,
    },
    /// The retry budget ran out with the outcome unchanged.
    AttemptFailed {
        attempt: u32,
        max: u32,
        outcome: ProbeOutcome,
    },
    /// The server was restarted because the policy says so.
    RestartedByPolicy { key: OutcomeKey },
    /// The cycle ended without a failure.
    Success { outcome: ProbeOutcome, attempts: u32 },
    /// The server could not be launched; monitoring stops.
    LaunchFailed { reason: String },
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorEvent::RestartedNotRunning => {
                f.write_str("UBS restarted (process was not running)")
            }
            MonitorEvent::Attempt { attempt, max, outcome } => {
                write!(f, "Attempt {attempt}/{max}, Status: {outcome}")
            }
            MonitorEvent::AttemptFailed { attempt, max, outcome } => {
                write!(f, "Attempt {attempt}/{max}, Status: {outcome} - Failed")
            }
            MonitorEvent::RestartedByPolicy { key } => write!(f, "UBS restarted due to {key}"),
            MonitorEvent::Success { outcome, attempts } => {
                write!(f, "Successful response: Status {outcome} after {attempts} attempts")
            }
            MonitorEvent::LaunchFailed { reason } => write!(f, "UBS failed to start: {reason}"),
        }
    }
}

/// Append-only destination for monitor events. Never read back.
pub trait EventSink {
    fn record(&mut self, event: &MonitorEvent);
}

/// Mirror `event` to tracing and hand it to `sink`.
pub fn emit<S: EventSink + ?Sized>(sink: &mut S, event: MonitorEvent) {
    match &event {
        MonitorEvent::Attempt { .. } | MonitorEvent::Success { .. } => info!(%event, "monitor"),
        MonitorEvent::LaunchFailed { .. } => error!(%event, "monitor"),
        _ => warn!(%event, "monitor"),
    }
    sink.record(&event);
}

/// Appends `<timestamp> - <event>` lines to a file.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl EventSink for FileSink {
    fn record(&mut self, event: &MonitorEvent) {
        let line = format!("{} - {event}", timestamp());
        if let Err(e) = self.append(&line) {
            warn!(path = %self.path.display(), error = %e, "failed to write monitor log");
        }
    }
}

/// Keeps events in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Vec<MonitorEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[MonitorEvent] {
        &self.events
    }

    /// Rendered record texts, without timestamps.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }
}

impl EventSink for MemorySink {
    fn record(&mut self, event: &MonitorEvent) {
        self.events.push(event.clone());
    }
}

/// Local time in ISO-8601 with microseconds.
fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_texts() {
        let cases = [
            (MonitorEvent::RestartedNotRunning, "UBS restarted (process was not running)"),
            (
                MonitorEvent::Attempt { attempt: 1, max: 2, outcome: ProbeOutcome::Status(500) },
                "Attempt 1/2, Status: 500",
            ),
            (
                MonitorEvent::AttemptFailed { attempt: 3, max: 3, outcome: ProbeOutcome::Timeout },
                "Attempt 3/3, Status: timeout - Failed",
            ),
            (
                MonitorEvent::RestartedByPolicy {
                    key: OutcomeKey::from(ProbeOutcome::Status(500)),
                },
                "UBS restarted due to http500",
            ),
            (
                MonitorEvent::Success { outcome: ProbeOutcome::Status(200), attempts: 1 },
                "Successful response: Status 200 after 1 attempts",
            ),
        ];
        for (event, text) in cases {
            assert_eq!(event.to_string(), text);
        }
    }

    #[test]
    fn file_sink_appends_timestamped_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webmon.log");
        let mut sink = FileSink::new(&path);

        sink.record(&MonitorEvent::RestartedNotRunning);
        sink.record(&MonitorEvent::Success { outcome: ProbeOutcome::Status(200), attempts: 1 });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - UBS restarted (process was not running)"));
        assert!(lines[1].ends_with(" - Successful response: Status 200 after 1 attempts"));

        let (stamp, _) = lines[0].split_once(" - ").unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
    }

    #[test]
    fn file_sink_survives_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("missing").join("webmon.log"));
        sink.record(&MonitorEvent::RestartedNotRunning);
        assert!(!sink.path().exists());
    }

    #[test]
    fn emit_records_into_sink() {
        let mut sink = MemorySink::new();
        emit(&mut sink, MonitorEvent::RestartedNotRunning);
        assert_eq!(sink.events(), &[MonitorEvent::RestartedNotRunning]);
        assert_eq!(sink.lines(), vec!["UBS restarted (process was not running)"]);
    }
}
