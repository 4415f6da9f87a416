//! webmond — the webmon daemon.
//!
//! Launches the monitored server, then polls its health endpoint forever,
//! retrying and restarting according to the policy in `webmon.json`.
//!
//! # Usage
//!
//! ```text
//! webmond 8080 --server ../ubs/server.py --interpreter python
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use webmon_core::load_policy;
use webmon_health::{FileSink, HttpProbe, Monitor, MonitorEvent, emit};
use webmon_supervisor::{CommandLauncher, LaunchSpec, ProcessSupervisor};

#[derive(Parser, Debug)]
#[command(name = "webmond", about = "webmon — monitor and self-heal a web server", version)]
struct Cli {
    /// Port the monitored server listens on; also passed to the server.
    port: u16,

    /// Policy document (.json or .toml).
    #[arg(short, long, default_value = "webmon.json")]
    config: PathBuf,

    /// Server entry point.
    #[arg(long, default_value = "server.py")]
    server: PathBuf,

    /// Program used to run the entry point, e.g. `python`.
    #[arg(long)]
    interpreter: Option<String>,

    /// Append-only monitor log.
    #[arg(long, default_value = "webmon.log")]
    log_file: PathBuf,

    /// Path probed on the server.
    #[arg(long, default_value = "/getbalance")]
    endpoint: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,webmond=debug,webmon=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    run(cli).await?;

    println!("Webmon terminated.");
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let policy = load_policy(&cli.config)
        .with_context(|| format!("loading policy from {}", cli.config.display()))?;
    info!(config = %cli.config.display(), entries = policy.len(), "policy loaded");

    let mut sink = FileSink::new(&cli.log_file);
    let spec = launch_spec(&cli.server, cli.interpreter.as_deref(), cli.port)?;
    info!(program = %spec.program.display(), args = ?spec.argv(), "launching server");

    let supervisor = match ProcessSupervisor::start(CommandLauncher::new(spec)) {
        Ok(supervisor) => supervisor,
        Err(e) => {
            emit(&mut sink, MonitorEvent::LaunchFailed { reason: e.to_string() });
            return Err(e).context("starting monitored server");
        }
    };

    let probe = HttpProbe::local(cli.port, cli.endpoint, policy.wait_time);
    info!(uri = %probe.uri(), log = %cli.log_file.display(), "monitoring");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!(error = %e, "failed to install Ctrl-C handler"),
        }
    });

    let mut monitor = Monitor::new(policy, probe, supervisor, sink);
    monitor.run(shutdown_rx).await?;
    Ok(())
}

fn launch_spec(server: &Path, interpreter: Option<&str>, port: u16) -> anyhow::Result<LaunchSpec> {
    let spec = LaunchSpec::entry_point(server, interpreter, port)?;
    match server.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        // Server-relative files (its own log) land next to the entry point.
        Some(dir) => Ok(spec.with_working_dir(std::path::absolute(dir)?)),
        None => Ok(spec),
    }
}
