//! Vclock Demo - runs a scripted vector-clock scenario.
//!
//! Every process of the scenario runs concurrently, executing its script of
//! local events, sends and receives. Each action is logged with the clock it
//! produced; once every process is done the final clocks are printed.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in three-process scenario
//! vclock-demo
//!
//! # Run a scenario from a configuration file and verify the log
//! vclock-demo --config scenario.toml --check
//!
//! # Print a configuration file to start from
//! vclock-demo --print-config > scenario.toml
//! ```

mod config;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use config::DemoConfig;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vclock_runtime::{Orchestrator, RunReport, Topology};

/// CLI arguments for the demo.
#[derive(Parser, Debug)]
#[command(
    name = "vclock-demo",
    about = "Runs concurrent processes that exchange vector clocks over channels",
    version
)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Enable JSON log output.
    #[arg(long)]
    json_logs: bool,

    /// Give up on processes that have not finished after this many milliseconds.
    #[arg(long, value_name = "MS")]
    deadline_ms: Option<u64>,

    /// Pause between two actions of a process, in milliseconds.
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Verify the event log once the run is over.
    #[arg(long)]
    check: bool,

    /// Write the event log as JSON to this file.
    #[arg(long, value_name = "FILE")]
    dump_log: Option<PathBuf>,

    /// Print the default configuration, built-in scenario included, and exit.
    #[arg(long)]
    print_config: bool,
}

/// Initialize tracing/logging.
fn init_tracing(config: &config::LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Failed to parse log filter")?;

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact())
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Prints the final clock of every process, in declaration order.
fn print_final_clocks(topology: &Topology, report: &RunReport) {
    for process in topology.processes() {
        match report.clock_of(process) {
            Some(clock) => println!("Process {}: {}", process, clock),
            None => println!("Process {}: did not complete", process),
        }
    }
}

/// Runs the configured scenario to completion.
async fn run(config: &DemoConfig, args: &CliArgs) -> Result<()> {
    let topology = config.topology()?;
    let orchestrator = Orchestrator::new(topology.clone(), config.runtime.clone());

    let report = tokio::select! {
        result = orchestrator.run() => result.context("Run failed")?,
        _ = shutdown_signal() => {
            anyhow::bail!("Interrupted before every process finished");
        }
    };

    print_final_clocks(&topology, &report);

    if let Some(ref path) = args.dump_log {
        let json = report.log.to_json().context("Failed to serialize event log")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write event log to {:?}", path))?;
        info!(path = ?path, "Event log written");
    }

    if args.check {
        let results = vclock_checker::check_all(&report.entries());
        for result in &results {
            println!("{}", result);
            for violation in &result.violations {
                println!("  {}", violation);
            }
        }
        let failed = results.iter().filter(|r| r.is_fail()).count();
        if failed > 0 {
            anyhow::bail!("{} of {} checks failed", failed, results.len());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    if args.print_config {
        let config = DemoConfig::example();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut config = if let Some(ref config_path) = args.config {
        DemoConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        DemoConfig::default()
    };

    config.merge_cli_args(&args);
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Vclock demo starting");

    if let Err(e) = run(&config, &args).await {
        error!(error = %e, "Demo failed");
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_parsing() {
        let args = CliArgs::parse_from(["vclock-demo"]);
        assert!(args.config.is_none());
        assert!(args.deadline_ms.is_none());
        assert!(!args.json_logs);
        assert!(!args.check);
    }

    #[test]
    fn test_cli_args_with_options() {
        let args = CliArgs::parse_from([
            "vclock-demo",
            "--config",
            "scenario.toml",
            "--check",
            "--dump-log",
            "log.json",
            "-l",
            "warn",
        ]);

        assert_eq!(args.config, Some(PathBuf::from("scenario.toml")));
        assert_eq!(args.dump_log, Some(PathBuf::from("log.json")));
        assert_eq!(args.log_level, Some("warn".to_string()));
        assert!(args.check);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 3)]
    async fn test_run_checks_and_dumps_builtin_log() {
        let path = std::env::temp_dir().join(format!("vclock-demo-{}.json", std::process::id()));
        let args = CliArgs::parse_from([
            "vclock-demo",
            "--check",
            "--dump-log",
            path.to_str().unwrap(),
        ]);

        run(&DemoConfig::default(), &args).await.unwrap();

        let dumped = std::fs::read_to_string(&path).unwrap();
        let entries: Vec<vclock_core::LogEntry> = serde_json::from_str(&dumped).unwrap();
        assert_eq!(entries.len(), 19);
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_at_deadline() {
        let mut config: DemoConfig = toml::from_str(
            r#"
            [scenario]
            processes = ["p", "q"]

            [[scenario.channels]]
            id = "pq"
            endpoints = ["p", "q"]

            [scenario.scripts]
            p = ["receive pq"]
            q = []
            "#,
        )
        .unwrap();
        config.runtime.join_timeout_ms = Some(50);

        let args = CliArgs::parse_from(["vclock-demo"]);
        assert!(run(&config, &args).await.is_err());
    }
}
