//! AeroSense - City air quality insights from your terminal.
//!
//! Resolves a city to its current PM2.5 AQI, weather and a seven-day trend,
//! and serves the same view as a small web dashboard.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

mod aqi;
mod category;
mod cli;
mod client;
mod config;
mod dashboard;
mod domain;
mod errors;
mod history;
mod marker;
mod models;
mod orchestrator;
mod output;
mod providers;
mod server;
#[cfg(test)]
mod testing;

use cli::{Cli, Command};
use client::OpenWeatherClient;
use config::Config;
use dashboard::{Dashboard, RefreshOutcome};
use orchestrator::Orchestrator;
use providers::FixedUv;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(secs) = cli.step_timeout {
        config.step_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(uv_index) = cli.uv_index {
        config.uv_index = Some(uv_index);
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;

    match cli.command {
        Command::Check(args) => runtime.block_on(cmd_check(&config, args)),
        Command::Marker(args) => runtime.block_on(cmd_marker(&config, args)),
        Command::Ui(args) => runtime.block_on(cmd_ui(config, args)),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Build the orchestrator over the OpenWeatherMap client.
fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let client = OpenWeatherClient::new(&config.base_url, &config.api_key, config.request_timeout)
        .context("failed to create OpenWeatherMap client")?;
    let orchestrator = Orchestrator::new(Arc::new(client)).with_step_timeout(config.step_timeout);
    Ok(match config.uv_index {
        Some(uv_index) => orchestrator.with_uv_source(Arc::new(FixedUv(uv_index))),
        None => orchestrator,
    })
}

/// Execute the `check` command - one-shot lookup of each city.
async fn cmd_check(config: &Config, args: cli::CheckArgs) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;

    let mut snapshots = Vec::with_capacity(args.cities.len());
    let mut failed = 0usize;
    for city in &args.cities {
        match orchestrator.resolve(city).await {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => {
                error!("{city}: {e}");
                failed += 1;
            }
        }
    }

    {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        output::write_snapshots(&mut handle, &snapshots, args.format)?;
        handle.flush()?;
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} lookups failed", args.cities.len());
    }
    Ok(())
}

/// Execute the `marker` command - print the map marker for one city.
async fn cmd_marker(config: &Config, args: cli::MarkerArgs) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let snapshot = orchestrator
        .resolve(&args.city)
        .await
        .with_context(|| format!("failed to resolve {:?}", args.city))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_marker(&mut handle, &marker::project(&snapshot))?;
    Ok(())
}

/// Execute the `ui` command - start web server.
async fn cmd_ui(config: Config, args: cli::UiArgs) -> Result<()> {
    let policy = args.race_policy.unwrap_or(config.race_policy);
    let dashboard = Arc::new(Dashboard::new(build_orchestrator(&config)?, policy));

    // A failed startup lookup leaves the dashboard empty; the server still runs.
    if let RefreshOutcome::Failed(e) = dashboard.refresh(&args.city).await {
        tracing::warn!("initial lookup for {:?} failed: {}", args.city, e);
    }

    let mut updates = dashboard.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            if let Some(snapshot) = state.snapshot {
                tracing::debug!(
                    "display now {} (AQI {}, ticket #{})",
                    snapshot.location.resolved_name,
                    snapshot.aqi,
                    state.committed_ticket
                );
            }
        }
    });

    // Print startup message
    let url = format!("http://{}:{}", args.host, args.port);
    println!("\x1b[1m🌫 AeroSense Web UI\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:   \x1b[96m{url}\x1b[0m");
    println!("  City:    {}", args.city);
    println!("  Policy:  {}", policy.as_str());
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Open browser if requested (using xdg-open/open command)
    if args.open {
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "windows")]
        let _ = std::process::Command::new("cmd").args(["/c", "start", &url]).spawn();
    }

    let server_config = server::ServerConfig {
        port: args.port,
        host: args.host,
    };
    server::run_server(server_config, dashboard).await
}
