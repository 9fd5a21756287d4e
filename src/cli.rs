//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use clap::{Parser, Subcommand};

use crate::dashboard::RacePolicy;
use crate::domain::UvIndex;
use crate::output::Format;

/// City air quality insights from your terminal.
#[derive(Parser, Debug)]
#[command(name = "aerosense")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Override the upstream API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-lookup timeout in seconds (unset waits on the HTTP timeout only)
    #[arg(long, global = true)]
    pub step_timeout: Option<u64>,

    /// Show this UV index (0-10) instead of a random placeholder
    #[arg(long, global = true, value_parser = parse_uv_index)]
    pub uv_index: Option<UvIndex>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve one or more cities and print their air quality
    Check(CheckArgs),

    /// Print the map marker for a city
    Marker(MarkerArgs),

    /// Start the web dashboard
    Ui(UiArgs),
}

/// Arguments for the `check` command.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// City names to look up
    #[arg(required = true)]
    pub cities: Vec<String>,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `marker` command.
#[derive(Parser, Debug)]
pub struct MarkerArgs {
    /// City name to look up
    pub city: String,
}

/// Arguments for the `ui` command.
#[derive(Parser, Debug)]
pub struct UiArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// City to show on startup
    #[arg(long, default_value = "New Delhi")]
    pub city: String,

    /// How overlapping refreshes are committed: last-completed, latest-request
    #[arg(long, value_parser = parse_race_policy)]
    pub race_policy: Option<RacePolicy>,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

/// Parse a race policy from string.
fn parse_race_policy(s: &str) -> Result<RacePolicy, String> {
    s.parse()
}

/// Parse a UV index in `[0, 10]`.
fn parse_uv_index(s: &str) -> Result<UvIndex, String> {
    let value: u8 = s.parse().map_err(|e| format!("invalid UV index {s}: {e}"))?;
    UvIndex::new(value).map_err(|e| e.to_string())
}
