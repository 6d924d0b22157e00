//! Command-line interface for ridescout driver discovery.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod discover;
mod error;
mod fs;

pub use error::CliError;

use discover::{DiscoverArgs, run_discover};

pub(crate) const ARG_DISCOVER_INPUT: &str = "input";
pub(crate) const ARG_OSRM_BASE_URL: &str = "osrm-base-url";
pub(crate) const ARG_OSRM_PROFILE: &str = "osrm-profile";
pub(crate) const ARG_CONCURRENCY_LIMIT: &str = "concurrency-limit";
pub(crate) const ARG_PER_CALL_TIMEOUT_MS: &str = "per-call-timeout-ms";
pub(crate) const ARG_OVERALL_TIMEOUT_MS: &str = "overall-timeout-ms";
pub(crate) const ARG_REGION_PADDING: &str = "region-padding";
pub(crate) const ARG_DEFAULT_SPAN_DEGREES: &str = "default-span-degrees";
pub(crate) const ARG_BASE_PRICE: &str = "base-price";
pub(crate) const ARG_PER_METER_RATE: &str = "per-meter-rate";
pub(crate) const ARG_PER_SECOND_RATE: &str = "per-second-rate";
pub(crate) const ENV_DISCOVER_INPUT: &str = "RIDESCOUT_CMDS_DISCOVER_INPUT_PATH";

/// Run the ridescout CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Discover(args) => run_discover(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "ridescout",
    about = "Rank nearby drivers by road travel time to a pickup point",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one discovery cycle over a JSON input document.
    Discover(DiscoverArgs),
}

#[cfg(test)]
mod tests;
