// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "feedwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Watch a live change feed and survive dropped connections")]
#[command(
    long_about = "Watch a live change feed and survive dropped connections.\n\n\
    Runs a subscription against a scripted transport so reconnect and backoff \
    behavior can be observed without a realtime server."
)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Subscribe to a resource and report every change notification
    #[command(after_help = "\
Examples:
  feedwatch watch orders                              Subscribe and settle
  feedwatch watch orders --filter status=eq.active    Narrow the rows listened for
  feedwatch watch orders --script errored,subscribed  Fail once, then recover
  feedwatch watch orders --script errored --max-retries 0   Give up immediately
  feedwatch watch orders --events 3 -o json           Emit 3 inserts, report as JSON

Script tokens: subscribed, closed, errored, reconnected.
Each opened channel replays tokens up to and including the next closed or
errored; a channel opened after the script runs out is subscribed.")]
    Watch(WatchArgs),

    /// Print the retry delays for a reconnect configuration
    Backoff(BackoffArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ReconnectArgs {
    /// Retries after consecutive failures before giving up
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Delay before the first retry, in milliseconds
    #[arg(long, value_name = "MS")]
    pub base_delay_ms: Option<u64>,

    /// Maximum delay between retries, in seconds
    #[arg(long, value_name = "SECS")]
    pub max_delay_secs: Option<u64>,

    /// Read owner and [reconnect] settings from a TOML file
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Resource (table) to subscribe to
    #[arg(value_parser = non_empty_string)]
    pub resource: String,

    /// Row filter passed to the transport, e.g. status=eq.active
    #[arg(long, short)]
    pub filter: Option<String>,

    /// Identity embedded in the subscription key
    #[arg(long, value_parser = non_empty_string)]
    pub owner: Option<String>,

    /// Comma-separated channel statuses to replay
    #[arg(long, short, value_delimiter = ',', value_name = "STATUSES")]
    pub script: Vec<String>,

    /// Insert events emitted each time a channel reports subscribed
    #[arg(long, short, default_value = "0", value_name = "N")]
    pub events: u32,

    /// Give up if the subscription has not settled after this many seconds
    #[arg(long, default_value = "60", value_name = "SECS")]
    pub timeout_secs: u64,

    #[command(flatten)]
    pub reconnect: ReconnectArgs,

    /// Output format
    #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct BackoffArgs {
    /// Number of delays to print (defaults to max retries)
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    #[command(flatten)]
    pub reconnect: ReconnectArgs,

    /// Output format
    #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
    pub output: OutputFormat,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
