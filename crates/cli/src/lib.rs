// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! feedwatch - Drive live change-feed subscriptions from the command line.
//!
//! The binary runs a real [`fw_core`] subscription against a
//! [`ScriptedTransport`](scripted::ScriptedTransport) that replays channel
//! statuses from a script. It exists to exercise reconnect behavior by hand
//! and from end-to-end specs without a realtime server.
//!
//! ```text
//! feedwatch watch orders --script errored,errored,subscribed --events 2
//! feedwatch backoff --retries 6
//! ```

mod cli;
mod commands;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod scripted;

pub use cli::{BackoffArgs, Cli, Command, OutputFormat, ReconnectArgs, WatchArgs};
pub use config::Config;
pub use error::{Error, Result};

/// Exit code when the subscription ends in `failed`.
pub const EXIT_FAILED: i32 = 2;

/// Run a parsed command and return the process exit code.
pub async fn run(command: Command) -> Result<i32> {
    match command {
        Command::Watch(args) => commands::watch::run(args).await,
        Command::Backoff(args) => commands::backoff::run(args),
    }
}
