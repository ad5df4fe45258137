// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The `backoff` command: print the retry schedule a config produces.

use serde::Serialize;

use crate::cli::{BackoffArgs, OutputFormat};
use crate::config::Config;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct Schedule {
    base_delay_ms: u64,
    max_delay_secs: u64,
    delays_ms: Vec<u128>,
}

pub fn run(args: BackoffArgs) -> Result<i32> {
    let config = Config::resolve(&args.reconnect)?;
    let retries = args.retries.unwrap_or(config.reconnect.max_retries);
    let delays_ms: Vec<u128> = config
        .reconnect
        .backoff()
        .schedule(retries)
        .iter()
        .map(|d| d.as_millis())
        .collect();

    match args.output {
        OutputFormat::Text => {
            for (attempt, ms) in delays_ms.iter().enumerate() {
                println!("retry {}: {}ms", attempt + 1, ms);
            }
        }
        OutputFormat::Json => {
            let schedule = Schedule {
                base_delay_ms: config.reconnect.base_delay_ms,
                max_delay_secs: config.reconnect.max_delay_secs,
                delays_ms,
            };
            println!("{}", serde_json::to_string_pretty(&schedule)?);
        }
    }
    Ok(0)
}
