// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The `watch` command.
//!
//! Subscribes against a scripted transport, waits for the subscription to
//! settle (`subscribed` or `failed`), reports, and tears down.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use fw_core::{Realtime, SubscriptionHandle, SubscriptionSnapshot, SubscriptionState};

use crate::cli::{OutputFormat, WatchArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::identity::resolve_owner;
use crate::scripted::{parse_script, ScriptedTransport};
use crate::EXIT_FAILED;

/// What a watch run observed.
#[derive(Debug, Clone, Serialize)]
pub struct WatchReport {
    #[serde(flatten)]
    pub snapshot: SubscriptionSnapshot,
    /// Change notifications delivered to the listener.
    pub changes: u64,
    pub channels_opened: usize,
    /// Channels still open after teardown.
    pub channels_leaked: usize,
}

pub async fn run(args: WatchArgs) -> Result<i32> {
    let text = args.output == OutputFormat::Text;
    if text {
        println!("watching {}", args.resource);
    }

    let report = execute(&args, move |n| {
        if text {
            println!("change #{}", n);
        }
    })
    .await?;

    match args.output {
        OutputFormat::Text => {
            let snapshot = &report.snapshot;
            println!("key: {}", snapshot.key);
            println!("state: {}", snapshot.state);
            println!("retries: {}/{}", snapshot.retry_count, snapshot.max_retries);
            println!("changes: {}", report.changes);
            println!("channels opened: {}", report.channels_opened);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if report.snapshot.state == SubscriptionState::Failed {
        Ok(EXIT_FAILED)
    } else {
        Ok(0)
    }
}

/// Run one subscription to a settled state, then tear it down.
///
/// `on_change` receives the running count of change notifications.
pub(crate) async fn execute<F>(args: &WatchArgs, on_change: F) -> Result<WatchReport>
where
    F: Fn(u64) + Send + Sync + 'static,
{
    let config = Config::resolve(&args.reconnect)?;
    let owner = resolve_owner(args.owner.as_deref(), config.owner.as_deref());
    let script = parse_script(&args.script)?;
    let transport = Arc::new(ScriptedTransport::new(script, args.events));
    let realtime = Realtime::new(Arc::clone(&transport), owner, config.reconnect)?;

    let changes = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&changes);
    let handle = realtime.create_subscription(&args.resource, args.filter.as_deref(), move || {
        on_change(counter.fetch_add(1, Ordering::SeqCst) + 1);
        Ok(())
    })?;

    let limit = Duration::from_secs(args.timeout_secs);
    let settled = tokio::time::timeout(limit, settle(&handle)).await;

    handle.teardown();
    handle.closed().await;

    let snapshot = settled.map_err(|_| Error::Timeout {
        secs: args.timeout_secs,
    })?;
    Ok(WatchReport {
        snapshot,
        changes: changes.load(Ordering::SeqCst),
        channels_opened: transport.channels_opened(),
        channels_leaked: transport.live_channels(),
    })
}

/// Wait until the subscription reaches a state only a new status can change.
///
/// Snapshots round-trip through the control loop, so every status the
/// transport has already delivered is reflected in the one returned.
async fn settle(handle: &SubscriptionHandle) -> SubscriptionSnapshot {
    let mut published = handle.watch_state();
    loop {
        let snapshot = handle.snapshot().await;
        if snapshot.state.is_settled() {
            return snapshot;
        }
        if published.changed().await.is_err() {
            return handle.current();
        }
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
