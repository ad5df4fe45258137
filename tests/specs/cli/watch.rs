// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for the `watch` command.
//!
//! Runs the binary against scripted channel statuses and checks what it
//! reports and how it exits.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use yare::parameterized;

// =============================================================================
// Helpers
// =============================================================================

fn fw() -> Command {
    cargo_bin_cmd!("feedwatch")
}

/// `watch` with fast retries so scripted failures settle quickly.
fn watch(resource: &str) -> Command {
    watch_with_delay(resource, "10")
}

fn watch_with_delay(resource: &str, base_delay_ms: &str) -> Command {
    let mut cmd = fw();
    cmd.arg("watch")
        .arg(resource)
        .arg("--owner")
        .arg("alice")
        .arg("--base-delay-ms")
        .arg(base_delay_ms)
        .env_remove("RUST_LOG");
    cmd
}

fn json_report(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.arg("-o").arg("json").output().unwrap();
    serde_json::from_slice(&output.stdout).unwrap()
}

// =============================================================================
// Settling
// =============================================================================

#[test]
fn subscribes_without_a_script() {
    watch("orders")
        .assert()
        .success()
        .stdout(predicate::str::contains("watching orders"))
        .stdout(predicate::str::contains("key: orders-alice-"))
        .stdout(predicate::str::contains("state: subscribed"))
        .stdout(predicate::str::contains("channels opened: 1"));
}

#[test]
fn prints_each_change() {
    watch("orders")
        .arg("--events")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("change #1"))
        .stdout(predicate::str::contains("change #2"))
        .stdout(predicate::str::contains("change #3").not());
}

#[test]
fn recovers_after_transient_errors() {
    watch("orders")
        .arg("--script")
        .arg("errored,closed,subscribed")
        .assert()
        .success()
        .stdout(predicate::str::contains("state: subscribed"))
        .stdout(predicate::str::contains("retries: 0/5"))
        .stdout(predicate::str::contains("channels opened: 3"))
        // The resubscribe itself is a change.
        .stdout(predicate::str::contains("change #1"));
}

#[parameterized(
    no_retries = { "errored", "0", "1" },
    budget_spent = { "errored,errored,errored", "2", "3" },
)]
fn exits_2_when_retries_run_out(script: &str, max_retries: &str, opened: &str) {
    watch("orders")
        .arg("--script")
        .arg(script)
        .arg("--max-retries")
        .arg(max_retries)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("state: failed"))
        .stdout(predicate::str::contains(format!("channels opened: {}", opened)));
}

#[test]
fn times_out_when_nothing_settles() {
    watch_with_delay("orders", "60000")
        .arg("--script")
        .arg("errored")
        .arg("--max-delay-secs")
        .arg("60")
        .arg("--timeout-secs")
        .arg("1")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("did not settle within 1s"));
}

// =============================================================================
// JSON output
// =============================================================================

#[test]
fn json_report_describes_the_subscription() {
    let report = json_report(
        watch("orders")
            .arg("--filter")
            .arg("status=eq.active")
            .arg("--events")
            .arg("1"),
    );

    assert_eq!(report["resource"], "orders");
    assert_eq!(report["filter"], "status=eq.active");
    assert_eq!(report["state"], "subscribed");
    assert_eq!(report["retry_count"], 0);
    assert_eq!(report["max_retries"], 5);
    assert_eq!(report["changes"], 1);
    assert_eq!(report["channels_opened"], 1);
    assert_eq!(report["channels_leaked"], 0);
    assert!(report["key"].as_str().unwrap().starts_with("orders-alice-"));
}

#[test]
fn json_report_omits_missing_filter() {
    let report = json_report(&mut watch("orders"));
    assert!(report.get("filter").is_none());
}

#[test]
fn failed_json_report_releases_every_channel() {
    let report = json_report(
        watch("orders")
            .arg("--script")
            .arg("errored,errored")
            .arg("--max-retries")
            .arg("1"),
    );

    assert_eq!(report["state"], "failed");
    assert_eq!(report["channels_opened"], 2);
    assert_eq!(report["channels_leaked"], 0);
}

// =============================================================================
// Configuration and input errors
// =============================================================================

#[test]
fn config_file_supplies_owner_and_retries() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("feedwatch.toml");
    std::fs::write(
        &path,
        "owner = \"bob\"\n\n[reconnect]\nmax_retries = 0\nbase_delay_ms = 10\n",
    )
    .unwrap();

    fw().arg("watch")
        .arg("orders")
        .arg("--config")
        .arg(&path)
        .arg("--script")
        .arg("errored")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("key: orders-bob-"))
        .stdout(predicate::str::contains("retries: 0/0"));
}

#[test]
fn rejects_unknown_script_tokens() {
    watch("orders")
        .arg("--script")
        .arg("subscribed,flaky")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid script token: 'flaky'"));
}

#[test]
fn rejects_zero_base_delay() {
    watch_with_delay("orders", "0")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("base_delay_ms must be greater than zero"));
}

#[test]
fn rejects_missing_config_file() {
    watch("orders")
        .arg("--config")
        .arg("/nonexistent/feedwatch.toml")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read"));
}

// =============================================================================
// Usage errors
// =============================================================================

#[test]
fn unknown_flag_exits_one() {
    watch("orders")
        .arg("--no-such-flag")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--no-such-flag"));
}

#[test]
fn missing_resource_exits_one() {
    fw().arg("watch").assert().code(1);
}

#[test]
fn help_exits_zero() {
    fw().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"));
}
