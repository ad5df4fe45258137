// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for the `backoff` command.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;

fn fw() -> Command {
    cargo_bin_cmd!("feedwatch")
}

#[test]
fn default_schedule_doubles_from_one_second() {
    fw().arg("backoff")
        .assert()
        .success()
        .stdout(predicate::str::contains("retry 1: 1000ms"))
        .stdout(predicate::str::contains("retry 2: 2000ms"))
        .stdout(predicate::str::contains("retry 5: 16000ms"))
        .stdout(predicate::str::contains("retry 6").not());
}

#[test]
fn delays_are_capped() {
    fw().arg("backoff")
        .arg("--retries")
        .arg("8")
        .assert()
        .success()
        .stdout(predicate::str::contains("retry 6: 30000ms"))
        .stdout(predicate::str::contains("retry 8: 30000ms"));
}

#[test]
fn json_schedule() {
    let output = fw()
        .arg("backoff")
        .arg("--retries")
        .arg("4")
        .arg("--base-delay-ms")
        .arg("500")
        .arg("--max-delay-secs")
        .arg("2")
        .arg("-o")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let schedule: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schedule["delays_ms"], serde_json::json!([500, 1000, 2000, 2000]));
    assert_eq!(schedule["base_delay_ms"], 500);
}

#[test]
fn rejects_cap_below_base() {
    fw().arg("backoff")
        .arg("--base-delay-ms")
        .arg("5000")
        .arg("--max-delay-secs")
        .arg("1")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("shorter than base_delay_ms"));
}
