// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for fw-core operations.
//!
//! Only construction and parsing can fail. Once a subscription is running,
//! failures are expressed through its state and the log, never returned.

use thiserror::Error;

/// All possible errors that can occur in fw-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid reconnect config: {0}")]
    InvalidConfig(String),

    #[error("{field} cannot be empty")]
    FieldEmpty { field: &'static str },

    #[error("invalid subscription state: '{0}'\n  hint: valid states are: idle, connecting, subscribed, retrying, failed, closed")]
    InvalidState(String),

    #[error("invalid channel status: '{0}'\n  hint: valid statuses are: subscribed, closed, errored, reconnected")]
    InvalidStatus(String),

    #[error("invalid event kind: '{0}'\n  hint: valid kinds are: insert, update, delete")]
    InvalidEventKind(String),

    #[error("no tokio runtime available\n  hint: create the realtime client from within a tokio runtime")]
    NoRuntime,
}

/// A specialized Result type for fw-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
