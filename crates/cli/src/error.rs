// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors that can occur in the feedwatch binary.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] fw_core::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid script token: '{0}'\n  hint: valid tokens are: subscribed, closed, errored, reconnected")]
    InvalidScript(String),

    #[error("subscription did not settle within {secs}s\n  hint: raise --timeout-secs or lower --base-delay-ms")]
    Timeout { secs: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for feedwatch operations.
pub type Result<T> = std::result::Result<T, Error>;
