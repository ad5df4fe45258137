// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnect configuration shared by every subscription of a client.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backoff::BackoffPolicy;
use crate::error::{Error, Result};

/// How aggressively a subscription tries to get its channel back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Retries scheduled after consecutive failures before giving up (default: 5).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay between retries in seconds (default: 30).
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_secs() -> u64 {
    30
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfig {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl ReconnectConfig {
    /// Rejects configurations that would retry instantly or shrink the cap below the base.
    pub fn validate(&self) -> Result<()> {
        if self.base_delay_ms == 0 {
            return Err(Error::InvalidConfig(
                "base_delay_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_delay_secs.saturating_mul(1_000) < self.base_delay_ms {
            return Err(Error::InvalidConfig(format!(
                "max_delay_secs ({}s) is shorter than base_delay_ms ({}ms)",
                self.max_delay_secs, self.base_delay_ms
            )));
        }
        Ok(())
    }

    /// The backoff curve described by this config.
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.base_delay_ms),
            Duration::from_secs(self.max_delay_secs),
        )
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
