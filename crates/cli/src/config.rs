// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Optional TOML configuration.
//!
//! ```toml
//! owner = "alice"
//!
//! [reconnect]
//! max_retries = 5
//! base_delay_ms = 1000
//! max_delay_secs = 30
//! ```
//!
//! Every field is optional. Command-line flags override the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use fw_core::ReconnectConfig;

use crate::cli::ReconnectArgs;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Identity embedded in subscription keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Loads the file named by `--config`, if any, then applies flag overrides.
    pub fn resolve(args: &ReconnectArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        config.apply(args);
        config.reconnect.validate()?;
        Ok(config)
    }

    fn apply(&mut self, args: &ReconnectArgs) {
        if let Some(max_retries) = args.max_retries {
            self.reconnect.max_retries = max_retries;
        }
        if let Some(base_delay_ms) = args.base_delay_ms {
            self.reconnect.base_delay_ms = base_delay_ms;
        }
        if let Some(max_delay_secs) = args.max_delay_secs {
            self.reconnect.max_delay_secs = max_delay_secs;
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
