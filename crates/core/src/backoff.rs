// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Capped exponential backoff between reconnect attempts.
//!
//! The delay before retry `n` (0-indexed) is `min(base * 2^n, cap)`. There is
//! no jitter: the same attempt always waits the same amount of time, and the
//! curve never decreases as attempts grow.

use std::time::Duration;

/// Retry delay policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    cap: Duration,
}

impl BackoffPolicy {
    /// Delay before the first retry.
    pub const DEFAULT_BASE: Duration = Duration::from_secs(1);
    /// Upper bound on any single delay.
    pub const DEFAULT_CAP: Duration = Duration::from_secs(30);

    /// Create a policy with the given base delay and cap.
    pub fn new(base: Duration, cap: Duration) -> Self {
        BackoffPolicy { base, cap }
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn cap(&self) -> Duration {
        self.cap
    }

    /// Computes the delay before retry number `attempt` (0-indexed).
    ///
    /// Saturates at the cap instead of overflowing for large attempts.
    pub fn delay(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base.checked_mul(factor))
            .map_or(self.cap, |delay| delay.min(self.cap))
    }

    /// The delays for the first `retries` attempts, in order.
    pub fn schedule(&self, retries: u32) -> Vec<Duration> {
        (0..retries).map(|attempt| self.delay(attempt)).collect()
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::new(Self::DEFAULT_BASE, Self::DEFAULT_CAP)
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
