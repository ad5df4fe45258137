// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Creation timestamps for subscription keys.
//!
//! Keys embed the creation time in milliseconds. Two subscriptions created in
//! the same millisecond would collide, so [`KeyClock`] never hands out the
//! same value twice: if the wall clock has not advanced past the last issued
//! timestamp, it issues `last + 1` instead.

use std::sync::atomic::{AtomicU64, Ordering};

/// Trait for getting the current wall clock time.
///
/// This allows injecting a fixed clock for testing.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using `chrono`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Strictly increasing millisecond timestamps for one client instance.
pub struct KeyClock {
    source: Box<dyn ClockSource>,
    last_ms: AtomicU64,
}

impl KeyClock {
    pub fn new(source: impl ClockSource + 'static) -> Self {
        KeyClock {
            source: Box::new(source),
            last_ms: AtomicU64::new(0),
        }
    }

    /// Returns a timestamp greater than every one previously returned.
    pub fn next_ms(&self) -> u64 {
        let now = self.source.now_ms();
        let previous = self
            .last_ms
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(previous.saturating_add(1))
    }
}

impl Default for KeyClock {
    fn default() -> Self {
        KeyClock::new(SystemClock)
    }
}

impl std::fmt::Debug for KeyClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyClock")
            .field("last_ms", &self.last_ms.load(Ordering::Acquire))
            .finish()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
