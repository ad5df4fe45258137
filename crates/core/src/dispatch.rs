// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out from channel activity to the caller's change listener.
//!
//! The listener takes no arguments: the contract is "something changed,
//! re-derive your view", not "here is the delta". Whatever the listener does
//! wrong, whether it returns an error or panics, stops at this boundary.

use std::panic::{self, AssertUnwindSafe};

use crate::subscription::{Notification, SubscriptionKey};

/// Error a change listener may return.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

type Listener = Box<dyn Fn() -> Result<(), ListenerError> + Send + Sync>;

/// Calls one change listener and isolates its failures.
pub struct EventDispatcher {
    key: SubscriptionKey,
    listener: Listener,
    delivered: u64,
    failed: u64,
}

impl EventDispatcher {
    pub fn new<F>(key: SubscriptionKey, listener: F) -> Self
    where
        F: Fn() -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        EventDispatcher {
            key,
            listener: Box::new(listener),
            delivered: 0,
            failed: 0,
        }
    }

    /// Invoke the listener once. Returns false if it failed.
    pub fn dispatch(&mut self, cause: Notification) -> bool {
        tracing::trace!(key = %self.key, "notifying listener of {}", cause);

        match panic::catch_unwind(AssertUnwindSafe(|| (self.listener)())) {
            Ok(Ok(())) => {
                self.delivered += 1;
                true
            }
            Ok(Err(e)) => {
                self.failed += 1;
                tracing::warn!(key = %self.key, "change listener failed on {}: {}", cause, e);
                false
            }
            Err(payload) => {
                self.failed += 1;
                tracing::warn!(
                    key = %self.key,
                    "change listener panicked on {}: {}",
                    cause,
                    panic_message(payload.as_ref())
                );
                false
            }
        }
    }

    /// Invocations that returned successfully.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Invocations that returned an error or panicked.
    pub fn failed(&self) -> u64 {
        self.failed
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("key", &self.key)
            .field("delivered", &self.delivered)
            .field("failed", &self.failed)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic>"
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
