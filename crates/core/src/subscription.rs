// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription entity and its reconnect state machine.
//!
//! [`Subscription::apply`] is the only place `state` and `retry_count`
//! change. It performs no I/O: each call returns the [`Effect`]s the channel
//! manager must carry out against the transport, the retry timer, and the
//! change listener, in order.
//!
//! ```text
//! Idle ──setup──► Connecting ──subscribed──► Subscribed
//!                   ▲    │                       │
//!       retry elapsed    └──closed|errored───────┤
//!                   │         (retries left)     │
//!                Retrying ◄──────────────────────┘
//!                               (none left) ──► Failed ──setup──► Connecting
//!
//! any state ──teardown──► Closed
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::BackoffPolicy;
use crate::error::Error;
use crate::transport::EventKind;

/// Lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionState {
    Idle,
    Connecting,
    Subscribed,
    Retrying,
    Failed,
    Closed,
}

impl SubscriptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionState::Idle => "idle",
            SubscriptionState::Connecting => "connecting",
            SubscriptionState::Subscribed => "subscribed",
            SubscriptionState::Retrying => "retrying",
            SubscriptionState::Failed => "failed",
            SubscriptionState::Closed => "closed",
        }
    }

    /// States automatic control never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriptionState::Failed | SubscriptionState::Closed)
    }

    /// States that will not change without a new status, setup, or teardown.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            SubscriptionState::Subscribed | SubscriptionState::Failed | SubscriptionState::Closed
        )
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(SubscriptionState::Idle),
            "connecting" => Ok(SubscriptionState::Connecting),
            "subscribed" => Ok(SubscriptionState::Subscribed),
            "retrying" => Ok(SubscriptionState::Retrying),
            "failed" => Ok(SubscriptionState::Failed),
            "closed" => Ok(SubscriptionState::Closed),
            _ => Err(Error::InvalidState(s.to_string())),
        }
    }
}

/// Status reported by the transport for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    /// The channel is live and listeners are active.
    Subscribed,
    /// The server closed the channel.
    Closed,
    /// The channel failed.
    Errored,
    /// The transport recovered the underlying connection on its own.
    Reconnected,
}

impl ChannelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelStatus::Subscribed => "subscribed",
            ChannelStatus::Closed => "closed",
            ChannelStatus::Errored => "errored",
            ChannelStatus::Reconnected => "reconnected",
        }
    }

    /// Whether this status ends the channel's useful life.
    pub fn is_failure(&self) -> bool {
        matches!(self, ChannelStatus::Closed | ChannelStatus::Errored)
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscribed" => Ok(ChannelStatus::Subscribed),
            "closed" => Ok(ChannelStatus::Closed),
            "errored" => Ok(ChannelStatus::Errored),
            "reconnected" => Ok(ChannelStatus::Reconnected),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Channel name identifying one subscription: `<resource>-<owner>-<created_ms>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionKey(String);

impl SubscriptionKey {
    pub fn new(resource: &str, owner: &str, created_ms: u64) -> Self {
        SubscriptionKey(format!("{resource}-{owner}-{created_ms}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Caller asked for a (re)connect.
    Setup,
    /// The active channel reported a status.
    Status(ChannelStatus),
    /// The active channel delivered a row event.
    Event(EventKind),
    /// The pending retry timer fired.
    RetryElapsed,
    /// Caller asked for teardown.
    Teardown,
}

/// Why the change listener is being called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Event(EventKind),
    Reconnected,
    /// The channel came back after failing; events may have been missed.
    Resubscribed,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Event(kind) => write!(f, "{kind} event"),
            Notification::Reconnected => f.write_str("transport reconnect"),
            Notification::Resubscribed => f.write_str("resubscribe"),
        }
    }
}

/// Side effect requested by a transition, executed by the channel manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Cancel and forget the pending retry timer, if any.
    CancelRetry,
    /// Close the active channel, if any.
    ReleaseChannel,
    /// Open a channel, register listeners, and activate it.
    OpenChannel,
    /// Start the retry timer.
    ScheduleRetry { attempt: u32, delay: Duration },
    /// Call the change listener.
    Notify(Notification),
}

/// Point-in-time view of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionSnapshot {
    pub key: SubscriptionKey,
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    pub state: SubscriptionState,
    pub retry_count: u32,
    pub max_retries: u32,
}

/// A live subscription to one resource.
#[derive(Debug, Clone)]
pub struct Subscription {
    key: SubscriptionKey,
    resource: String,
    filter: Option<String>,
    state: SubscriptionState,
    retry_count: u32,
    max_retries: u32,
    backoff: BackoffPolicy,
    /// Set when the channel fails, cleared once it is subscribed again.
    recovering: bool,
}

impl Subscription {
    pub fn new(
        key: SubscriptionKey,
        resource: impl Into<String>,
        filter: Option<String>,
        max_retries: u32,
        backoff: BackoffPolicy,
    ) -> Self {
        Subscription {
            key,
            resource: resource.into(),
            filter,
            state: SubscriptionState::Idle,
            retry_count: 0,
            max_retries,
            backoff,
            recovering: false,
        }
    }

    pub fn key(&self) -> &SubscriptionKey {
        &self.key
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn snapshot(&self) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            key: self.key.clone(),
            resource: self.resource.clone(),
            filter: self.filter.clone(),
            state: self.state,
            retry_count: self.retry_count,
            max_retries: self.max_retries,
        }
    }

    /// Advance the state machine and return the effects to execute.
    ///
    /// Triggers that make no sense in the current state return no effects.
    pub fn apply(&mut self, trigger: Trigger) -> Vec<Effect> {
        use SubscriptionState as S;

        match (self.state, trigger) {
            (S::Closed, _) => Vec::new(),
            (_, Trigger::Teardown) => {
                self.state = S::Closed;
                vec![Effect::CancelRetry, Effect::ReleaseChannel]
            }
            (S::Failed, Trigger::Setup) => {
                // Manual re-arm starts a fresh retry budget.
                self.retry_count = 0;
                self.connect()
            }
            (_, Trigger::Setup) | (S::Retrying, Trigger::RetryElapsed) => self.connect(),
            (
                S::Connecting | S::Subscribed | S::Retrying,
                Trigger::Status(ChannelStatus::Subscribed),
            ) => {
                self.retry_count = 0;
                self.state = S::Subscribed;
                let mut effects = vec![Effect::CancelRetry];
                if std::mem::take(&mut self.recovering) {
                    effects.push(Effect::Notify(Notification::Resubscribed));
                }
                effects
            }
            (S::Connecting | S::Subscribed, Trigger::Status(status)) if status.is_failure() => {
                self.fail()
            }
            (
                S::Connecting | S::Subscribed | S::Retrying,
                Trigger::Status(ChannelStatus::Reconnected),
            ) => vec![Effect::Notify(Notification::Reconnected)],
            (S::Connecting | S::Subscribed | S::Retrying, Trigger::Event(kind)) => {
                vec![Effect::Notify(Notification::Event(kind))]
            }
            _ => Vec::new(),
        }
    }

    fn connect(&mut self) -> Vec<Effect> {
        self.state = SubscriptionState::Connecting;
        vec![
            Effect::CancelRetry,
            Effect::ReleaseChannel,
            Effect::OpenChannel,
        ]
    }

    fn fail(&mut self) -> Vec<Effect> {
        self.recovering = true;
        if self.retry_count < self.max_retries {
            let attempt = self.retry_count;
            self.retry_count += 1;
            self.state = SubscriptionState::Retrying;
            vec![Effect::ScheduleRetry {
                attempt,
                delay: self.backoff.delay(attempt),
            }]
        } else {
            self.state = SubscriptionState::Failed;
            vec![Effect::CancelRetry, Effect::ReleaseChannel]
        }
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
