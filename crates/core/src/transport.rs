// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for realtime change feeds.
//!
//! The transport is the external capability that physically connects to the
//! feed. It is callback-based: listeners are registered on a channel before
//! it is activated, and status changes and row events arrive later on
//! whatever thread the transport uses. Implementations must not block inside
//! a callback invocation, and the callbacks handed out by this crate never do.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::subscription::ChannelStatus;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Opening the channel failed.
    #[error("failed to open channel '{name}': {reason}")]
    OpenFailed { name: String, reason: String },

    /// Registering a listener failed.
    #[error("failed to register listener on channel {channel}: {reason}")]
    ListenFailed { channel: ChannelId, reason: String },

    /// Activating the channel failed.
    #[error("failed to subscribe channel {channel}: {reason}")]
    SubscribeFailed { channel: ChannelId, reason: String },

    /// Closing the channel failed.
    #[error("failed to close channel {channel}: {reason}")]
    CloseFailed { channel: ChannelId, reason: String },

    /// The channel is not known to the transport.
    #[error("unknown channel {0}")]
    UnknownChannel(ChannelId),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport-assigned identifier of an open channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Row-level change kinds a channel can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Insert,
    Update,
    Delete,
}

impl EventKind {
    /// Every kind, in registration order.
    pub const ALL: [EventKind; 3] = [EventKind::Insert, EventKind::Update, EventKind::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Insert => "insert",
            EventKind::Update => "update",
            EventKind::Delete => "delete",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert" => Ok(EventKind::Insert),
            "update" => Ok(EventKind::Update),
            "delete" => Ok(EventKind::Delete),
            _ => Err(Error::InvalidEventKind(s.to_string())),
        }
    }
}

/// Which rows a listener wants to hear about.
///
/// `filter` is a single comparison such as `status=eq.active`, passed to the
/// transport verbatim. `None` means every row of the resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub resource: String,
    pub filter: Option<String>,
}

/// Listener for one event kind. Carries no payload.
pub type EventCallback = Box<dyn Fn() + Send + Sync>;

/// Listener for channel status transitions.
pub type StatusCallback = Box<dyn Fn(ChannelStatus) + Send + Sync>;

/// The realtime capability consumed by the channel manager.
///
/// A channel goes through `open_channel`, one `on_event` per kind, `on_status`,
/// then `subscribe`. The status callback fires some time after `subscribe`
/// returns, possibly from inside it.
pub trait Transport: Send + Sync + 'static {
    /// Open a named channel. Listeners are not active until [`Transport::subscribe`].
    fn open_channel(&self, name: &str) -> TransportResult<ChannelId>;

    /// Register a listener for one event kind on the channel.
    fn on_event(
        &self,
        channel: ChannelId,
        kind: EventKind,
        filter: &EventFilter,
        callback: EventCallback,
    ) -> TransportResult<()>;

    /// Register the status listener for the channel.
    fn on_status(&self, channel: ChannelId, callback: StatusCallback) -> TransportResult<()>;

    /// Activate the channel's listeners.
    fn subscribe(&self, channel: ChannelId) -> TransportResult<()>;

    /// Release the channel. Best-effort: callers log failures and move on.
    fn close_channel(&self, channel: ChannelId) -> TransportResult<()>;
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
