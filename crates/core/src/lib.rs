// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fw-core: Live change-feed subscriptions that survive dropped connections.
//!
//! A [`Realtime`] client hands out [`SubscriptionHandle`]s. Each handle is
//! backed by one background control loop that keeps exactly one transport
//! channel open for its resource, reconnects with capped exponential backoff
//! when the channel closes or errors, and calls the caller's change listener
//! whenever something on the resource may have changed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  commands  ┌────────────────┐  open/close  ┌─────────────┐
//! │ Subscription │───────────►│ ChannelManager │─────────────►│  Transport  │
//! │    Handle    │◄───────────│  (one task)    │◄─────────────│   (trait)   │
//! └──────────────┘  snapshots └────────────────┘  status/event└─────────────┘
//!                                │         │
//!                                ▼         ▼
//!                        ┌────────────┐ ┌─────────────────┐
//!                        │ RetryTimer │ │ EventDispatcher │──► on_change()
//!                        └────────────┘ └─────────────────┘
//! ```
//!
//! The transport is an external capability: this crate never opens sockets
//! itself. Implement [`Transport`] over whatever realtime client you have.

pub mod backoff;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
mod handle;
mod manager;
pub mod realtime;
pub mod subscription;
pub mod transport;

pub use backoff::BackoffPolicy;
pub use clock::{ClockSource, KeyClock, SystemClock};
pub use config::ReconnectConfig;
pub use dispatch::{EventDispatcher, ListenerError};
pub use error::{Error, Result};
pub use handle::SubscriptionHandle;
pub use realtime::Realtime;
pub use subscription::{
    ChannelStatus, Effect, Notification, Subscription, SubscriptionKey, SubscriptionSnapshot,
    SubscriptionState, Trigger,
};
pub use transport::{
    ChannelId, EventCallback, EventFilter, EventKind, StatusCallback, Transport, TransportError,
    TransportResult,
};

#[cfg(test)]
mod test_helpers;
