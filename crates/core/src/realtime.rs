// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Entry point for creating subscriptions.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

use crate::clock::{ClockSource, KeyClock};
use crate::config::ReconnectConfig;
use crate::dispatch::{EventDispatcher, ListenerError};
use crate::error::{Error, Result};
use crate::handle::SubscriptionHandle;
use crate::manager::ChannelManager;
use crate::subscription::{Subscription, SubscriptionKey};
use crate::transport::Transport;

/// Realtime client bound to one transport and one owner identity.
///
/// Every subscription gets its own control loop on the tokio runtime that
/// was current when the client was built.
pub struct Realtime<T: Transport> {
    transport: Arc<T>,
    owner: String,
    config: ReconnectConfig,
    clock: KeyClock,
    runtime: Handle,
}

impl<T: Transport> Realtime<T> {
    /// Build a client. Must be called from within a tokio runtime.
    pub fn new(transport: Arc<T>, owner: impl Into<String>, config: ReconnectConfig) -> Result<Self> {
        let owner = owner.into();
        if owner.trim().is_empty() {
            return Err(Error::FieldEmpty { field: "owner" });
        }
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;

        Ok(Realtime {
            transport,
            owner,
            config,
            clock: KeyClock::default(),
            runtime,
        })
    }

    /// Use a different time source for subscription keys.
    pub fn with_clock(mut self, source: impl ClockSource + 'static) -> Self {
        self.clock = KeyClock::new(source);
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }

    /// Subscribe to changes on `resource`, optionally narrowed by `filter`.
    ///
    /// `on_change` runs on the subscription's control loop once per row
    /// event, transport reconnect, and resubscribe after a failure. It must
    /// not block. Setup starts immediately; the returned handle tears the
    /// subscription down explicitly or when its last clone is dropped.
    pub fn create_subscription<F>(
        &self,
        resource: &str,
        filter: Option<&str>,
        on_change: F,
    ) -> Result<SubscriptionHandle>
    where
        F: Fn() -> std::result::Result<(), ListenerError> + Send + Sync + 'static,
    {
        let resource = resource.trim();
        if resource.is_empty() {
            return Err(Error::FieldEmpty { field: "resource" });
        }
        let filter = filter
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        let key = SubscriptionKey::new(resource, &self.owner, self.clock.next_ms());
        let subscription = Subscription::new(
            key.clone(),
            resource,
            filter,
            self.config.max_retries,
            self.config.backoff(),
        );
        let dispatcher = EventDispatcher::new(key.clone(), on_change);

        let (commands, queue) = mpsc::unbounded_channel();
        let (published, state) = watch::channel(subscription.snapshot());
        let manager = ChannelManager::new(
            subscription,
            Arc::clone(&self.transport),
            dispatcher,
            queue,
            commands.downgrade(),
            published,
        );

        tracing::info!(key = %key, "creating subscription on {}", resource);
        self.runtime.spawn(manager.run());

        Ok(SubscriptionHandle::new(key, commands, state))
    }
}

impl<T: Transport> std::fmt::Debug for Realtime<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Realtime")
            .field("owner", &self.owner)
            .field("config", &self.config)
            .finish()
    }
}
