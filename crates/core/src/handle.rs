// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Caller-side handle to a running subscription.

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{oneshot, watch};

use crate::manager::Command;
use crate::subscription::{SubscriptionKey, SubscriptionSnapshot, SubscriptionState};

/// Handle to one subscription's control loop.
///
/// Cloning is cheap; all clones control the same subscription. Requests
/// never block: they are queued for the control loop and take effect in the
/// order they were made. Dropping the last clone tears the subscription down.
#[derive(Clone)]
pub struct SubscriptionHandle {
    key: SubscriptionKey,
    commands: UnboundedSender<Command>,
    published: watch::Receiver<SubscriptionSnapshot>,
}

impl SubscriptionHandle {
    pub(crate) fn new(
        key: SubscriptionKey,
        commands: UnboundedSender<Command>,
        published: watch::Receiver<SubscriptionSnapshot>,
    ) -> Self {
        SubscriptionHandle {
            key,
            commands,
            published,
        }
    }

    pub fn key(&self) -> &SubscriptionKey {
        &self.key
    }

    /// Most recently published state.
    pub fn state(&self) -> SubscriptionState {
        self.published.borrow().state
    }

    /// Most recently published retry count.
    pub fn retry_count(&self) -> u32 {
        self.published.borrow().retry_count
    }

    /// Most recently published snapshot, without waiting.
    pub fn current(&self) -> SubscriptionSnapshot {
        self.published.borrow().clone()
    }

    /// Snapshot taken after every previously queued request and transport
    /// callback has been handled.
    ///
    /// Falls back to the last published snapshot once the subscription has
    /// shut down.
    pub async fn snapshot(&self) -> SubscriptionSnapshot {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::Snapshot { reply }).is_ok() {
            if let Ok(snapshot) = response.await {
                return snapshot;
            }
        }
        self.current()
    }

    /// Receiver notified on every published change.
    pub fn watch_state(&self) -> watch::Receiver<SubscriptionSnapshot> {
        self.published.clone()
    }

    /// Wait until the published state satisfies `predicate`.
    ///
    /// Returns the matching state, or the last published one if the
    /// subscription shut down first.
    pub async fn wait_for_state<F>(&self, mut predicate: F) -> SubscriptionState
    where
        F: FnMut(SubscriptionState) -> bool,
    {
        let mut published = self.published.clone();
        let matched = published
            .wait_for(|snapshot| predicate(snapshot.state))
            .await
            .map(|snapshot| snapshot.state);
        match matched {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }

    /// Re-arm the subscription with a fresh channel.
    ///
    /// This is how a `Failed` subscription is brought back. While connecting
    /// or subscribed it replaces the current channel; once closed it is
    /// ignored.
    pub fn setup(&self) {
        if self.commands.send(Command::Setup).is_err() {
            tracing::debug!(key = %self.key, "setup ignored, subscription is closed");
        }
    }

    /// Cancel any pending retry, release the channel, and stop the subscription.
    ///
    /// Returns immediately. Safe to call any number of times from any state;
    /// await [`SubscriptionHandle::closed`] to observe completion.
    pub fn teardown(&self) {
        let _ = self.commands.send(Command::Teardown);
    }

    /// Wait until the subscription is closed.
    pub async fn closed(&self) {
        self.wait_for_state(|state| state == SubscriptionState::Closed)
            .await;
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("key", &self.key)
            .field("state", &self.state())
            .finish()
    }
}
