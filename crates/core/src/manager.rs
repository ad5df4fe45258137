// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-subscription control loop.
//!
//! Each subscription runs as one tokio task that exclusively owns its
//! [`Subscription`], the active transport channel, and the pending retry
//! timer. Transport callbacks, retry timers, and caller requests all arrive
//! as [`Command`]s on a single queue, so transitions never run concurrently
//! and the at-most-one channel / at-most-one timer invariants need no locks.
//!
//! Callbacks and timers hold only weak senders. When every
//! [`SubscriptionHandle`](crate::SubscriptionHandle) is gone the queue
//! closes and the loop tears the subscription down on its own.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, WeakUnboundedSender};
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::dispatch::EventDispatcher;
use crate::subscription::{
    ChannelStatus, Effect, Subscription, SubscriptionSnapshot, SubscriptionState, Trigger,
};
use crate::transport::{ChannelId, EventFilter, EventKind, Transport, TransportResult};

/// Requests processed by the control loop, in arrival order.
pub(crate) enum Command {
    /// Connect, or reconnect with a fresh channel.
    Setup,
    /// Status from the channel opened as `generation`.
    Status {
        generation: u64,
        status: ChannelStatus,
    },
    /// Row event from the channel opened as `generation`.
    Event { generation: u64, kind: EventKind },
    /// Retry timer `timer` ran to completion.
    RetryElapsed { timer: u64 },
    /// Report the state after every earlier command has been handled.
    Snapshot {
        reply: oneshot::Sender<SubscriptionSnapshot>,
    },
    Teardown,
}

/// The one channel a subscription may hold.
#[derive(Debug, Clone, Copy)]
struct ActiveChannel {
    id: ChannelId,
    /// Distinguishes callbacks from this channel and from released ones.
    generation: u64,
}

/// Owned, cancellable retry timer.
///
/// Dropping the timer cancels it. A timer that already fired is harmless:
/// the loop only acts on `RetryElapsed` whose id matches the pending timer.
struct RetryTimer {
    id: u64,
    token: CancellationToken,
}

impl RetryTimer {
    fn spawn(id: u64, delay: Duration, commands: WeakUnboundedSender<Command>) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(tx) = commands.upgrade() {
                        let _ = tx.send(Command::RetryElapsed { timer: id });
                    }
                }
            }
        });

        RetryTimer { id, token }
    }

    fn cancel(self) {
        drop(self);
    }
}

impl Drop for RetryTimer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Drives one subscription's state machine against the transport.
pub(crate) struct ChannelManager<T: Transport> {
    subscription: Subscription,
    transport: Arc<T>,
    dispatcher: EventDispatcher,
    commands: UnboundedReceiver<Command>,
    /// Handed to transport callbacks and timers.
    callbacks: WeakUnboundedSender<Command>,
    published: watch::Sender<SubscriptionSnapshot>,
    active_channel: Option<ActiveChannel>,
    pending_retry: Option<RetryTimer>,
    generation: u64,
    timer_seq: u64,
}

impl<T: Transport> ChannelManager<T> {
    pub(crate) fn new(
        subscription: Subscription,
        transport: Arc<T>,
        dispatcher: EventDispatcher,
        commands: UnboundedReceiver<Command>,
        callbacks: WeakUnboundedSender<Command>,
        published: watch::Sender<SubscriptionSnapshot>,
    ) -> Self {
        ChannelManager {
            subscription,
            transport,
            dispatcher,
            commands,
            callbacks,
            published,
            active_channel: None,
            pending_retry: None,
            generation: 0,
            timer_seq: 0,
        }
    }

    /// Set up the subscription, then process commands until teardown.
    pub(crate) async fn run(mut self) {
        self.handle(Trigger::Setup);

        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Setup => self.handle(Trigger::Setup),
                Command::Status { generation, status } => {
                    if self.is_current(generation) {
                        self.handle(Trigger::Status(status));
                    } else {
                        tracing::debug!(
                            key = %self.subscription.key(),
                            "ignoring {} status from released channel",
                            status
                        );
                    }
                }
                Command::Event { generation, kind } => {
                    if self.is_current(generation) {
                        self.handle(Trigger::Event(kind));
                    }
                }
                Command::RetryElapsed { timer } => {
                    if self.pending_retry.as_ref().is_some_and(|t| t.id == timer) {
                        self.pending_retry = None;
                        self.handle(Trigger::RetryElapsed);
                    } else {
                        tracing::debug!(
                            key = %self.subscription.key(),
                            "ignoring superseded retry timer {}",
                            timer
                        );
                    }
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(self.subscription.snapshot());
                }
                Command::Teardown => {
                    self.handle(Trigger::Teardown);
                    break;
                }
            }
        }

        // Every handle was dropped without an explicit teardown.
        if self.subscription.state() != SubscriptionState::Closed {
            self.handle(Trigger::Teardown);
        }
        tracing::info!(key = %self.subscription.key(), "subscription closed");
    }

    /// Apply a trigger, execute its effects, and publish the result.
    ///
    /// An effect may produce a follow-up trigger (a failed open becomes an
    /// `Errored` status); it is applied before publishing.
    fn handle(&mut self, trigger: Trigger) {
        let mut next = Some(trigger);
        while let Some(trigger) = next.take() {
            let before = self.subscription.state();
            let effects = self.subscription.apply(trigger);
            let after = self.subscription.state();
            if before != after {
                tracing::debug!(
                    key = %self.subscription.key(),
                    retry_count = self.subscription.retry_count(),
                    "{} -> {} on {:?}",
                    before,
                    after,
                    trigger
                );
            }

            for effect in effects {
                if let Some(follow_up) = self.execute(effect) {
                    next = Some(follow_up);
                }
            }
        }
        self.publish();
    }

    fn execute(&mut self, effect: Effect) -> Option<Trigger> {
        match effect {
            Effect::CancelRetry => {
                if let Some(timer) = self.pending_retry.take() {
                    tracing::debug!(
                        key = %self.subscription.key(),
                        "cancelled retry timer {}",
                        timer.id
                    );
                    timer.cancel();
                }
                None
            }
            Effect::ReleaseChannel => {
                self.release_channel();
                None
            }
            Effect::OpenChannel => match self.open_channel() {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!(key = %self.subscription.key(), "{}", e);
                    Some(Trigger::Status(ChannelStatus::Errored))
                }
            },
            Effect::ScheduleRetry { attempt, delay } => {
                self.schedule_retry(attempt, delay);
                None
            }
            Effect::Notify(cause) => {
                self.dispatcher.dispatch(cause);
                None
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active_channel
            .is_some_and(|channel| channel.generation == generation)
    }

    /// Open a channel named after the key, register listeners, and activate it.
    ///
    /// The channel becomes active as soon as it is open, so a failure while
    /// registering still leaves it to be released by the next transition.
    fn open_channel(&mut self) -> TransportResult<()> {
        let key = self.subscription.key().clone();
        let id = self.transport.open_channel(key.as_str())?;

        self.generation += 1;
        let generation = self.generation;
        self.active_channel = Some(ActiveChannel { id, generation });

        let filter = EventFilter {
            resource: self.subscription.resource().to_string(),
            filter: self.subscription.filter().map(str::to_string),
        };
        for kind in EventKind::ALL {
            let commands = self.callbacks.clone();
            self.transport.on_event(
                id,
                kind,
                &filter,
                Box::new(move || {
                    if let Some(tx) = commands.upgrade() {
                        let _ = tx.send(Command::Event { generation, kind });
                    }
                }),
            )?;
        }

        let commands = self.callbacks.clone();
        self.transport.on_status(
            id,
            Box::new(move |status| {
                if let Some(tx) = commands.upgrade() {
                    let _ = tx.send(Command::Status { generation, status });
                }
            }),
        )?;

        self.transport.subscribe(id)?;
        tracing::info!(key = %key, "subscribing channel {} to {}", id, filter.resource);
        Ok(())
    }

    fn release_channel(&mut self) {
        let Some(channel) = self.active_channel.take() else {
            return;
        };
        match self.transport.close_channel(channel.id) {
            Ok(()) => tracing::debug!(
                key = %self.subscription.key(),
                "released channel {}",
                channel.id
            ),
            Err(e) => tracing::warn!(
                key = %self.subscription.key(),
                "failed to release channel {}: {}",
                channel.id,
                e
            ),
        }
    }

    fn schedule_retry(&mut self, attempt: u32, delay: Duration) {
        tracing::warn!(
            key = %self.subscription.key(),
            "channel lost, retry {} of {} in {:?}",
            attempt + 1,
            self.subscription.max_retries(),
            delay
        );

        self.timer_seq += 1;
        let timer = RetryTimer::spawn(self.timer_seq, delay, self.callbacks.clone());
        if let Some(previous) = self.pending_retry.replace(timer) {
            previous.cancel();
        }
    }

    fn publish(&self) {
        let snapshot = self.subscription.snapshot();
        if snapshot.state == SubscriptionState::Failed {
            let already_failed = self.published.borrow().state == SubscriptionState::Failed;
            if !already_failed {
                tracing::error!(
                    key = %snapshot.key,
                    "giving up on channel after {} retries",
                    snapshot.retry_count
                );
            }
        }
        self.published.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
