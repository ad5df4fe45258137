// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles: a settable clock and an in-memory transport.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::time::Instant;

use crate::clock::ClockSource;
use crate::subscription::ChannelStatus;
use crate::transport::{
    ChannelId, EventCallback, EventFilter, EventKind, StatusCallback, Transport, TransportError,
    TransportResult,
};

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    ms: Arc<AtomicU64>,
}

impl FixedClock {
    pub fn new(ms: u64) -> Self {
        FixedClock {
            ms: Arc::new(AtomicU64::new(ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.ms.store(ms, Ordering::SeqCst);
    }
}

impl ClockSource for FixedClock {
    fn now_ms(&self) -> u64 {
        self.ms.load(Ordering::SeqCst)
    }
}

struct MockChannel {
    name: String,
    filters: BTreeMap<&'static str, EventFilter>,
    events: BTreeMap<&'static str, Arc<dyn Fn() + Send + Sync>>,
    status: Option<Arc<dyn Fn(ChannelStatus) + Send + Sync>>,
    subscribed: bool,
    closed: bool,
}

#[derive(Default)]
struct MockState {
    next_id: u64,
    channels: BTreeMap<ChannelId, MockChannel>,
    /// Every open attempt, successful or not, stamped with tokio time.
    open_attempts: Vec<Instant>,
    closed: Vec<ChannelId>,
    fail_open: bool,
    fail_subscribe: bool,
    fail_close: bool,
    /// Status delivered from inside `subscribe`, before it returns.
    auto_status: Option<ChannelStatus>,
}

/// In-memory transport. Status and events are emitted by the test.
///
/// Callbacks are invoked without holding the internal lock. Emitting on a
/// closed channel still reaches its callbacks, the way a late message in
/// flight would.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.state.lock().unwrap().fail_open = fail;
    }

    pub fn set_fail_subscribe(&self, fail: bool) {
        self.state.lock().unwrap().fail_subscribe = fail;
    }

    pub fn set_fail_close(&self, fail: bool) {
        self.state.lock().unwrap().fail_close = fail;
    }

    pub fn set_auto_status(&self, status: Option<ChannelStatus>) {
        self.state.lock().unwrap().auto_status = status;
    }

    /// Number of open attempts so far.
    pub fn open_attempts(&self) -> usize {
        self.state.lock().unwrap().open_attempts.len()
    }

    pub fn open_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().open_attempts.clone()
    }

    /// Channels opened and not yet closed.
    pub fn live_channels(&self) -> Vec<ChannelId> {
        let state = self.state.lock().unwrap();
        state
            .channels
            .iter()
            .filter(|(_, channel)| !channel.closed)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn closed_channels(&self) -> Vec<ChannelId> {
        self.state.lock().unwrap().closed.clone()
    }

    /// Most recently opened channel.
    pub fn latest(&self) -> ChannelId {
        let state = self.state.lock().unwrap();
        *state.channels.keys().next_back().expect("no channel opened")
    }

    pub fn name_of(&self, id: ChannelId) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.channels.get(&id).map(|c| c.name.clone())
    }

    pub fn filter_for(&self, id: ChannelId, kind: EventKind) -> Option<EventFilter> {
        let state = self.state.lock().unwrap();
        state
            .channels
            .get(&id)
            .and_then(|c| c.filters.get(kind.as_str()).cloned())
    }

    pub fn is_subscribed(&self, id: ChannelId) -> bool {
        let state = self.state.lock().unwrap();
        state.channels.get(&id).is_some_and(|c| c.subscribed)
    }

    /// Deliver a status to the channel's status listener. Returns false if none.
    pub fn emit_status(&self, id: ChannelId, status: ChannelStatus) -> bool {
        let callback = {
            let state = self.state.lock().unwrap();
            state.channels.get(&id).and_then(|c| c.status.clone())
        };
        match callback {
            Some(callback) => {
                callback(status);
                true
            }
            None => false,
        }
    }

    /// Deliver a row event. Returns false if no listener is registered for it.
    pub fn emit_event(&self, id: ChannelId, kind: EventKind) -> bool {
        let callback = {
            let state = self.state.lock().unwrap();
            state
                .channels
                .get(&id)
                .and_then(|c| c.events.get(kind.as_str()).cloned())
        };
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl Transport for MockTransport {
    fn open_channel(&self, name: &str) -> TransportResult<ChannelId> {
        let mut state = self.state.lock().unwrap();
        state.open_attempts.push(Instant::now());
        if state.fail_open {
            return Err(TransportError::OpenFailed {
                name: name.to_string(),
                reason: "mock failure".into(),
            });
        }

        state.next_id += 1;
        let id = ChannelId(state.next_id);
        state.channels.insert(
            id,
            MockChannel {
                name: name.to_string(),
                filters: BTreeMap::new(),
                events: BTreeMap::new(),
                status: None,
                subscribed: false,
                closed: false,
            },
        );
        Ok(id)
    }

    fn on_event(
        &self,
        channel: ChannelId,
        kind: EventKind,
        filter: &EventFilter,
        callback: EventCallback,
    ) -> TransportResult<()> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .channels
            .get_mut(&channel)
            .ok_or(TransportError::UnknownChannel(channel))?;
        entry.filters.insert(kind.as_str(), filter.clone());
        entry.events.insert(kind.as_str(), Arc::from(callback));
        Ok(())
    }

    fn on_status(&self, channel: ChannelId, callback: StatusCallback) -> TransportResult<()> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .channels
            .get_mut(&channel)
            .ok_or(TransportError::UnknownChannel(channel))?;
        entry.status = Some(Arc::from(callback));
        Ok(())
    }

    fn subscribe(&self, channel: ChannelId) -> TransportResult<()> {
        let (status, callback) = {
            let mut state = self.state.lock().unwrap();
            if state.fail_subscribe {
                return Err(TransportError::SubscribeFailed {
                    channel,
                    reason: "mock failure".into(),
                });
            }
            let auto_status = state.auto_status;
            let entry = state
                .channels
                .get_mut(&channel)
                .ok_or(TransportError::UnknownChannel(channel))?;
            entry.subscribed = true;
            (auto_status, entry.status.clone())
        };

        if let (Some(status), Some(callback)) = (status, callback) {
            callback(status);
        }
        Ok(())
    }

    fn close_channel(&self, channel: ChannelId) -> TransportResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_close {
            return Err(TransportError::CloseFailed {
                channel,
                reason: "mock failure".into(),
            });
        }
        let entry = state
            .channels
            .get_mut(&channel)
            .ok_or(TransportError::UnknownChannel(channel))?;
        entry.closed = true;
        entry.subscribed = false;
        state.closed.push(channel);
        Ok(())
    }
}
