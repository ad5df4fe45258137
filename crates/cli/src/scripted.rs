// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! A transport that replays channel statuses from a script.
//!
//! Every `subscribe` consumes one turn of the script: tokens up to and
//! including the next failure (`closed` or `errored`). Once the script is
//! exhausted, channels simply report `subscribed`. Each `subscribed` is
//! followed by the configured number of insert events. Everything is
//! delivered from inside `subscribe`, before it returns.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fw_core::{
    ChannelId, ChannelStatus, EventCallback, EventFilter, EventKind, StatusCallback, Transport,
    TransportError, TransportResult,
};

use crate::error::{Error, Result};

/// Parse script tokens such as `errored`, `subscribed`.
pub fn parse_script(tokens: &[String]) -> Result<VecDeque<ChannelStatus>> {
    tokens
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .map(|t| t.parse().map_err(|_| Error::InvalidScript(t)))
        .collect()
}

/// Pop the next turn off the script.
fn take_turn(script: &mut VecDeque<ChannelStatus>) -> Vec<ChannelStatus> {
    let mut turn = Vec::new();
    while let Some(status) = script.pop_front() {
        turn.push(status);
        if status.is_failure() {
            break;
        }
    }
    if turn.is_empty() {
        turn.push(ChannelStatus::Subscribed);
    }
    turn
}

type SharedStatus = Arc<dyn Fn(ChannelStatus) + Send + Sync>;
type SharedEvent = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct ScriptedChannel {
    status: Option<SharedStatus>,
    insert: Option<SharedEvent>,
    closed: bool,
}

struct ScriptState {
    script: VecDeque<ChannelStatus>,
    channels: BTreeMap<ChannelId, ScriptedChannel>,
    next_id: u64,
}

pub struct ScriptedTransport {
    state: Mutex<ScriptState>,
    events_per_subscribe: u32,
}

impl ScriptedTransport {
    pub fn new(script: VecDeque<ChannelStatus>, events_per_subscribe: u32) -> Self {
        ScriptedTransport {
            state: Mutex::new(ScriptState {
                script,
                channels: BTreeMap::new(),
                next_id: 0,
            }),
            events_per_subscribe,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn channels_opened(&self) -> usize {
        self.lock().channels.len()
    }

    pub fn live_channels(&self) -> usize {
        self.lock().channels.values().filter(|c| !c.closed).count()
    }

    /// Script tokens not yet replayed.
    pub fn remaining(&self) -> usize {
        self.lock().script.len()
    }
}

impl Transport for ScriptedTransport {
    fn open_channel(&self, name: &str) -> TransportResult<ChannelId> {
        let mut state = self.lock();
        state.next_id += 1;
        let id = ChannelId(state.next_id);
        state.channels.insert(id, ScriptedChannel::default());
        tracing::debug!("opened channel {} as '{}'", id, name);
        Ok(id)
    }

    fn on_event(
        &self,
        channel: ChannelId,
        kind: EventKind,
        _filter: &EventFilter,
        callback: EventCallback,
    ) -> TransportResult<()> {
        let mut state = self.lock();
        let entry = state
            .channels
            .get_mut(&channel)
            .ok_or(TransportError::UnknownChannel(channel))?;
        // Only inserts are ever emitted.
        if kind == EventKind::Insert {
            entry.insert = Some(Arc::from(callback));
        }
        Ok(())
    }

    fn on_status(&self, channel: ChannelId, callback: StatusCallback) -> TransportResult<()> {
        let mut state = self.lock();
        let entry = state
            .channels
            .get_mut(&channel)
            .ok_or(TransportError::UnknownChannel(channel))?;
        entry.status = Some(Arc::from(callback));
        Ok(())
    }

    fn subscribe(&self, channel: ChannelId) -> TransportResult<()> {
        let (turn, status, insert) = {
            let mut state = self.lock();
            let entry = state
                .channels
                .get(&channel)
                .ok_or(TransportError::UnknownChannel(channel))?;
            let (status, insert) = (entry.status.clone(), entry.insert.clone());
            (take_turn(&mut state.script), status, insert)
        };
        let Some(status) = status else {
            return Err(TransportError::SubscribeFailed {
                channel,
                reason: "no status listener registered".to_string(),
            });
        };

        tracing::debug!("channel {} replays {:?}", channel, turn);
        for next in turn {
            status(next);
            if next == ChannelStatus::Subscribed {
                if let Some(insert) = &insert {
                    for _ in 0..self.events_per_subscribe {
                        insert();
                    }
                }
            }
        }
        Ok(())
    }

    fn close_channel(&self, channel: ChannelId) -> TransportResult<()> {
        let mut state = self.lock();
        let entry = state
            .channels
            .get_mut(&channel)
            .ok_or(TransportError::UnknownChannel(channel))?;
        entry.closed = true;
        entry.status = None;
        entry.insert = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "scripted_tests.rs"]
mod tests;
