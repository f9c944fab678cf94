//! Consume-once event streams exposed to the UI layer
//!
//! Every emitted value is delivered to exactly one subscriber and never
//! replayed after it has been consumed. A stream may be configured to hand
//! its latest value to a new subscriber when nothing is pending, so a screen
//! that subscribes late still learns the current playing flag.

use crate::player::aggregator::BufferingState;
use log::debug;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;

/// A decoder-reported failure for one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackError {
    /// Slot whose decoder failed
    pub slot_index: usize,

    /// Decoder error code, never 0
    pub code: i32,

    /// Human readable description
    pub message: String,
}

struct StreamState<T> {
    pending: VecDeque<T>,
    latest: Option<T>,
    closed: bool,
}

struct StreamInner<T> {
    name: &'static str,
    replay_latest: bool,
    state: Mutex<StreamState<T>>,
    notify: Notify,
}

/// A multi-subscriber stream where each value is consumed once
pub struct ConsumableStream<T> {
    inner: Arc<StreamInner<T>>,
}

impl<T> Clone for ConsumableStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send> ConsumableStream<T> {
    /// Create a stream
    pub fn new(name: &'static str) -> Self {
        Self::build(name, false)
    }

    /// Create a stream that replays its latest value to new subscribers
    pub fn with_replay(name: &'static str) -> Self {
        Self::build(name, true)
    }

    fn build(name: &'static str, replay_latest: bool) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                name,
                replay_latest,
                state: Mutex::new(StreamState {
                    pending: VecDeque::new(),
                    latest: None,
                    closed: false,
                }),
                notify: Notify::new(),
            }),
        }
    }

    /// Queue a value for the next subscriber that asks
    ///
    /// Values are never coalesced or dropped while the stream is open.
    pub fn emit(&self, value: T) {
        {
            let mut state = self.inner.state.lock();
            if state.closed {
                debug!("Dropping {} event on closed stream", self.inner.name);
                return;
            }

            if self.inner.replay_latest {
                state.latest = Some(value.clone());
            }
            state.pending.push_back(value);
        }
        self.inner.notify.notify_waiters();
    }

    /// Start consuming values
    pub fn subscribe(&self) -> Subscription<T> {
        let state = self.inner.state.lock();
        let replay = if self.inner.replay_latest && state.pending.is_empty() {
            state.latest.clone()
        } else {
            None
        };

        Subscription {
            inner: Arc::clone(&self.inner),
            replay,
        }
    }

    /// Number of values waiting to be consumed
    pub fn pending(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Stop accepting values and wake every waiting subscriber
    ///
    /// Values already queued stay available to subscribers.
    pub fn close(&self) {
        self.inner.state.lock().closed = true;
        self.inner.notify.notify_waiters();
    }
}

/// One consumer of a [`ConsumableStream`]
pub struct Subscription<T> {
    inner: Arc<StreamInner<T>>,
    replay: Option<T>,
}

impl<T: Clone + Send> Subscription<T> {
    /// Take the next value if one is available right now
    pub fn try_next(&mut self) -> Option<T> {
        if let Some(value) = self.replay.take() {
            return Some(value);
        }
        self.inner.state.lock().pending.pop_front()
    }

    /// Wait for the next value
    ///
    /// Returns `None` once the stream is closed and drained.
    pub async fn next(&mut self) -> Option<T> {
        let inner = Arc::clone(&self.inner);
        loop {
            let notified = inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(value) = self.try_next() {
                return Some(value);
            }

            if inner.state.lock().closed {
                return None;
            }

            notified.await;
        }
    }

    /// Take everything available right now
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::new();
        while let Some(value) = self.try_next() {
            values.push(value);
        }
        values
    }
}

/// The streams the orchestrator exposes to the UI layer
#[derive(Clone)]
pub struct PlayerStreams {
    /// Full buffering snapshot after every upsert
    pub buffering: ConsumableStream<Vec<BufferingState>>,

    /// Aggregate "any stream playing" flag after every transition
    pub playing: ConsumableStream<bool>,

    /// Slot whose intrinsic video size changed
    pub size_changed: ConsumableStream<usize>,

    /// Decoder-reported playback failures
    pub errors: ConsumableStream<PlaybackError>,
}

impl Default for PlayerStreams {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerStreams {
    pub fn new() -> Self {
        Self {
            buffering: ConsumableStream::new("buffering"),
            playing: ConsumableStream::with_replay("playing"),
            size_changed: ConsumableStream::with_replay("size-changed"),
            errors: ConsumableStream::new("error"),
        }
    }

    /// Close every stream
    pub fn close(&self) {
        self.buffering.close();
        self.playing.close();
        self.size_changed.close();
        self.errors.close();
    }
}
