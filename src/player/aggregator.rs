//! Buffering and playback state aggregation
//!
//! Keeps the per-slot buffering flags and the derived "any stream playing"
//! flag. Every call emits: nothing is coalesced, so the UI sees each step.

use crate::player::events::PlayerStreams;
use crate::player::state::{PlayerHandle, PlayerState};
use log::debug;
use serde::Serialize;

/// Buffering flag of one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferingState {
    pub slot_index: usize,
    pub is_buffering: bool,
}

/// True iff at least one player is playing
///
/// Only [`BufferingAggregator::recompute_aggregate_playing`] can change it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatePlaybackFlag(bool);

impl AggregatePlaybackFlag {
    pub fn get(&self) -> bool {
        self.0
    }
}

/// Per-slot buffering mapping plus the aggregate playing flag
pub struct BufferingAggregator {
    entries: Vec<BufferingState>,
    playing: AggregatePlaybackFlag,
    streams: PlayerStreams,
}

impl BufferingAggregator {
    /// Create an aggregator that emits onto `streams`
    pub fn new(streams: PlayerStreams) -> Self {
        Self {
            entries: Vec::new(),
            playing: AggregatePlaybackFlag::default(),
            streams,
        }
    }

    /// Replace or append the flag for a slot, then emit the full mapping
    pub fn upsert(&mut self, slot_index: usize, is_buffering: bool) -> Vec<BufferingState> {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.slot_index == slot_index)
        {
            Some(entry) => entry.is_buffering = is_buffering,
            None => self.entries.push(BufferingState {
                slot_index,
                is_buffering,
            }),
        }

        debug!("Buffering state updated: {:?}", self.entries);
        let snapshot = self.entries.clone();
        self.streams.buffering.emit(snapshot.clone());
        snapshot
    }

    /// Recompute and emit the aggregate playing flag
    pub fn recompute_aggregate_playing<'a, I>(&mut self, handles: I) -> bool
    where
        I: IntoIterator<Item = &'a PlayerHandle>,
    {
        let is_playing = handles
            .into_iter()
            .any(|handle| handle.state == PlayerState::Playing);

        self.playing = AggregatePlaybackFlag(is_playing);
        self.streams.playing.emit(is_playing);
        is_playing
    }

    /// Current buffering mapping
    pub fn snapshot(&self) -> &[BufferingState] {
        &self.entries
    }

    pub fn playing(&self) -> AggregatePlaybackFlag {
        self.playing
    }
}
