//! Per-stream player state for Multiview
//!
//! Each slot of a template owns one [`PlayerHandle`]: the decoder instance
//! plus the lifecycle state and intrinsic video size last reported for it.

use crate::decoder::Decoder;
use crate::layout::Size;
use crate::surface::PaintableSurface;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one player
///
/// `Uninitialized -> Loading -> Buffering <-> Ready -> Playing <-> Paused`.
/// A live stream may stall and fall back to `Buffering` while playing.
/// `Error` is reachable from any non-terminal state; `Released` is terminal
/// and reachable from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// Created, no stream opened yet
    Uninitialized,

    /// Stream is being opened
    Loading,

    /// Waiting for enough data to play
    Buffering,

    /// Enough data to start playback
    Ready,

    /// Frames are being presented
    Playing,

    /// Playback paused by the user
    Paused,

    /// Decoder reported a failure
    Error,

    /// Decoder released; nothing more happens
    Released,
}

impl PlayerState {
    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlayerState::Released)
    }

    /// Whether `next` is an expected successor of this state
    pub fn can_transition_to(&self, next: PlayerState) -> bool {
        use PlayerState::*;

        if *self == next {
            return true;
        }

        match (*self, next) {
            (Released, _) => false,
            (_, Released) => true,
            (_, Error) => true,
            (Uninitialized, Loading) => true,
            (Loading, Buffering | Ready) => true,
            (Buffering, Ready | Playing) => true,
            (Ready, Buffering | Playing | Paused) => true,
            (Playing, Paused | Buffering) => true,
            (Paused, Playing | Buffering) => true,
            (Error, Loading) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlayerState::Uninitialized => "UNINITIALIZED",
            PlayerState::Loading => "LOADING",
            PlayerState::Buffering => "BUFFERING",
            PlayerState::Ready => "READY",
            PlayerState::Playing => "PLAYING",
            PlayerState::Paused => "PAUSED",
            PlayerState::Error => "ERROR",
            PlayerState::Released => "RELEASED",
        };
        write!(f, "{}", name)
    }
}

/// One live player owned by the orchestrator
pub struct PlayerHandle {
    /// Slot this player renders
    pub index: usize,

    /// Last known lifecycle state
    pub state: PlayerState,

    /// Intrinsic video width, 0 until reported
    pub intrinsic_width: u32,

    /// Intrinsic video height, 0 until reported
    pub intrinsic_height: u32,

    /// The decoder instance
    pub(crate) decoder: Box<dyn Decoder>,

    /// Surface the decoder currently paints onto
    pub(crate) surface: Option<PaintableSurface>,

    /// Automatic quality selection has been capped
    pub(crate) quality_locked: bool,
}

impl PlayerHandle {
    pub(crate) fn new(index: usize, decoder: Box<dyn Decoder>) -> Self {
        Self {
            index,
            state: PlayerState::Uninitialized,
            intrinsic_width: 0,
            intrinsic_height: 0,
            decoder,
            surface: None,
            quality_locked: false,
        }
    }

    /// Move to `next`, returning whether the state changed
    ///
    /// The decoder is authoritative, so an unexpected transition is logged
    /// and applied anyway. Nothing leaves `Released`.
    pub(crate) fn transition(&mut self, next: PlayerState) -> bool {
        if self.state == next {
            return false;
        }

        if self.state.is_terminal() {
            debug!("Player {} already released, ignoring {}", self.index, next);
            return false;
        }

        if !self.state.can_transition_to(next) {
            warn!("Player {} unexpected transition {} -> {}", self.index, self.state, next);
        }

        debug!("Player {} state {} -> {}", self.index, self.state, next);
        self.state = next;
        true
    }

    /// Record a reported video size, returning whether it changed
    pub(crate) fn update_video_size(&mut self, width: u32, height: u32) -> bool {
        if self.intrinsic_width == width && self.intrinsic_height == height {
            return false;
        }
        self.intrinsic_width = width;
        self.intrinsic_height = height;
        true
    }

    /// Intrinsic video size
    pub fn video_size(&self) -> Size {
        Size::new(self.intrinsic_width, self.intrinsic_height)
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }
}

impl fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("index", &self.index)
            .field("state", &self.state)
            .field("intrinsic_width", &self.intrinsic_width)
            .field("intrinsic_height", &self.intrinsic_height)
            .field("surface", &self.surface)
            .field("quality_locked", &self.quality_locked)
            .finish()
    }
}
