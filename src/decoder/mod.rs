//! Decoder module for Multiview
//!
//! The live-stream decode engine is an external collaborator: it opens a
//! network stream, decodes it and paints frames onto a surface. This module
//! defines the interface the orchestrator consumes from it, the single
//! tagged event type its listener delivers, and a simulated implementation
//! used by the CLI and the tests.

mod simulated;

pub use simulated::{DecoderCall, SimulatedDecoder, SimulatedDecoderFactory, SimulationScript};

use crate::player::PlayerState;
use crate::surface::PaintableSurface;
use crate::utils::error::Result;
use crate::layout::StreamSlot;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;

/// Decoder trait defining the interface of one external player instance
pub trait Decoder: Send {
    /// Open a stream for playback
    ///
    /// # Arguments
    ///
    /// * `uri` - Source URI of the stream
    fn load(&mut self, uri: &str) -> Result<()>;

    /// Start or resume playback
    fn play(&mut self);

    /// Pause playback
    fn pause(&mut self);

    /// Release all decoder resources
    fn release(&mut self);

    /// Bind the decoder output to a surface, or unbind it with `None`
    fn set_surface(&mut self, surface: Option<PaintableSurface>);

    /// Cap automatic quality selection at the given level
    fn set_max_quality(&mut self, quality: &Quality);

    /// Quality levels currently offered by the stream
    fn qualities(&self) -> Vec<Quality>;

    /// Attach the listener that receives this decoder's events
    fn add_listener(&mut self, listener: DecoderListener);

    /// Detach the listener; no event may be delivered afterwards
    fn remove_listener(&mut self);
}

/// Creates decoder instances for stream slots
pub trait DecoderFactory: Send + Sync {
    /// Create a decoder for the given slot
    fn create(&self, slot: &StreamSlot) -> Result<Box<dyn Decoder>>;
}

/// A quality level offered by a stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quality {
    /// Label such as "1080p"
    pub name: String,

    /// Frame width
    pub width: u32,

    /// Frame height
    pub height: u32,

    /// Bitrate in bits per second
    pub bitrate: u32,
}

impl Quality {
    /// Create a quality level
    pub fn new(name: impl Into<String>, width: u32, height: u32, bitrate: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            bitrate,
        }
    }
}

/// Events reported by a decoder listener
///
/// Consumers match only the variants they care about.
#[derive(Debug, Clone, PartialEq)]
pub enum DecoderEvent {
    /// Analytics key/value pair
    Analytics { key: String, value: String },

    /// Playback stalled and is rebuffering
    Rebuffer,

    /// Seek finished at the given position
    Seek { position: Duration },

    /// Active quality changed
    Quality(Quality),

    /// Intrinsic video size changed
    VideoSize { width: u32, height: u32 },

    /// Timed metadata cue
    Cue { text: String },

    /// Stream duration changed
    Duration(Duration),

    /// Playback state changed
    State(PlayerState),

    /// Decoder error; code 0 is informational
    Error { code: i32, message: String },

    /// Raw metadata payload
    Metadata { mime: String, payload: Vec<u8> },

    /// Network became unavailable
    NetworkLost,

    /// Quality levels became known
    QualitiesAvailable(Vec<Quality>),
}

/// A decoder event tagged with the slot and handle generation it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SlotEvent {
    /// Slot index of the emitting decoder
    pub slot_index: usize,

    /// Generation of the handle set the decoder belongs to
    pub generation: u64,

    /// The event itself
    pub event: DecoderEvent,
}

/// Listener handed to a decoder; forwards events onto the event loop
#[derive(Debug, Clone)]
pub struct DecoderListener {
    slot_index: usize,
    generation: u64,
    tx: mpsc::UnboundedSender<SlotEvent>,
}

impl DecoderListener {
    pub(crate) fn new(slot_index: usize, generation: u64, tx: mpsc::UnboundedSender<SlotEvent>) -> Self {
        Self {
            slot_index,
            generation,
            tx,
        }
    }

    /// Slot this listener reports for
    pub fn slot_index(&self) -> usize {
        self.slot_index
    }

    /// Deliver an event; silently dropped once the event loop is gone
    pub fn emit(&self, event: DecoderEvent) {
        let _ = self.tx.send(SlotEvent {
            slot_index: self.slot_index,
            generation: self.generation,
            event,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_tags_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let listener = DecoderListener::new(2, 7, tx);

        listener.emit(DecoderEvent::Rebuffer);
        listener.emit(DecoderEvent::VideoSize { width: 1920, height: 1080 });

        let first = rx.try_recv().unwrap();
        assert_eq!(first.slot_index, 2);
        assert_eq!(first.generation, 7);
        assert_eq!(first.event, DecoderEvent::Rebuffer);

        let second = rx.try_recv().unwrap();
        assert_eq!(second.event, DecoderEvent::VideoSize { width: 1920, height: 1080 });
    }

    #[test]
    fn test_listener_outlives_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = DecoderListener::new(0, 1, tx);
        drop(rx);

        // Must not panic
        listener.emit(DecoderEvent::NetworkLost);
    }
}
