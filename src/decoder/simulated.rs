//! Simulated decoder for Multiview
//!
//! Stands in for the live-stream engine in the CLI and the tests. Every call
//! is recorded, and playback emits the event sequence a real live stream
//! produces when it starts.

use crate::decoder::{Decoder, DecoderEvent, DecoderFactory, DecoderListener, Quality};
use crate::layout::StreamSlot;
use crate::player::PlayerState;
use crate::surface::PaintableSurface;
use crate::utils::error::{MultiviewError, Result};
use log::debug;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A recorded call made on a simulated decoder
#[derive(Debug, Clone, PartialEq)]
pub enum DecoderCall {
    Load(String),
    Play,
    Pause,
    Release,
    SetSurface(Option<PaintableSurface>),
    SetMaxQuality(String),
    AddListener,
    RemoveListener,
}

/// Behaviour of the simulated decoders created by one factory
#[derive(Debug, Clone)]
pub struct SimulationScript {
    /// Quality levels every stream offers
    pub qualities: Vec<Quality>,

    /// Intrinsic video size reported once playback starts
    pub video_size: (u32, u32),

    /// Emit the start-up event sequence on the first `play()`
    pub emit_on_play: bool,

    /// Slots whose decoder cannot be created
    pub fail_create_slots: Vec<usize>,

    /// Slots whose `load()` fails
    pub fail_load_slots: Vec<usize>,
}

impl Default for SimulationScript {
    fn default() -> Self {
        Self {
            qualities: vec![
                Quality::new("1080p", 1920, 1080, 6_000_000),
                Quality::new("720p", 1280, 720, 3_000_000),
                Quality::new("480p", 852, 480, 1_500_000),
                Quality::new("360p", 640, 360, 800_000),
            ],
            video_size: (1920, 1080),
            emit_on_play: true,
            fail_create_slots: Vec::new(),
            fail_load_slots: Vec::new(),
        }
    }
}

type CallLog = Arc<Mutex<Vec<(usize, DecoderCall)>>>;

/// Decoder that replays a scripted live-stream start-up
pub struct SimulatedDecoder {
    slot_index: usize,
    script: SimulationScript,
    listener: Option<DecoderListener>,
    calls: CallLog,
    listeners: Arc<Mutex<Vec<DecoderListener>>>,
    started: bool,
}

impl SimulatedDecoder {
    fn record(&self, call: DecoderCall) {
        self.calls.lock().push((self.slot_index, call));
    }

    fn emit(&self, event: DecoderEvent) {
        if let Some(listener) = &self.listener {
            listener.emit(event);
        }
    }
}

impl Decoder for SimulatedDecoder {
    fn load(&mut self, uri: &str) -> Result<()> {
        self.record(DecoderCall::Load(uri.to_string()));

        if uri.is_empty() || self.script.fail_load_slots.contains(&self.slot_index) {
            return Err(MultiviewError::decoder_error(format!("Cannot open stream '{}'", uri)));
        }

        Ok(())
    }

    fn play(&mut self) {
        self.record(DecoderCall::Play);

        if !self.script.emit_on_play {
            return;
        }

        if self.started {
            self.emit(DecoderEvent::State(PlayerState::Playing));
            return;
        }

        self.started = true;
        let (width, height) = self.script.video_size;
        self.emit(DecoderEvent::State(PlayerState::Buffering));
        self.emit(DecoderEvent::QualitiesAvailable(self.script.qualities.clone()));
        self.emit(DecoderEvent::State(PlayerState::Ready));
        self.emit(DecoderEvent::VideoSize { width, height });
        self.emit(DecoderEvent::State(PlayerState::Playing));
    }

    fn pause(&mut self) {
        self.record(DecoderCall::Pause);

        if self.script.emit_on_play && self.started {
            self.emit(DecoderEvent::State(PlayerState::Paused));
        }
    }

    fn release(&mut self) {
        self.record(DecoderCall::Release);
        self.listener = None;
    }

    fn set_surface(&mut self, surface: Option<PaintableSurface>) {
        self.record(DecoderCall::SetSurface(surface));
    }

    fn set_max_quality(&mut self, quality: &Quality) {
        self.record(DecoderCall::SetMaxQuality(quality.name.clone()));
    }

    fn qualities(&self) -> Vec<Quality> {
        self.script.qualities.clone()
    }

    fn add_listener(&mut self, listener: DecoderListener) {
        self.record(DecoderCall::AddListener);
        self.listeners.lock().push(listener.clone());
        self.listener = Some(listener);
    }

    fn remove_listener(&mut self) {
        self.record(DecoderCall::RemoveListener);
        self.listener = None;
    }
}

/// Factory producing simulated decoders that share one call log
#[derive(Default)]
pub struct SimulatedDecoderFactory {
    script: SimulationScript,
    calls: CallLog,
    listeners: Arc<Mutex<Vec<DecoderListener>>>,
    created: AtomicUsize,
}

impl SimulatedDecoderFactory {
    /// Create a factory with the given script
    pub fn new(script: SimulationScript) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }

    /// Number of decoders created so far
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// All recorded calls in order, tagged with their slot
    pub fn calls(&self) -> Vec<(usize, DecoderCall)> {
        self.calls.lock().clone()
    }

    /// Recorded calls for one slot
    pub fn calls_for(&self, slot_index: usize) -> Vec<DecoderCall> {
        self.calls
            .lock()
            .iter()
            .filter(|(slot, _)| *slot == slot_index)
            .map(|(_, call)| call.clone())
            .collect()
    }

    /// The most recent listener attached for a slot
    ///
    /// The clone stays usable after the decoder detaches it, which lets
    /// tests emit late events the way a decoder thread racing `release()` would.
    pub fn listener(&self, slot_index: usize) -> Option<DecoderListener> {
        self.listeners
            .lock()
            .iter()
            .rev()
            .find(|listener| listener.slot_index() == slot_index)
            .cloned()
    }
}

impl DecoderFactory for SimulatedDecoderFactory {
    fn create(&self, slot: &StreamSlot) -> Result<Box<dyn Decoder>> {
        if self.script.fail_create_slots.contains(&slot.index) {
            return Err(MultiviewError::decoder_error(format!(
                "No decoder available for slot {}",
                slot.index
            )));
        }

        self.created.fetch_add(1, Ordering::SeqCst);
        debug!("Created simulated decoder for slot {}", slot.index);

        Ok(Box::new(SimulatedDecoder {
            slot_index: slot.index,
            script: self.script.clone(),
            listener: None,
            calls: Arc::clone(&self.calls),
            listeners: Arc::clone(&self.listeners),
            started: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::SlotEvent;
    use tokio::sync::mpsc;

    fn slot(index: usize) -> StreamSlot {
        StreamSlot::new(index, "https://example.com/live.m3u8", "1080p")
    }

    #[test]
    fn test_play_emits_startup_sequence() {
        let factory = SimulatedDecoderFactory::new(SimulationScript::default());
        let mut decoder = factory.create(&slot(0)).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel::<SlotEvent>();

        decoder.add_listener(DecoderListener::new(0, 1, tx));
        decoder.play();

        let mut states = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let DecoderEvent::State(state) = event.event {
                states.push(state);
            }
        }
        assert_eq!(
            states,
            vec![PlayerState::Buffering, PlayerState::Ready, PlayerState::Playing]
        );
    }

    #[test]
    fn test_removed_listener_receives_nothing() {
        let factory = SimulatedDecoderFactory::new(SimulationScript::default());
        let mut decoder = factory.create(&slot(1)).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel::<SlotEvent>();

        decoder.add_listener(DecoderListener::new(1, 1, tx));
        decoder.remove_listener();
        decoder.play();

        assert!(rx.try_recv().is_err());
        assert_eq!(
            factory.calls_for(1),
            vec![DecoderCall::AddListener, DecoderCall::RemoveListener, DecoderCall::Play]
        );
    }

    #[test]
    fn test_scripted_failures() {
        let script = SimulationScript {
            fail_create_slots: vec![1],
            fail_load_slots: vec![0],
            ..Default::default()
        };
        let factory = SimulatedDecoderFactory::new(script);

        assert!(factory.create(&slot(1)).is_err());
        let mut decoder = factory.create(&slot(0)).unwrap();
        assert!(decoder.load("https://example.com/live.m3u8").is_err());
        assert_eq!(factory.created(), 1);
    }
}
