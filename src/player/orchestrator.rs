//! Player orchestrator for Multiview
//!
//! Owns one player per template slot and drives their lifecycle. Decoder
//! listeners push tagged events into a single channel; the event loop
//! drains it through [`EventPump`] and hands every event back to
//! [`PlayerOrchestrator::handle_event`], so all mutation happens in one place
//! and in emission order.

use crate::decoder::{DecoderEvent, DecoderFactory, DecoderListener, SlotEvent};
use crate::layout::{fit_video, StreamSlot, Template};
use crate::player::aggregator::{BufferingAggregator, BufferingState};
use crate::player::events::{PlaybackError, PlayerStreams};
use crate::player::state::{PlayerHandle, PlayerState};
use crate::surface::SurfaceHandle;
use crate::utils::config::PlaybackConfig;
use crate::utils::error::Result;
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Error code reported when a player cannot be created or opened locally
pub const LOCAL_FAILURE_CODE: i32 = -1;

/// Receiving end of the decoder event channel
pub struct EventPump {
    rx: mpsc::UnboundedReceiver<SlotEvent>,
}

impl EventPump {
    /// Wait for the next decoder event
    pub async fn recv(&mut self) -> Option<SlotEvent> {
        self.rx.recv().await
    }

    /// Take the next decoder event if one is queued
    pub fn try_recv(&mut self) -> Option<SlotEvent> {
        self.rx.try_recv().ok()
    }
}

/// Drives the players of one screen
pub struct PlayerOrchestrator {
    /// Stream slots of the active template
    slots: Vec<StreamSlot>,

    /// Creates one decoder per slot
    factory: Arc<dyn DecoderFactory>,

    /// Playback settings
    config: PlaybackConfig,

    /// Live players, at most one per slot
    handles: Vec<PlayerHandle>,

    /// Buffering flags and aggregate playing flag
    aggregator: BufferingAggregator,

    /// Streams exposed to the UI layer
    streams: PlayerStreams,

    /// Sender cloned into every decoder listener
    event_tx: mpsc::UnboundedSender<SlotEvent>,

    /// Bumped on release; events tagged with an older value are discarded
    generation: u64,
}

impl PlayerOrchestrator {
    /// Create an orchestrator for the given slots
    ///
    /// Returns the orchestrator together with the receiving end of its
    /// decoder event channel.
    pub fn new(
        slots: Vec<StreamSlot>,
        factory: Arc<dyn DecoderFactory>,
        config: PlaybackConfig,
    ) -> (Self, EventPump) {
        let (event_tx, rx) = mpsc::unbounded_channel();
        let streams = PlayerStreams::new();

        let orchestrator = Self {
            slots,
            factory,
            config,
            handles: Vec::new(),
            aggregator: BufferingAggregator::new(streams.clone()),
            streams,
            event_tx,
            generation: 1,
        };

        (orchestrator, EventPump { rx })
    }

    /// Create an orchestrator for every slot of a template
    pub fn for_template(
        template: Template,
        factory: Arc<dyn DecoderFactory>,
        config: PlaybackConfig,
    ) -> (Self, EventPump) {
        Self::new(template.slots().to_vec(), factory, config)
    }

    /// Create, bind, load and start one player per slot
    ///
    /// Does nothing when players already exist. A slot whose player cannot be
    /// created or opened reports a [`PlaybackError`] and the remaining slots
    /// carry on.
    pub fn initialize(&mut self, surfaces: &[SurfaceHandle]) -> Result<()> {
        if !self.handles.is_empty() {
            debug!("Players already initialized, ignoring");
            return Ok(());
        }

        info!("Initializing {} players", self.slots.len());

        for position in 0..self.slots.len() {
            let slot = self.slots[position].clone();
            self.aggregator.upsert(slot.index, true);

            let mut decoder = match self.factory.create(&slot) {
                Ok(decoder) => decoder,
                Err(e) => {
                    error!("Failed to create player {}: {}", slot.index, e);
                    self.report_error(slot.index, LOCAL_FAILURE_CODE, e.to_string());
                    continue;
                }
            };

            decoder.add_listener(DecoderListener::new(
                slot.index,
                self.generation,
                self.event_tx.clone(),
            ));

            let mut handle = PlayerHandle::new(slot.index, decoder);
            handle.surface = surfaces
                .iter()
                .find(|surface| surface.slot_index == slot.index)
                .map(|surface| surface.surface);
            if handle.surface.is_none() {
                warn!("No surface for player {}, video will not be shown", slot.index);
            }
            handle.decoder.set_surface(handle.surface);

            handle.transition(PlayerState::Loading);
            let loaded = handle.decoder.load(&slot.source_uri);
            self.handles.push(handle);

            match loaded {
                Ok(()) => {
                    debug!("Player {} loading {}", slot.index, slot.source_uri);
                    if self.config.autoplay {
                        if let Some(handle) = self.handles.last_mut() {
                            handle.decoder.play();
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to load stream for player {}: {}", slot.index, e);
                    if let Some(handle) = self.handles.last_mut() {
                        handle.transition(PlayerState::Error);
                    }
                    self.report_error(slot.index, LOCAL_FAILURE_CODE, e.to_string());
                }
            }

            self.aggregator.recompute_aggregate_playing(&self.handles);
        }

        Ok(())
    }

    /// Detach, unbind and release every player
    ///
    /// Events still queued from the released players are discarded. Calling
    /// this with no players is a no-op.
    pub fn release(&mut self) {
        if self.handles.is_empty() {
            debug!("No players to release");
            return;
        }

        info!("Releasing {} players", self.handles.len());
        self.generation += 1;

        for mut handle in self.handles.drain(..) {
            handle.decoder.remove_listener();
            handle.decoder.set_surface(None);
            handle.decoder.release();
            handle.surface = None;
            handle.transition(PlayerState::Released);
        }

        self.aggregator.recompute_aggregate_playing(&self.handles);
    }

    /// Resume every player
    pub fn play(&mut self) {
        debug!("Playing {} players", self.handles.len());
        for handle in &mut self.handles {
            handle.decoder.play();
        }
    }

    /// Pause every player
    pub fn pause(&mut self) {
        debug!("Pausing {} players", self.handles.len());
        for handle in &mut self.handles {
            handle.decoder.pause();
        }
    }

    /// Whether any player is currently playing
    pub fn is_playing(&self) -> bool {
        self.aggregator.playing().get()
    }

    /// Apply one decoder event
    pub fn handle_event(&mut self, event: SlotEvent) {
        if event.generation != self.generation {
            debug!(
                "Dropping event from released player {} (generation {}, current {})",
                event.slot_index, event.generation, self.generation
            );
            return;
        }

        let Some(position) = self
            .handles
            .iter()
            .position(|handle| handle.index == event.slot_index)
        else {
            debug!("Dropping event for unknown player {}", event.slot_index);
            return;
        };

        match event.event {
            DecoderEvent::State(state) => self.on_state_changed(position, state),
            DecoderEvent::VideoSize { width, height } => {
                let handle = &mut self.handles[position];
                if handle.update_video_size(width, height) {
                    debug!("Player {} video size {}x{}", handle.index, width, height);
                    self.streams.size_changed.emit(handle.index);
                }
            }
            DecoderEvent::Error { code, message } => {
                if code == 0 {
                    debug!("Player {} informational error: {}", event.slot_index, message);
                    return;
                }

                // The decoder's own state reports decide whether the slot stalls
                error!("Player {} error {}: {}", event.slot_index, code, message);
                self.report_error(event.slot_index, code, message);
            }
            DecoderEvent::QualitiesAvailable(qualities) => {
                debug!(
                    "Player {} qualities: {:?}",
                    event.slot_index,
                    qualities.iter().map(|quality| quality.name.as_str()).collect::<Vec<_>>()
                );
            }
            DecoderEvent::NetworkLost => {
                warn!("Player {} lost network", event.slot_index);
            }
            other => {
                debug!("Player {} event {:?}", event.slot_index, other);
            }
        }
    }

    /// Apply every event already queued on the pump
    ///
    /// Returns how many events were taken.
    pub fn drain_events(&mut self, pump: &mut EventPump) -> usize {
        let mut count = 0;
        while let Some(event) = pump.try_recv() {
            self.handle_event(event);
            count += 1;
        }
        count
    }

    fn on_state_changed(&mut self, position: usize, state: PlayerState) {
        let slot_index = self.handles[position].index;
        self.handles[position].transition(state);

        match state {
            PlayerState::Ready => self.lock_quality(position),
            PlayerState::Buffering => {
                self.aggregator.upsert(slot_index, true);
            }
            PlayerState::Playing => {
                self.aggregator.upsert(slot_index, false);
            }
            _ => {}
        }

        self.aggregator.recompute_aggregate_playing(&self.handles);
    }

    /// Cap automatic quality selection at the slot's configured maximum
    fn lock_quality(&mut self, position: usize) {
        let handle = &mut self.handles[position];
        let Some(slot) = self.slots.iter().find(|slot| slot.index == handle.index) else {
            return;
        };

        let qualities = handle.decoder.qualities();
        match qualities
            .iter()
            .find(|quality| quality.name == slot.max_quality_label)
        {
            Some(quality) => {
                debug!("Player {} max quality {}", handle.index, quality.name);
                handle.decoder.set_max_quality(quality);
                handle.quality_locked = true;
            }
            None => {
                debug!(
                    "Player {} offers no {} quality, keeping automatic selection",
                    handle.index, slot.max_quality_label
                );
            }
        }
    }

    fn report_error(&self, slot_index: usize, code: i32, message: String) {
        self.streams.errors.emit(PlaybackError {
            slot_index,
            code,
            message,
        });
    }

    /// Bind a player to a new surface, replacing the previous one
    ///
    /// Returns whether the binding changed.
    pub fn bind_surface(&mut self, surface: &SurfaceHandle) -> bool {
        let Some(handle) = self
            .handles
            .iter_mut()
            .find(|handle| handle.index == surface.slot_index)
        else {
            return false;
        };

        if handle.surface == Some(surface.surface) {
            return false;
        }

        debug!("Player {} rebound to surface {}", handle.index, surface.surface.id());
        handle.surface = Some(surface.surface);
        handle.decoder.set_surface(handle.surface);
        true
    }

    /// Re-fit the loaded video of a slot to its surface's container
    ///
    /// Returns whether a resize was applied.
    pub fn refit(&self, surface: &SurfaceHandle) -> bool {
        let Some(handle) = self.handle(surface.slot_index) else {
            return false;
        };

        let Some(target) = surface.target() else {
            debug!("Draw target for player {} is gone", surface.slot_index);
            return false;
        };

        let container = target.container_size();
        let fitted = fit_video(container, handle.video_size());
        debug!(
            "Updating player view {}: container {}, video {}, surface {}",
            handle.index,
            container,
            handle.video_size(),
            fitted
        );
        target.resize_surface(fitted);
        true
    }

    /// Rebind and re-fit every slot that has a surface
    ///
    /// Returns how many surfaces were resized.
    pub fn refit_all(&mut self, surfaces: &[SurfaceHandle]) -> usize {
        surfaces
            .iter()
            .filter(|surface| {
                self.bind_surface(surface);
                self.refit(surface)
            })
            .count()
    }

    /// The player for a slot
    pub fn handle(&self, slot_index: usize) -> Option<&PlayerHandle> {
        self.handles.iter().find(|handle| handle.index == slot_index)
    }

    pub fn handles(&self) -> &[PlayerHandle] {
        &self.handles
    }

    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    pub fn slots(&self) -> &[StreamSlot] {
        &self.slots
    }

    /// Current handle generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Streams for the UI layer to subscribe to
    pub fn streams(&self) -> &PlayerStreams {
        &self.streams
    }

    /// Current buffering mapping
    pub fn buffering(&self) -> &[BufferingState] {
        self.aggregator.snapshot()
    }
}

impl Drop for PlayerOrchestrator {
    fn drop(&mut self) {
        self.release();
        self.streams.close();
    }
}
