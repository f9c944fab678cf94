//! Screen session for Multiview
//!
//! A session is one screen showing one template. It wires the readiness
//! synchronizer, the player orchestrator and the re-layout scheduler to the
//! host's lifecycle callbacks, and runs the event loop that feeds decoder
//! events back into the orchestrator.

mod headless;

pub use headless::{HeadlessHost, HeadlessTarget};

use crate::decoder::DecoderFactory;
use crate::layout::Template;
use crate::player::{PlayerOrchestrator, PlayerStreams};
use crate::scheduler::{LayoutHost, RelayoutOutcome, RelayoutScheduler, RelayoutTrigger};
use crate::surface::{DrawTarget, PaintableSurface, ReadinessSynchronizer};
use crate::utils::config::Config;
use crate::utils::error::Result;
use log::{debug, error, info};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

struct SessionInner {
    template: Template,
    config: Config,
    host: Arc<dyn LayoutHost>,
    sync: Arc<ReadinessSynchronizer>,
    orchestrator: Arc<Mutex<PlayerOrchestrator>>,
    scheduler: Arc<RelayoutScheduler>,
    streams: PlayerStreams,
    relayout_task: Mutex<Option<JoinHandle<RelayoutOutcome>>>,
    resume_task: Mutex<Option<JoinHandle<()>>>,
    background: Mutex<Vec<JoinHandle<()>>>,
    destroyed: AtomicBool,
}

/// One screen showing one template
///
/// Must be created inside a tokio runtime.
pub struct ScreenSession {
    inner: Arc<SessionInner>,
}

impl ScreenSession {
    /// Create a session and start its event loop
    pub fn new(
        template: Template,
        config: Config,
        factory: Arc<dyn DecoderFactory>,
        host: Arc<dyn LayoutHost>,
    ) -> Self {
        let (orchestrator, mut pump) =
            PlayerOrchestrator::for_template(template, factory, config.playback.clone());
        let streams = orchestrator.streams().clone();
        let orchestrator = Arc::new(Mutex::new(orchestrator));
        let sync = Arc::new(ReadinessSynchronizer::new(template.slot_count()));
        let scheduler = Arc::new(RelayoutScheduler::new(
            config.relayout.clone(),
            config.layout.clone(),
        ));

        info!("Opening template {} ({})", template, template.name());

        let event_loop = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                while let Some(event) = pump.recv().await {
                    orchestrator.lock().handle_event(event);
                }
                debug!("Decoder event loop finished");
            })
        };

        let size_loop = {
            let orchestrator = Arc::clone(&orchestrator);
            let sync = Arc::clone(&sync);
            let mut size_changed = streams.size_changed.subscribe();
            tokio::spawn(async move {
                while let Some(slot_index) = size_changed.next().await {
                    Self::refit_slot(&sync, &orchestrator, slot_index).await;
                }
            })
        };

        Self {
            inner: Arc::new(SessionInner {
                template,
                config,
                host,
                sync,
                orchestrator,
                scheduler,
                streams,
                relayout_task: Mutex::new(None),
                resume_task: Mutex::new(None),
                background: Mutex::new(vec![event_loop, size_loop]),
                destroyed: AtomicBool::new(false),
            }),
        }
    }

    /// Template shown by this session
    pub fn template(&self) -> Template {
        self.inner.template
    }

    /// Surface readiness for this screen's slots
    pub fn synchronizer(&self) -> &Arc<ReadinessSynchronizer> {
        &self.inner.sync
    }

    /// The orchestrator driving this screen's players
    pub fn orchestrator(&self) -> &Arc<Mutex<PlayerOrchestrator>> {
        &self.inner.orchestrator
    }

    /// Buffering, playing and error streams for the UI layer
    ///
    /// Size-changed notifications are consumed by the session itself to
    /// re-fit the affected surface.
    pub fn streams(&self) -> &PlayerStreams {
        &self.inner.streams
    }

    /// Availability callback for a slot's surface
    pub fn surface_available(
        &self,
        slot_index: usize,
        surface: PaintableSurface,
        draw_target: &Arc<dyn DrawTarget>,
    ) -> Result<()> {
        self.inner.sync.surface_available(slot_index, surface, draw_target)
    }

    /// Destruction callback for a slot's surface
    pub fn surface_destroyed(&self, slot_index: usize) -> Result<()> {
        self.inner.sync.surface_destroyed(slot_index)
    }

    /// The screen's views were created
    pub fn on_view_created(&self) {
        self.relayout(RelayoutTrigger::ViewCreated);
    }

    /// The device rotated
    pub fn on_orientation_changed(&self) {
        self.relayout(RelayoutTrigger::OrientationChanged);
    }

    /// The screen came to the foreground
    ///
    /// Once every surface is ready, re-layout and create the players. The
    /// players are created only once per session.
    pub fn on_resume(&self) {
        if self.is_destroyed() {
            return;
        }

        let session = self.clone_handle();
        let task = tokio::spawn(async move {
            let Some(surfaces) = session.inner.sync.wait_all().await else {
                debug!("Resume abandoned before surfaces were ready");
                return;
            };

            session.relayout(RelayoutTrigger::Resumed);
            info!("Initializing players");
            if let Err(e) = session.inner.orchestrator.lock().initialize(&surfaces) {
                error!("Failed to initialize players: {}", e);
            }
        });

        if let Some(previous) = self.inner.resume_task.lock().replace(task) {
            previous.abort();
        }
    }

    /// A player's video size changed; re-fit its surface once it is ready
    pub async fn on_size_changed(&self, slot_index: usize) -> bool {
        Self::refit_slot(&self.inner.sync, &self.inner.orchestrator, slot_index).await
    }

    /// Pause when anything is playing, otherwise play
    ///
    /// Returns whether playback was requested.
    pub fn toggle_playback(&self) -> bool {
        let mut orchestrator = self.inner.orchestrator.lock();
        if orchestrator.is_playing() {
            orchestrator.pause();
            false
        } else {
            orchestrator.play();
            true
        }
    }

    /// Fade out, then report the template to navigate to
    ///
    /// The caller tears this session down and opens a new one for the
    /// returned template.
    pub async fn switch_stream(&self) -> Template {
        let next = self.inner.template.next();
        debug!("Switching from template {} to {}", self.inner.template, next);
        tokio::time::sleep(self.inner.config.playback.fade_out()).await;
        next
    }

    /// The screen is going away
    ///
    /// Abandons pending readiness waits, stops re-layout and releases every
    /// player. Safe to call more than once.
    pub fn on_destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Closing template {}", self.inner.template);
        self.inner.sync.cancel();

        if let Some(task) = self.inner.resume_task.lock().take() {
            task.abort();
        }
        if let Some(task) = self.inner.relayout_task.lock().take() {
            task.abort();
        }
        for task in self.inner.background.lock().drain(..) {
            task.abort();
        }

        self.inner.orchestrator.lock().release();
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    /// Wait for pending resume and re-layout work
    ///
    /// Returns the outcome of the latest re-layout, if one ran to completion.
    pub async fn settle(&self) -> Option<RelayoutOutcome> {
        let resume = self.inner.resume_task.lock().take();
        if let Some(task) = resume {
            let _ = task.await;
        }

        let relayout = self.inner.relayout_task.lock().take();
        match relayout {
            Some(task) => task.await.ok(),
            None => None,
        }
    }

    /// Start a re-layout, superseding one still in progress
    fn relayout(&self, trigger: RelayoutTrigger) {
        if self.is_destroyed() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            inner
                .scheduler
                .run(
                    trigger,
                    inner.template,
                    inner.host.as_ref(),
                    &inner.sync,
                    &inner.orchestrator,
                )
                .await
        });

        if let Some(previous) = self.inner.relayout_task.lock().replace(task) {
            debug!("Superseding running re-layout with {}", trigger);
            previous.abort();
        }
    }

    async fn refit_slot(
        sync: &ReadinessSynchronizer,
        orchestrator: &Mutex<PlayerOrchestrator>,
        slot_index: usize,
    ) -> bool {
        match sync.wait_ready(slot_index).await {
            Some(surface) => orchestrator.lock().refit(&surface),
            None => false,
        }
    }

    fn clone_handle(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        for task in self.background.get_mut().drain(..) {
            task.abort();
        }
    }
}
