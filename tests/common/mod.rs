//! Shared fixtures for the Multiview integration tests

#![allow(dead_code)]

use anyhow::Result;
use multiview::decoder::{SimulatedDecoderFactory, SimulationScript};
use multiview::layout::Template;
use multiview::session::{HeadlessHost, HeadlessTarget, ScreenSession};
use multiview::surface::{DrawTarget, PaintableSurface};
use multiview::utils::Config;
use multiview::Size;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SURFACE: AtomicU64 = AtomicU64::new(1);

/// A headless screen with simulated decoders
pub struct TestFixture {
    pub template: Template,
    pub factory: Arc<SimulatedDecoderFactory>,
    pub host: Arc<HeadlessHost>,
    pub session: ScreenSession,
}

impl TestFixture {
    /// Landscape 1280x720 screen with the default script
    pub fn new(template: Template) -> Self {
        Self::with_script(template, Size::new(1280, 720), SimulationScript::default())
    }

    /// Screen of the given size
    pub fn with_bounds(template: Template, bounds: Size) -> Self {
        Self::with_script(template, bounds, SimulationScript::default())
    }

    /// Screen of the given size and decoder script
    pub fn with_script(template: Template, bounds: Size, script: SimulationScript) -> Self {
        let factory = Arc::new(SimulatedDecoderFactory::new(script));
        let host = Arc::new(HeadlessHost::new(bounds, template.slot_count()));
        let session = ScreenSession::new(
            template,
            test_config(),
            factory.clone(),
            host.clone(),
        );

        Self {
            template,
            factory,
            host,
            session,
        }
    }

    /// Report a fresh surface for every slot, returning their ids
    pub fn attach_surfaces(&self) -> Result<Vec<u64>> {
        (0..self.template.slot_count())
            .map(|slot_index| self.attach_surface(slot_index))
            .collect()
    }

    /// Report a fresh surface for one slot
    pub fn attach_surface(&self, slot_index: usize) -> Result<u64> {
        let target: Arc<dyn DrawTarget> = self.target(slot_index);
        let id = NEXT_SURFACE.fetch_add(1, Ordering::SeqCst);
        self.session
            .surface_available(slot_index, PaintableSurface::new(id), &target)?;
        Ok(id)
    }

    pub fn target(&self, slot_index: usize) -> Arc<HeadlessTarget> {
        self.host
            .target(slot_index)
            .expect("fixture host has a target per slot")
    }

    pub fn handle_count(&self) -> usize {
        self.session.orchestrator().lock().handle_count()
    }

    pub fn is_playing(&self) -> bool {
        self.session.orchestrator().lock().is_playing()
    }
}

/// A draw target whose container never changes
pub fn fixed_target() -> Arc<HeadlessTarget> {
    Arc::new(HeadlessTarget::new(Size::new(640, 360)))
}

/// Default configuration, independent of files and environment
pub fn test_config() -> Config {
    Config::default()
}

/// Let spawned tasks run for a while on the paused test clock
pub async fn run_for(millis: u64) {
    tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
}
