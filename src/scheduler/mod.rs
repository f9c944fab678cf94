//! Re-layout scheduler for Multiview
//!
//! The host toolkit measures its views asynchronously, so bounds read right
//! after a rotation may still be stale. Instead of trusting a single pass,
//! the scheduler re-runs the whole layout a bounded number of times: re-read
//! bounds, compute and apply geometry, then re-fit the video on every surface
//! that is ready. Each pass works from whatever bounds and surfaces are
//! current at that time, and a missing surface never holds up the cadence.

use crate::layout::{LayoutEngine, LayoutGeometry, Orientation, Size, Template};
use crate::player::PlayerOrchestrator;
use crate::surface::ReadinessSynchronizer;
use crate::utils::config::{LayoutConfig, RelayoutConfig};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::fmt;

/// The UI container the streams are laid out in
pub trait LayoutHost: Send + Sync {
    /// Current measured bounds, `None` while not yet measured
    fn measured_bounds(&self) -> Option<Size>;

    /// Current screen orientation
    fn orientation(&self) -> Orientation;

    /// Apply computed geometry to the stream containers
    fn apply_geometry(&self, geometry: &LayoutGeometry);

    /// Ask the host to run a layout pass
    fn request_layout(&self) {}
}

/// What caused a re-layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayoutTrigger {
    ViewCreated,
    OrientationChanged,
    Resumed,
}

impl fmt::Display for RelayoutTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelayoutTrigger::ViewCreated => "view created",
            RelayoutTrigger::OrientationChanged => "orientation changed",
            RelayoutTrigger::Resumed => "resumed",
        };
        write!(f, "{}", name)
    }
}

/// Result of one scheduler run
#[derive(Debug, Clone, PartialEq)]
pub struct RelayoutOutcome {
    /// Event that started the run
    pub trigger: RelayoutTrigger,

    /// Passes that completed
    pub iterations: u32,

    /// The last two passes produced the same geometry
    pub converged: bool,

    /// The screen was destroyed before the run finished
    pub cancelled: bool,

    /// Geometry applied by the last pass that had bounds
    pub geometry: Option<LayoutGeometry>,
}

/// Runs bounded re-layout loops
pub struct RelayoutScheduler {
    config: RelayoutConfig,
    engine: LayoutEngine,
}

impl RelayoutScheduler {
    /// Create a scheduler
    pub fn new(config: RelayoutConfig, layout: LayoutConfig) -> Self {
        Self {
            config,
            engine: LayoutEngine::new(layout),
        }
    }

    pub fn config(&self) -> &RelayoutConfig {
        &self.config
    }

    /// Re-layout `template` after `trigger`
    pub async fn run(
        &self,
        trigger: RelayoutTrigger,
        template: Template,
        host: &dyn LayoutHost,
        sync: &ReadinessSynchronizer,
        orchestrator: &Mutex<PlayerOrchestrator>,
    ) -> RelayoutOutcome {
        debug!(
            "Re-layout after {}: {} passes, {:?} apart",
            trigger,
            self.config.attempts,
            self.config.delay()
        );

        let mut outcome = RelayoutOutcome {
            trigger,
            iterations: 0,
            converged: false,
            cancelled: false,
            geometry: None,
        };

        for attempt in 0..self.config.attempts {
            if sync.is_cancelled() {
                debug!("Re-layout after {} abandoned", trigger);
                outcome.cancelled = true;
                return outcome;
            }

            host.request_layout();

            match host.measured_bounds().filter(|bounds| !bounds.is_empty()) {
                Some(bounds) => {
                    let geometry = self.engine.compute_geometry(
                        bounds.width,
                        bounds.height,
                        host.orientation().is_landscape(),
                        template,
                    );
                    host.apply_geometry(&geometry);

                    outcome.converged = outcome.geometry.as_ref() == Some(&geometry);
                    outcome.geometry = Some(geometry);
                }
                None => {
                    debug!("Bounds not measured yet on pass {}", attempt + 1);
                    outcome.converged = false;
                }
            }

            let surfaces = sync.ready_surfaces();
            if surfaces.len() < sync.len() {
                debug!(
                    "Pass {} re-fits {} of {} surfaces",
                    attempt + 1,
                    surfaces.len(),
                    sync.len()
                );
            }
            orchestrator.lock().refit_all(&surfaces);
            outcome.iterations += 1;

            if outcome.converged && self.config.stop_on_convergence {
                debug!("Layout converged after {} passes", outcome.iterations);
                break;
            }

            if attempt + 1 < self.config.attempts {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.delay()) => {}
                    _ = sync.cancelled() => {
                        debug!("Re-layout after {} abandoned", trigger);
                        outcome.cancelled = true;
                        return outcome;
                    }
                }
            }
        }

        if outcome.converged {
            info!(
                "Layout after {} converged in {} passes",
                trigger, outcome.iterations
            );
        } else {
            warn!(
                "Layout after {} did not converge in {} passes",
                trigger, outcome.iterations
            );
        }

        outcome
    }
}
