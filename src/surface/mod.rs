//! Surface readiness for Multiview
//!
//! Each stream slot paints onto a surface owned by the UI layer. Surfaces
//! become paintable asynchronously and are torn down and recreated on
//! rotation, so the rest of the crate never assumes one exists: it waits
//! for readiness through the [`ReadinessSynchronizer`].

use crate::layout::Size;
use crate::utils::error::{MultiviewError, Result};
use log::debug;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::watch;

/// A surface the decoder can paint frames onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PaintableSurface {
    id: u64,
}

impl PaintableSurface {
    /// Wrap a host surface identifier
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    /// Host surface identifier
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// The UI-side view a surface lives in
pub trait DrawTarget: Send + Sync {
    /// Measured size of the container that holds the surface
    fn container_size(&self) -> Size;

    /// Resize the drawing surface inside its container
    fn resize_surface(&self, size: Size);
}

/// A ready surface for one slot
///
/// Holds only a weak reference to the draw target; the UI layer owns it.
#[derive(Clone)]
pub struct SurfaceHandle {
    /// Slot this surface belongs to
    pub slot_index: usize,

    /// View hosting the surface
    pub draw_target: Weak<dyn DrawTarget>,

    /// Paintable surface handed to the decoder
    pub surface: PaintableSurface,
}

impl SurfaceHandle {
    /// The draw target, if the UI layer still holds it
    pub fn target(&self) -> Option<Arc<dyn DrawTarget>> {
        self.draw_target.upgrade()
    }
}

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceHandle")
            .field("slot_index", &self.slot_index)
            .field("surface", &self.surface)
            .field("attached", &(self.draw_target.strong_count() > 0))
            .finish()
    }
}

impl PartialEq for SurfaceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.slot_index == other.slot_index && self.surface == other.surface
    }
}

/// Waits for the surfaces of one screen to become paintable
pub struct ReadinessSynchronizer {
    /// Per-slot readiness, `None` until the surface exists
    slots: Vec<watch::Sender<Option<SurfaceHandle>>>,

    /// Set once the hosting screen is destroyed
    cancelled: watch::Sender<bool>,
}

impl ReadinessSynchronizer {
    /// Create a synchronizer for `count` surfaces
    pub fn new(count: usize) -> Self {
        Self {
            slots: (0..count).map(|_| watch::Sender::new(None)).collect(),
            cancelled: watch::Sender::new(false),
        }
    }

    /// Number of surfaces tracked
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no surfaces are tracked
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Availability callback from the UI layer
    pub fn surface_available(
        &self,
        slot_index: usize,
        surface: PaintableSurface,
        draw_target: &Arc<dyn DrawTarget>,
    ) -> Result<()> {
        let slot = self.slot(slot_index)?;
        debug!("Player view just became ready: {}", slot_index);

        slot.send_replace(Some(SurfaceHandle {
            slot_index,
            draw_target: Arc::downgrade(draw_target),
            surface,
        }));
        Ok(())
    }

    /// Destruction callback from the UI layer, e.g. during rotation
    pub fn surface_destroyed(&self, slot_index: usize) -> Result<()> {
        let slot = self.slot(slot_index)?;
        debug!("Player view destroyed: {}", slot_index);

        slot.send_replace(None);
        Ok(())
    }

    /// The surface for a slot if it is ready right now
    pub fn ready(&self, slot_index: usize) -> Option<SurfaceHandle> {
        self.slots.get(slot_index)?.borrow().clone()
    }

    /// Whether every surface is ready right now
    pub fn all_ready(&self) -> bool {
        self.slots.iter().all(|slot| slot.borrow().is_some())
    }

    /// The surfaces that are ready right now, ordered by slot
    pub fn ready_surfaces(&self) -> Vec<SurfaceHandle> {
        self.slots
            .iter()
            .filter_map(|slot| slot.borrow().clone())
            .collect()
    }

    /// Wait until the surface for `slot_index` is paintable
    ///
    /// Resolves immediately when it already is. Returns `None` if the screen
    /// is destroyed first or the slot does not exist.
    pub async fn wait_ready(&self, slot_index: usize) -> Option<SurfaceHandle> {
        let mut ready_rx = self.slots.get(slot_index)?.subscribe();
        let mut cancel_rx = self.cancelled.subscribe();

        loop {
            if *cancel_rx.borrow_and_update() {
                debug!("Readiness wait abandoned: {}", slot_index);
                return None;
            }

            if let Some(handle) = ready_rx.borrow_and_update().clone() {
                debug!("Player view ready: {}", slot_index);
                return Some(handle);
            }

            tokio::select! {
                changed = ready_rx.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
                changed = cancel_rx.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
            }
        }
    }

    /// Wait until every surface is paintable
    ///
    /// Returns the handles ordered by slot, or `None` if the screen is
    /// destroyed before all of them report.
    pub async fn wait_all(&self) -> Option<Vec<SurfaceHandle>> {
        loop {
            let mut handles = Vec::with_capacity(self.slots.len());
            for slot_index in 0..self.slots.len() {
                handles.push(self.wait_ready(slot_index).await?);
            }

            // A surface may have been torn down while we waited for a later one
            if handles
                .iter()
                .all(|handle| self.ready(handle.slot_index).as_ref() == Some(handle))
            {
                return Some(handles);
            }
        }
    }

    /// Abandon all pending and future waits
    pub fn cancel(&self) {
        self.cancelled.send_replace(true);
    }

    /// Whether the hosting screen has been destroyed
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolve once the hosting screen is destroyed
    pub async fn cancelled(&self) {
        let mut cancel_rx = self.cancelled.subscribe();
        // The sender lives as long as `self`, so this only ends on cancel
        let _ = cancel_rx.wait_for(|cancelled| *cancelled).await;
    }

    fn slot(&self, slot_index: usize) -> Result<&watch::Sender<Option<SurfaceHandle>>> {
        self.slots
            .get(slot_index)
            .ok_or_else(|| MultiviewError::Surface(format!("No surface slot {}", slot_index)))
    }
}
