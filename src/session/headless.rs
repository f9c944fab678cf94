//! Headless layout host for the CLI and the tests
//!
//! Stands in for a real view hierarchy: bounds are set directly, rotation
//! swaps them, and applied geometry resizes the per-slot draw targets the
//! same way a constraint layout would.

use crate::layout::{LayoutGeometry, Orientation, Size};
use crate::scheduler::LayoutHost;
use crate::surface::DrawTarget;
use log::debug;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A stream container with a fixed, settable size
#[derive(Debug, Default)]
pub struct HeadlessTarget {
    container: Mutex<Size>,
    resized: Mutex<Vec<Size>>,
}

impl HeadlessTarget {
    /// Create a target with an initial container size
    pub fn new(container: Size) -> Self {
        Self {
            container: Mutex::new(container),
            resized: Mutex::new(Vec::new()),
        }
    }

    pub fn set_container(&self, size: Size) {
        *self.container.lock() = size;
    }

    /// Every surface size applied so far
    pub fn resizes(&self) -> Vec<Size> {
        self.resized.lock().clone()
    }

    /// The most recent surface size
    pub fn last_resize(&self) -> Option<Size> {
        self.resized.lock().last().copied()
    }
}

impl DrawTarget for HeadlessTarget {
    fn container_size(&self) -> Size {
        *self.container.lock()
    }

    fn resize_surface(&self, size: Size) {
        self.resized.lock().push(size);
    }
}

/// A layout host with directly controlled bounds
pub struct HeadlessHost {
    bounds: Mutex<Size>,
    orientation: Mutex<Orientation>,
    targets: Vec<Arc<HeadlessTarget>>,
    applied: Mutex<Vec<LayoutGeometry>>,
    unmeasured_reads: AtomicUsize,
    layout_requests: AtomicUsize,
}

impl HeadlessHost {
    /// Create a host with `slot_count` stream containers
    ///
    /// Orientation follows the bounds.
    pub fn new(bounds: Size, slot_count: usize) -> Self {
        Self {
            bounds: Mutex::new(bounds),
            orientation: Mutex::new(bounds.orientation()),
            targets: (0..slot_count)
                .map(|_| Arc::new(HeadlessTarget::default()))
                .collect(),
            applied: Mutex::new(Vec::new()),
            unmeasured_reads: AtomicUsize::new(0),
            layout_requests: AtomicUsize::new(0),
        }
    }

    /// Draw target of one slot
    pub fn target(&self, slot_index: usize) -> Option<Arc<HeadlessTarget>> {
        self.targets.get(slot_index).cloned()
    }

    /// Swap width and height and flip the orientation
    pub fn rotate(&self) {
        let mut bounds = self.bounds.lock();
        *bounds = Size::new(bounds.height, bounds.width);

        let mut orientation = self.orientation.lock();
        *orientation = orientation.rotated();
        debug!("Headless host rotated to {} ({:?})", *bounds, *orientation);
    }

    pub fn set_bounds(&self, bounds: Size) {
        *self.bounds.lock() = bounds;
    }

    /// Report the next `reads` bound queries as not yet measured
    pub fn defer_measurement(&self, reads: usize) {
        self.unmeasured_reads.store(reads, Ordering::SeqCst);
    }

    /// Every geometry applied so far
    pub fn applied(&self) -> Vec<LayoutGeometry> {
        self.applied.lock().clone()
    }

    pub fn last_applied(&self) -> Option<LayoutGeometry> {
        self.applied.lock().last().cloned()
    }

    /// Number of layout passes requested
    pub fn layout_requests(&self) -> usize {
        self.layout_requests.load(Ordering::SeqCst)
    }
}

impl LayoutHost for HeadlessHost {
    fn measured_bounds(&self) -> Option<Size> {
        let deferred = self
            .unmeasured_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |reads| reads.checked_sub(1))
            .is_ok();

        if deferred {
            None
        } else {
            Some(*self.bounds.lock())
        }
    }

    fn orientation(&self) -> Orientation {
        *self.orientation.lock()
    }

    fn apply_geometry(&self, geometry: &LayoutGeometry) {
        for slot in &geometry.slots {
            if let Some(target) = self.targets.get(slot.slot_index) {
                target.set_container(Size::new(slot.width_px, slot.height_px));
            }
        }
        self.applied.lock().push(geometry.clone());
    }

    fn request_layout(&self) {
        self.layout_requests.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_geometry, Template};

    #[test]
    fn test_rotation_swaps_bounds() {
        let host = HeadlessHost::new(Size::new(1280, 720), 3);
        assert_eq!(host.orientation(), Orientation::Landscape);

        host.rotate();
        assert_eq!(host.measured_bounds(), Some(Size::new(720, 1280)));
        assert_eq!(host.orientation(), Orientation::Portrait);
    }

    #[test]
    fn test_deferred_measurement() {
        let host = HeadlessHost::new(Size::new(800, 480), 2);
        host.defer_measurement(2);

        assert_eq!(host.measured_bounds(), None);
        assert_eq!(host.measured_bounds(), None);
        assert_eq!(host.measured_bounds(), Some(Size::new(800, 480)));
    }

    #[test]
    fn test_applied_geometry_sizes_targets() {
        let host = HeadlessHost::new(Size::new(800, 480), 2);
        host.apply_geometry(&compute_geometry(800, 480, true, Template::B));

        let target = host.target(1).unwrap();
        assert_eq!(target.container_size(), Size::new(388, 388));
        assert_eq!(host.applied().len(), 1);
    }
}
