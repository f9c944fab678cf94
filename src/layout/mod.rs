//! Layout module for Multiview
//!
//! This module computes where each stream goes on screen:
//! - Static template tables binding slots to stream sources
//! - The adaptive geometry engine for the three templates
//! - Zoom-to-fit sizing of a video inside its container

mod fit;
mod geometry;
mod template;

pub use fit::fit_video;
pub use geometry::{
    compute_geometry, Anchor, AnchorTarget, Edge, LayoutEngine, LayoutGeometry, SlotGeometry,
};
pub use template::{StreamSlot, Template};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aspect ratio (height over width) of a widescreen stream
pub const WIDE_ASPECT: f32 = 0.5625;

/// Pixel dimensions of a container, surface or video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Create a size
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Orientation implied by these bounds
    pub fn orientation(&self) -> Orientation {
        if self.width >= self.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Screen orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    pub fn is_landscape(&self) -> bool {
        matches!(self, Orientation::Landscape)
    }

    /// The other orientation
    pub fn rotated(&self) -> Orientation {
        match self {
            Orientation::Landscape => Orientation::Portrait,
            Orientation::Portrait => Orientation::Landscape,
        }
    }
}
