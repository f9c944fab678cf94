//! Multiview - concurrent live-stream playback core
//!
//! Plays two or three live streams side by side on one screen. The crate
//! drives one decoder per stream, keeps a shared buffering and playback
//! state across them, and computes aspect-correct container geometry for
//! three fixed templates that re-flows on rotation.
//!
//! The decoder itself and the view hierarchy are external collaborators,
//! reached through the [`decoder::Decoder`], [`surface::DrawTarget`] and
//! [`scheduler::LayoutHost`] traits.

pub mod decoder;
pub mod layout;
pub mod player;
pub mod scheduler;
pub mod session;
pub mod surface;
pub mod utils;

pub use layout::{compute_geometry, fit_video, LayoutGeometry, Size, Template};
pub use player::{PlaybackError, PlayerOrchestrator, PlayerState};
pub use session::ScreenSession;
pub use utils::error::{MultiviewError, Result};
