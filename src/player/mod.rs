//! Player module for Multiview
//!
//! This module owns the playback side of a screen: per-stream player state,
//! the orchestrator driving every player of a template, the buffering and
//! playback aggregate, and the consume-once streams the UI layer reads.

mod aggregator;
mod events;
mod orchestrator;
mod state;

pub use aggregator::{AggregatePlaybackFlag, BufferingAggregator, BufferingState};
pub use events::{ConsumableStream, PlaybackError, PlayerStreams, Subscription};
pub use orchestrator::{EventPump, PlayerOrchestrator, LOCAL_FAILURE_CODE};
pub use state::{PlayerHandle, PlayerState};
