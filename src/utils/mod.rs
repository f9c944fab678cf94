//! Utility module for Multiview
//!
//! This module provides common utilities used throughout the crate:
//! - Error handling with custom error types
//! - Configuration management

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{Config, GeneralConfig, LayoutConfig, PlaybackConfig, RelayoutConfig};
pub use error::{IntoMultiviewError, MultiviewError, Result};

