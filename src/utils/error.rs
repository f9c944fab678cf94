//! Error types for Multiview
//!
//! This module defines the error type shared by the library. We use
//! thiserror for the error enum and leave anyhow to the binary.
//!
//! Decoder-reported playback failures are not errors in this sense: they
//! travel as `PlaybackError` events and never abort sibling slots.

use thiserror::Error;

/// Main error type for Multiview
#[derive(Error, Debug)]
pub enum MultiviewError {
    /// Decoder creation or control errors
    #[error("Decoder error: {0}")]
    Decoder(String),

    /// Surface binding or readiness errors
    #[error("Surface error: {0}")]
    Surface(String),

    /// Layout computation errors
    #[error("Layout error: {0}")]
    Layout(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File error: {0}")]
    FileIO(#[from] std::io::Error),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl MultiviewError {
    /// Create a decoder error from string
    pub fn decoder_error<S: Into<String>>(msg: S) -> Self {
        MultiviewError::Decoder(msg.into())
    }
}

/// Convenience type alias for Results in Multiview
pub type Result<T> = std::result::Result<T, MultiviewError>;

/// Extension trait for converting other errors to MultiviewError
pub trait IntoMultiviewError<T> {
    /// Convert this error into a MultiviewError with the given context
    fn layout_err(self, context: &str) -> Result<T>;
    fn config_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> IntoMultiviewError<T> for std::result::Result<T, E> {
    fn layout_err(self, context: &str) -> Result<T> {
        self.map_err(|e| MultiviewError::Layout(format!("{}: {}", context, e)))
    }

    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| MultiviewError::Config(format!("{}: {}", context, e)))
    }
}
