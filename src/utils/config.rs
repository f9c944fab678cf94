//! Configuration management for Multiview
//!
//! This module handles loading and managing application configuration
//! from config files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::utils::error::{IntoMultiviewError, MultiviewError, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Layout engine configuration
    pub layout: LayoutConfig,

    /// Re-layout scheduler configuration
    pub relayout: RelayoutConfig,

    /// Playback configuration
    pub playback: PlaybackConfig,

    /// General application settings
    pub general: GeneralConfig,
}

/// Layout engine configuration
///
/// Gutters and margins are expressed in density-independent units and
/// converted to pixels with `density`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Display density (pixels per dp)
    pub density: f32,

    /// Smallest size a stream cell may take, in pixels
    pub min_cell_px: f32,

    /// Gap between neighbouring stream cells, in dp
    pub gutter_dp: f32,

    /// Horizontal padding reserved along the main axis, in dp
    pub main_axis_padding_dp: f32,

    /// Padding reserved along the cross axis, in dp
    pub cross_axis_padding_dp: f32,

    /// Margin around an inset stream in landscape, in dp
    pub inset_margin_dp: f32,

    /// Margin around an inset stream in portrait, in dp
    pub portrait_inset_margin_dp: f32,
}

/// Re-layout scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayoutConfig {
    /// Number of layout passes after a geometry-affecting event
    pub attempts: u32,

    /// Delay between passes in milliseconds
    pub delay_ms: u64,

    /// Stop early once two consecutive passes agree
    pub stop_on_convergence: bool,
}

/// Playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Start every stream as soon as it is loaded
    pub autoplay: bool,

    /// Fade-out time before switching to the next template, in milliseconds
    pub fade_out_ms: u64,
}

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            density: 1.0,
            min_cell_px: 10.0,
            gutter_dp: 8.0,
            main_axis_padding_dp: 24.0,
            cross_axis_padding_dp: 16.0,
            inset_margin_dp: 4.0,
            portrait_inset_margin_dp: 36.0,
        }
    }
}

impl LayoutConfig {
    /// Convert a dp value to pixels at the configured density
    pub fn px(&self, dp: f32) -> f32 {
        (dp * self.density).round()
    }
}

impl Default for RelayoutConfig {
    fn default() -> Self {
        Self {
            attempts: 4,
            delay_ms: 100,
            stop_on_convergence: false,
        }
    }
}

impl RelayoutConfig {
    /// Delay between passes
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            fade_out_ms: 100,
        }
    }
}

impl PlaybackConfig {
    /// Fade-out time before a template switch
    pub fn fade_out(&self) -> Duration {
        Duration::from_millis(self.fade_out_ms)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from various sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. System config file (/etc/multiview/config.toml on Linux)
    /// 3. User config file (~/.config/multiview/config.toml on Linux)
    /// 4. Environment variables (MULTIVIEW_* prefix)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(system_path) = Self::system_config_path() {
            if system_path.exists() {
                config = Self::from_file(&system_path)?;
            }
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                config = Self::from_file(&user_path)?;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from an explicit file, then apply environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the given file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .config_err("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self)
            .config_err("Failed to serialize config")?;

        std::fs::write(path, toml)
            .config_err("Failed to write config file")?;

        Ok(())
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> Result<()> {
        let path = Self::user_config_path()
            .ok_or_else(|| MultiviewError::Config("Cannot determine user config path".to_string()))?;
        self.save_to(&path)
    }

    /// Parse a TOML file; missing keys fall back to defaults
    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .config_err("Failed to read config file")?;

        toml::from_str(&contents).config_err("Failed to parse config file")
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(density) = std::env::var("MULTIVIEW_DENSITY") {
            self.layout.density = density.parse()
                .config_err("Invalid MULTIVIEW_DENSITY")?;
        }

        if let Ok(attempts) = std::env::var("MULTIVIEW_RELAYOUT_ATTEMPTS") {
            self.relayout.attempts = attempts.parse()
                .config_err("Invalid MULTIVIEW_RELAYOUT_ATTEMPTS")?;
        }

        if let Ok(delay) = std::env::var("MULTIVIEW_RELAYOUT_DELAY_MS") {
            self.relayout.delay_ms = delay.parse()
                .config_err("Invalid MULTIVIEW_RELAYOUT_DELAY_MS")?;
        }

        if let Ok(log_level) = std::env::var("MULTIVIEW_LOG_LEVEL") {
            self.general.log_level = log_level;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(self.layout.density > 0.0) {
            return Err(MultiviewError::Config("Display density must be positive".to_string()));
        }

        if self.layout.min_cell_px < 1.0 {
            return Err(MultiviewError::Config("Minimum cell size must be at least 1px".to_string()));
        }

        if self.relayout.attempts == 0 {
            return Err(MultiviewError::Config("Re-layout attempts must be non-zero".to_string()));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.general.log_level.as_str()) {
            return Err(MultiviewError::Config(format!(
                "Invalid log level '{}', must be one of: {:?}",
                self.general.log_level,
                valid_log_levels
            )));
        }

        Ok(())
    }

    /// Get system config file path
    fn system_config_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        return Some(PathBuf::from("/etc/multiview/config.toml"));

        #[cfg(target_os = "macos")]
        return Some(PathBuf::from("/Library/Application Support/Multiview/config.toml"));

        #[cfg(target_os = "windows")]
        return std::env::var("PROGRAMDATA").ok()
            .map(|p| PathBuf::from(p).join("Multiview").join("config.toml"));

        #[allow(unreachable_code)]
        None
    }

    /// Get user config file path
    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("multiview").join("config.toml"))
    }
}
