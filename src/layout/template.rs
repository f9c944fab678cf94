//! Layout templates and their static stream tables

use crate::utils::error::MultiviewError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One position in a template bound to one stream source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamSlot {
    /// Position in the template
    pub index: usize,

    /// Stream URI
    pub source_uri: String,

    /// Highest quality automatic selection may pick, e.g. "1080p"
    pub max_quality_label: String,
}

impl StreamSlot {
    /// Create a slot descriptor
    pub fn new(index: usize, source_uri: impl Into<String>, max_quality_label: impl Into<String>) -> Self {
        Self {
            index,
            source_uri: source_uri.into(),
            max_quality_label: max_quality_label.into(),
        }
    }
}

/// Fixed arrangement of streams on one screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Template {
    /// Three streams: one featured, two stacked beside or below it
    A,

    /// Two equal square cells
    B,

    /// Two streams: one featured, one small inset
    C,
}

const PLAYBACK_HOST: &str = "https://4c62a87c1810.us-west-2.playback.live-video.net/api/video/v1/us-west-2.049054135175";

fn channel(id: &str) -> String {
    format!("{}.channel.{}.m3u8", PLAYBACK_HOST, id)
}

static TEMPLATE_A_SLOTS: Lazy<Vec<StreamSlot>> = Lazy::new(|| {
    vec![
        StreamSlot::new(0, channel("QidZjoGOhfDp"), "1080p"),
        StreamSlot::new(1, channel("LaSuL3bHBRR7"), "480p"),
        StreamSlot::new(2, channel("rqyuAWXUrvUS"), "480p"),
    ]
});

static TEMPLATE_B_SLOTS: Lazy<Vec<StreamSlot>> = Lazy::new(|| {
    vec![
        StreamSlot::new(0, channel("FMaC7IMoyDEA"), "1080p"),
        StreamSlot::new(1, channel("WP4bWqiALo67"), "1080p"),
    ]
});

static TEMPLATE_C_SLOTS: Lazy<Vec<StreamSlot>> = Lazy::new(|| {
    vec![
        StreamSlot::new(0, channel("HPz5Ug1fjNTO"), "1080p"),
        StreamSlot::new(1, channel("iNMK0w9JnUkC"), "480p"),
    ]
});

impl Template {
    /// All templates in switching order
    pub const ALL: [Template; 3] = [Template::A, Template::B, Template::C];

    /// Stream slots of this template, ordered by index
    pub fn slots(&self) -> &'static [StreamSlot] {
        match self {
            Template::A => TEMPLATE_A_SLOTS.as_slice(),
            Template::B => TEMPLATE_B_SLOTS.as_slice(),
            Template::C => TEMPLATE_C_SLOTS.as_slice(),
        }
    }

    /// Number of streams shown at once
    pub fn slot_count(&self) -> usize {
        self.slots().len()
    }

    /// The template the stream switch control moves to
    pub fn next(&self) -> Template {
        match self {
            Template::A => Template::B,
            Template::B => Template::C,
            Template::C => Template::A,
        }
    }

    /// Human readable arrangement name
    pub fn name(&self) -> &'static str {
        match self {
            Template::A => "featured with stacked pair",
            Template::B => "side by side",
            Template::C => "featured with inset",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Template::A => "a",
            Template::B => "b",
            Template::C => "c",
        };
        write!(f, "{}", letter)
    }
}

impl FromStr for Template {
    type Err = MultiviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a" | "first" => Ok(Template::A),
            "b" | "second" => Ok(Template::B),
            "c" | "third" => Ok(Template::C),
            other => Err(MultiviewError::InvalidInput(format!(
                "Unknown template '{}', expected a, b or c",
                other
            ))),
        }
    }
}
