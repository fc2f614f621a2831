//! `[performance]` section: playback attributes attached to rendered chords.

use harmony::PerformanceOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Default: 100
    #[serde(default = "PerformanceConfig::default_velocity")]
    pub velocity: u8,

    /// 1-based MIDI channel. Default: 1
    #[serde(default = "PerformanceConfig::default_channel")]
    pub channel: u8,

    /// Beats per chord, if chords should carry a duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl PerformanceConfig {
    fn default_velocity() -> u8 {
        100
    }

    fn default_channel() -> u8 {
        1
    }

    pub fn options(&self) -> PerformanceOptions {
        PerformanceOptions {
            velocity: self.velocity,
            channel: self.channel,
            duration: self.duration,
            ..Default::default()
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            velocity: Self::default_velocity(),
            channel: Self::default_channel(),
            duration: None,
        }
    }
}
