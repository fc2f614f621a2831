//! `[voicing]` section: how progressions are laid out on the keyboard.

use harmony::{
    BassStrategy, Degree, RenderOptions, VoiceLeadOptions, Voicing, DEFAULT_TONE_PRIORITY,
};
use serde::{Deserialize, Serialize};

/// Voice-leading and block-chord settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicingConfig {
    /// Octave the first chord is stacked from.
    /// Default: 4 (middle C)
    #[serde(default = "VoicingConfig::default_base_octave")]
    pub base_octave: i32,

    /// Bass octave. Unset means one below `base_octave`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bass_octave: Option<i32>,

    /// Default: 4
    #[serde(default = "VoicingConfig::default_max_voices")]
    pub max_voices: usize,

    #[serde(default)]
    pub min_note: u8,

    /// Default: 127
    #[serde(default = "VoicingConfig::default_max_note")]
    pub max_note: u8,

    /// Degrees kept first when a chord has more tones than voices.
    #[serde(default = "VoicingConfig::default_tone_priority")]
    pub tone_priority: Vec<Degree>,

    #[serde(default)]
    pub bass_strategy: BassStrategy,

    #[serde(default)]
    pub keep_common_tones: bool,

    #[serde(default)]
    pub allow_voice_crossing: bool,

    /// Block-chord spacing for `render`.
    #[serde(default)]
    pub voicing: Voicing,
}

impl VoicingConfig {
    fn default_base_octave() -> i32 {
        4
    }

    fn default_max_voices() -> usize {
        4
    }

    fn default_max_note() -> u8 {
        127
    }

    fn default_tone_priority() -> Vec<Degree> {
        DEFAULT_TONE_PRIORITY.to_vec()
    }

    pub fn lead_options(&self) -> VoiceLeadOptions {
        VoiceLeadOptions {
            base_octave: self.base_octave,
            bass_octave: self.bass_octave,
            max_voices: self.max_voices,
            min_note: self.min_note,
            max_note: self.max_note,
            tone_priority: self.tone_priority.clone(),
            bass_strategy: self.bass_strategy,
            keep_common_tones: self.keep_common_tones,
            allow_voice_crossing: self.allow_voice_crossing,
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            base_octave: self.base_octave,
            bass_octave: self.bass_octave,
            voicing: self.voicing,
        }
    }
}

impl Default for VoicingConfig {
    fn default() -> Self {
        Self {
            base_octave: Self::default_base_octave(),
            bass_octave: None,
            max_voices: Self::default_max_voices(),
            min_note: 0,
            max_note: Self::default_max_note(),
            tone_priority: Self::default_tone_priority(),
            bass_strategy: BassStrategy::default(),
            keep_common_tones: false,
            allow_voice_crossing: false,
            voicing: Voicing::default(),
        }
    }
}
