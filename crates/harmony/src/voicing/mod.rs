//! Rendering chord sequences to MIDI.
//!
//! Two renderers share the same output type:
//! - [`voice_lead`] threads state through the sequence so each voice slot
//!   moves as little as possible from chord to chord.
//! - [`render_chord_sequence`] stacks every chord independently as a block
//!   chord, optionally in drop-2 or drop-3 voicing.

mod assign;
mod block;
mod select;

pub use block::render_chord_sequence;

use serde::{Deserialize, Serialize};
use tracing::{debug_span, trace};

use crate::chord::ChordSpec;
use crate::midi::{check_octave, MIDI_MAX};
use crate::tone::Degree;
use crate::{HarmonyError, Result};

use assign::VoiceLeader;

/// Tone priority used when nothing else is given: the 5th goes first.
pub const DEFAULT_TONE_PRIORITY: [Degree; 7] = [
    Degree::Root,
    Degree::Third,
    Degree::Seventh,
    Degree::Ninth,
    Degree::Eleventh,
    Degree::Thirteenth,
    Degree::Fifth,
];

/// How the bass moves between chords without an explicit slash bass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BassStrategy {
    /// Root placed in `bass_octave` every time
    #[default]
    FollowRoot,
    /// Root placed within a tritone of the previous bass
    MinimalMotion,
}

/// Block-chord spacing for [`render_chord_sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Voicing {
    #[default]
    Close,
    Drop2,
    Drop3,
}

/// Options for [`voice_lead`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceLeadOptions {
    /// Octave the first chord is stacked from (4 = middle C)
    pub base_octave: i32,
    /// Octave for the bass. Default: `base_octave - 1`
    pub bass_octave: Option<i32>,
    /// Upper voices per chord; tones are doubled or dropped to fit
    pub max_voices: usize,
    pub min_note: u8,
    pub max_note: u8,
    /// Most essential degree first
    pub tone_priority: Vec<Degree>,
    pub bass_strategy: BassStrategy,
    /// Hold shared pitch classes in their slots before moving anything else
    pub keep_common_tones: bool,
    pub allow_voice_crossing: bool,
}

impl Default for VoiceLeadOptions {
    fn default() -> Self {
        VoiceLeadOptions {
            base_octave: 4,
            bass_octave: None,
            max_voices: 4,
            min_note: 0,
            max_note: MIDI_MAX,
            tone_priority: DEFAULT_TONE_PRIORITY.to_vec(),
            bass_strategy: BassStrategy::FollowRoot,
            keep_common_tones: false,
            allow_voice_crossing: false,
        }
    }
}

impl VoiceLeadOptions {
    pub fn new(base_octave: i32) -> Self {
        VoiceLeadOptions {
            base_octave,
            ..Default::default()
        }
    }

    pub fn with_max_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices;
        self
    }

    pub fn with_range(mut self, min_note: u8, max_note: u8) -> Self {
        self.min_note = min_note;
        self.max_note = max_note;
        self
    }

    pub fn with_bass_octave(mut self, octave: i32) -> Self {
        self.bass_octave = Some(octave);
        self
    }

    pub fn with_bass_strategy(mut self, strategy: BassStrategy) -> Self {
        self.bass_strategy = strategy;
        self
    }

    pub fn with_tone_priority(mut self, priority: Vec<Degree>) -> Self {
        self.tone_priority = priority;
        self
    }

    pub fn keep_common_tones(mut self, keep: bool) -> Self {
        self.keep_common_tones = keep;
        self
    }

    pub fn allow_voice_crossing(mut self, allow: bool) -> Self {
        self.allow_voice_crossing = allow;
        self
    }

    pub fn effective_bass_octave(&self) -> i32 {
        self.bass_octave.unwrap_or(self.base_octave.saturating_sub(1))
    }

    /// Reject a note range or octave that no chord could be placed in.
    pub(crate) fn check(&self) -> Result<()> {
        if self.min_note > self.max_note || self.max_note > MIDI_MAX {
            return Err(HarmonyError::InvalidRange {
                min: self.min_note,
                max: self.max_note,
            });
        }
        check_octave(self.base_octave)?;
        if let Some(octave) = self.bass_octave {
            check_octave(octave)?;
        }
        Ok(())
    }
}

/// Options for [`render_chord_sequence`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub base_octave: i32,
    /// Default: `base_octave - 1`
    pub bass_octave: Option<i32>,
    pub voicing: Voicing,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            base_octave: 4,
            bass_octave: None,
            voicing: Voicing::Close,
        }
    }
}

/// Which chord degrees were dropped or doubled to fit `max_voices`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceAnalysis {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omitted: Vec<Degree>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub doubled: Vec<Degree>,
}

impl VoiceAnalysis {
    fn non_empty(omitted: Vec<Degree>, doubled: Vec<Degree>) -> Option<Self> {
        if omitted.is_empty() && doubled.is_empty() {
            None
        } else {
            Some(VoiceAnalysis { omitted, doubled })
        }
    }
}

/// A chord rendered to MIDI note numbers.
///
/// In [`voice_lead`] output, `voices[i]` is the same voice in every chord
/// of the sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiChord {
    pub bass: u8,
    pub voices: Vec<u8>,
    pub spec: ChordSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<VoiceAnalysis>,
}

/// Voice-lead a progression.
///
/// The first chord is stacked upward from `base_octave`; every later chord
/// is assigned slot by slot with minimal motion. The mean pitch of the
/// first chord stays fixed as an anchor so long progressions do not creep
/// up or down the keyboard.
pub fn voice_lead(specs: &[ChordSpec], options: &VoiceLeadOptions) -> Result<Vec<MidiChord>> {
    options.check()?;

    let span = debug_span!(
        "voice_lead",
        chords = specs.len(),
        max_voices = options.max_voices,
        keep_common_tones = options.keep_common_tones
    );
    let _enter = span.enter();

    let mut leader = VoiceLeader::new(options);
    let mut chords = Vec::with_capacity(specs.len());

    for (index, spec) in specs.iter().enumerate() {
        let chord = leader.voice(spec, index)?;
        trace!(index, bass = chord.bass, voices = ?chord.voices, "voiced chord");
        chords.push(chord);
    }

    Ok(chords)
}
