//! Chord spelling, validation, and voice leading.
//!
//! Chords are described as typed [`ChordSpec`]s (root, quality, tensions,
//! omissions, slash bass), spelled with correct enharmonics, and rendered
//! to MIDI note numbers either as block chords or as a voice-led sequence
//! where each voice slot keeps its identity from chord to chord.
//!
//! # Example
//!
//! ```
//! use harmony::{voice_lead, ChordQuality, ChordSpec, Letter, NoteName, VoiceLeadOptions};
//!
//! let progression = [
//!     ChordSpec::new(NoteName::natural(Letter::D), ChordQuality::Minor7),
//!     ChordSpec::new(NoteName::natural(Letter::G), ChordQuality::Dominant7),
//!     ChordSpec::new(NoteName::natural(Letter::C), ChordQuality::Major7),
//! ];
//!
//! let chords = voice_lead(&progression, &VoiceLeadOptions::new(3)).unwrap();
//! assert_eq!(chords.len(), 3);
//! assert!(chords.iter().all(|c| c.voices.len() == 4));
//! ```

pub mod chord;
pub mod midi;
pub mod note;
pub mod perform;
pub mod quality;
pub mod tone;
pub mod voicing;

pub use chord::{
    build_chord, chord_symbol, chord_tones, validate_chord_spec, Chord, ChordError, ChordSpec,
    ChordTone, ErrorCode, ErrorReport,
};
pub use midi::{midi_to_spelling, note_to_midi, MidiSpelling, SpellingStrategy, OCTAVES};
pub use note::{Accidental, Letter, NoteName};
pub use perform::{to_performance_output, PerformanceChord, PerformanceOptions};
pub use quality::{ChordQuality, OmitDegree, Tension};
pub use tone::{calculate_tone, Degree};
pub use voicing::{
    render_chord_sequence, voice_lead, BassStrategy, MidiChord, RenderOptions, VoiceAnalysis,
    VoiceLeadOptions, Voicing, DEFAULT_TONE_PRIORITY,
};

/// Fatal errors from chord building and rendering.
///
/// Validation problems arrive as [`HarmonyError::InvalidChord`]; the other
/// variants mean the request cannot be satisfied at all (an unspellable
/// tone, an empty note range) and are not worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HarmonyError {
    #[error(transparent)]
    InvalidChord(#[from] ChordError),

    #[error("cannot spell degree {degree} above {root} (offset {offset}) with at most two accidentals")]
    Unspellable {
        root: NoteName,
        degree: Degree,
        offset: i8,
    },

    #[error("no free MIDI note with pitch class {pitch_class} in {min}..={max}")]
    NoCandidate { pitch_class: u8, min: u8, max: u8 },

    #[error("invalid note range {min}..={max}: need min <= max <= 127")]
    InvalidRange { min: u8, max: u8 },

    #[error("octave {0} outside -1..=9")]
    InvalidOctave(i32),

    #[error("MIDI note {0} outside 0..=127")]
    OutOfMidiRange(i32),

    #[error("invalid note name: {0:?}")]
    InvalidNoteName(String),
}

pub type Result<T> = std::result::Result<T, HarmonyError>;
