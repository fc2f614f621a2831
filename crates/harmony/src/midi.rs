//! MIDI pitch conversion.
//!
//! Octave numbering follows the C4 = 60 convention (C0 = 12). Accidentals
//! are applied after the octave, so Cb4 is 59 and B#4 is 72.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::note::{Accidental, Letter, NoteName};
use crate::{HarmonyError, Result};

/// Highest valid MIDI note number.
pub const MIDI_MAX: u8 = 127;

/// Octaves whose C is a MIDI note (C-1 = 0 through C9 = 120).
pub const OCTAVES: RangeInclusive<i32> = -1..=9;

/// Spelling preference when turning a MIDI number back into a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellingStrategy {
    #[default]
    Sharps,
    Flats,
}

/// A note name placed in a specific octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiSpelling {
    pub note: NoteName,
    pub octave: i32,
}

const SHARP_SPELLINGS: [NoteName; 12] = [
    NoteName::natural(Letter::C),
    NoteName::sharp(Letter::C),
    NoteName::natural(Letter::D),
    NoteName::sharp(Letter::D),
    NoteName::natural(Letter::E),
    NoteName::natural(Letter::F),
    NoteName::sharp(Letter::F),
    NoteName::natural(Letter::G),
    NoteName::sharp(Letter::G),
    NoteName::natural(Letter::A),
    NoteName::sharp(Letter::A),
    NoteName::natural(Letter::B),
];

const FLAT_SPELLINGS: [NoteName; 12] = [
    NoteName::natural(Letter::C),
    NoteName::flat(Letter::D),
    NoteName::natural(Letter::D),
    NoteName::flat(Letter::E),
    NoteName::natural(Letter::E),
    NoteName::natural(Letter::F),
    NoteName::flat(Letter::G),
    NoteName::natural(Letter::G),
    NoteName::flat(Letter::A),
    NoteName::natural(Letter::A),
    NoteName::flat(Letter::B),
    NoteName::natural(Letter::B),
];

/// MIDI number of `note` in `octave`. May fall outside 0..=127 for extreme
/// octaves; callers that emit MIDI check the range.
pub fn note_to_midi(note: NoteName, octave: i32) -> i32 {
    12 + octave * 12 + note.letter.semitone() + note.accidental.offset() as i32
}

/// Canonical spelling of a MIDI number: naturals where possible, otherwise
/// single sharps or flats per `strategy`.
pub fn midi_to_spelling(midi: u8, strategy: SpellingStrategy) -> MidiSpelling {
    let pitch_class = (midi % 12) as usize;
    let octave = (midi / 12) as i32 - 1;

    let note = match strategy {
        SpellingStrategy::Sharps => SHARP_SPELLINGS[pitch_class],
        SpellingStrategy::Flats => FLAT_SPELLINGS[pitch_class],
    };

    MidiSpelling { note, octave }
}

pub(crate) fn check_octave(octave: i32) -> Result<i32> {
    if OCTAVES.contains(&octave) {
        Ok(octave)
    } else {
        Err(HarmonyError::InvalidOctave(octave))
    }
}

/// MIDI number of the C that starts `octave`.
pub(crate) fn octave_floor(octave: i32) -> i32 {
    note_to_midi(NoteName::new(Letter::C, Accidental::Natural), octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(s: &str) -> NoteName {
        s.parse().unwrap()
    }

    #[test]
    fn naturals_in_octave_four() {
        let expected = [("C", 60), ("D", 62), ("E", 64), ("F", 65), ("G", 67), ("A", 69), ("B", 71)];
        for (name, midi) in expected {
            assert_eq!(note_to_midi(note(name), 4), midi, "{}", name);
        }
    }

    #[test]
    fn accidentals_cross_octave_boundaries() {
        assert_eq!(note_to_midi(note("C#"), 4), 61);
        assert_eq!(note_to_midi(note("Db"), 4), 61);
        assert_eq!(note_to_midi(note("E#"), 4), 65);
        assert_eq!(note_to_midi(note("Cb"), 4), 59);
        assert_eq!(note_to_midi(note("B#"), 4), 72);
        assert_eq!(note_to_midi(note("C##"), 4), 62);
        assert_eq!(note_to_midi(note("Bbb"), 4), 69);
    }

    #[test]
    fn octave_numbering() {
        assert_eq!(note_to_midi(note("C"), 0), 12);
        assert_eq!(note_to_midi(note("A"), 0), 21);
        assert_eq!(note_to_midi(note("C"), 3), 48);
        assert_eq!(note_to_midi(note("C"), 8), 108);
        assert_eq!(note_to_midi(note("C"), -1), 0);
        assert_eq!(octave_floor(4), 60);
    }

    #[test]
    fn spelling_prefers_naturals() {
        assert_eq!(
            midi_to_spelling(60, SpellingStrategy::Sharps),
            MidiSpelling { note: note("C"), octave: 4 }
        );
        assert_eq!(
            midi_to_spelling(69, SpellingStrategy::Flats),
            MidiSpelling { note: note("A"), octave: 4 }
        );
    }

    #[test]
    fn spelling_strategy_picks_accidental() {
        assert_eq!(midi_to_spelling(61, SpellingStrategy::Sharps).note, note("C#"));
        assert_eq!(midi_to_spelling(61, SpellingStrategy::Flats).note, note("Db"));
        assert_eq!(midi_to_spelling(0, SpellingStrategy::Sharps).octave, -1);
        assert_eq!(midi_to_spelling(127, SpellingStrategy::Sharps).note, note("G"));
    }
}
