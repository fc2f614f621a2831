//! Letter + accidental note names and pitch-class arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::HarmonyError;

/// Natural note letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    /// Letters in scale order starting from C
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Semitone offset of the natural letter from C (0-11)
    pub fn semitone(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    /// Position in `ALL` (C = 0 .. B = 6)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Letter `steps` positions above this one, wrapping at B.
    pub fn step(self, steps: usize) -> Letter {
        Letter::ALL[(self.index() + steps) % 7]
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Letter::C => "C",
            Letter::D => "D",
            Letter::E => "E",
            Letter::F => "F",
            Letter::G => "G",
            Letter::A => "A",
            Letter::B => "B",
        };
        f.write_str(s)
    }
}

/// Chromatic alteration, double-flat through double-sharp.
///
/// Serialized as its semitone offset (-2..=2) so specs stay compact in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Accidental {
    DoubleFlat,
    Flat,
    #[default]
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    pub fn offset(self) -> i8 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }

    /// Accidental for a semitone offset, or `None` outside -2..=2.
    pub fn from_offset(offset: i32) -> Option<Accidental> {
        match offset {
            -2 => Some(Accidental::DoubleFlat),
            -1 => Some(Accidental::Flat),
            0 => Some(Accidental::Natural),
            1 => Some(Accidental::Sharp),
            2 => Some(Accidental::DoubleSharp),
            _ => None,
        }
    }

    /// Text form used in chord symbols: `bb`, `b`, ``, `#`, `##`
    pub fn symbol(self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "bb",
            Accidental::Flat => "b",
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::DoubleSharp => "##",
        }
    }
}

impl TryFrom<i8> for Accidental {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Accidental::from_offset(value as i32)
            .ok_or_else(|| format!("accidental {} outside -2..=2", value))
    }
}

impl From<Accidental> for i8 {
    fn from(value: Accidental) -> Self {
        value.offset()
    }
}

/// A spelled note without octave: letter plus accidental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteName {
    pub letter: Letter,
    #[serde(default)]
    pub accidental: Accidental,
}

impl NoteName {
    pub const fn new(letter: Letter, accidental: Accidental) -> Self {
        NoteName { letter, accidental }
    }

    pub const fn natural(letter: Letter) -> Self {
        NoteName::new(letter, Accidental::Natural)
    }

    pub const fn sharp(letter: Letter) -> Self {
        NoteName::new(letter, Accidental::Sharp)
    }

    pub const fn flat(letter: Letter) -> Self {
        NoteName::new(letter, Accidental::Flat)
    }

    /// Pitch class 0-11 (C=0). Cb wraps to 11, B# to 0.
    pub fn pitch_class(self) -> u8 {
        (self.letter.semitone() + self.accidental.offset() as i32).rem_euclid(12) as u8
    }

    /// True when both notes sound the same pitch class, regardless of spelling.
    pub fn is_enharmonic(self, other: NoteName) -> bool {
        self.pitch_class() == other.pitch_class()
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.accidental.symbol())
    }
}

impl FromStr for NoteName {
    type Err = HarmonyError;

    /// Parse `C`, `F#`, `Bb`, `Ebb`, `G##`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HarmonyError::InvalidNoteName(s.to_string());
        let trimmed = s.trim();
        let mut chars = trimmed.chars();

        let letter = match chars.next() {
            Some('C') => Letter::C,
            Some('D') => Letter::D,
            Some('E') => Letter::E,
            Some('F') => Letter::F,
            Some('G') => Letter::G,
            Some('A') => Letter::A,
            Some('B') => Letter::B,
            _ => return Err(invalid()),
        };

        let accidental = match chars.as_str() {
            "" => Accidental::Natural,
            "#" => Accidental::Sharp,
            "##" => Accidental::DoubleSharp,
            "b" => Accidental::Flat,
            "bb" => Accidental::DoubleFlat,
            _ => return Err(invalid()),
        };

        Ok(NoteName::new(letter, accidental))
    }
}
