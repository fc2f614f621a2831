//! Enharmonic tone calculation.
//!
//! Every spelled chord tone in the crate comes out of [`calculate_tone`]:
//! the letter is fixed by counting scale steps from the root, then the
//! accidental is whatever makes that letter land on the target pitch class.
//! That is what turns the diminished 7th above C into Bbb instead of A.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::note::{Accidental, NoteName};
use crate::{HarmonyError, Result};

/// Interval degree above a chord root.
///
/// 9, 11 and 13 share letters with 2, 4 and 6 but are kept distinct so
/// that ordering and tension handling can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Degree {
    #[serde(rename = "root")]
    Root,
    #[serde(rename = "2")]
    Second,
    #[serde(rename = "3")]
    Third,
    #[serde(rename = "4")]
    Fourth,
    #[serde(rename = "5")]
    Fifth,
    #[serde(rename = "6")]
    Sixth,
    #[serde(rename = "7")]
    Seventh,
    #[serde(rename = "9")]
    Ninth,
    #[serde(rename = "11")]
    Eleventh,
    #[serde(rename = "13")]
    Thirteenth,
}

/// Chord tones stacked in thirds; tones are always emitted in this order.
pub const TERTIAN_ORDER: [Degree; 7] = [
    Degree::Root,
    Degree::Third,
    Degree::Fifth,
    Degree::Seventh,
    Degree::Ninth,
    Degree::Eleventh,
    Degree::Thirteenth,
];

impl Degree {
    /// Degree for its conventional number (1 = root), `None` if not in the table.
    pub fn from_number(number: u8) -> Option<Degree> {
        match number {
            1 => Some(Degree::Root),
            2 => Some(Degree::Second),
            3 => Some(Degree::Third),
            4 => Some(Degree::Fourth),
            5 => Some(Degree::Fifth),
            6 => Some(Degree::Sixth),
            7 => Some(Degree::Seventh),
            9 => Some(Degree::Ninth),
            11 => Some(Degree::Eleventh),
            13 => Some(Degree::Thirteenth),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Degree::Root => 1,
            Degree::Second => 2,
            Degree::Third => 3,
            Degree::Fourth => 4,
            Degree::Fifth => 5,
            Degree::Sixth => 6,
            Degree::Seventh => 7,
            Degree::Ninth => 9,
            Degree::Eleventh => 11,
            Degree::Thirteenth => 13,
        }
    }

    /// Letter steps above the root.
    pub fn letter_offset(self) -> usize {
        match self {
            Degree::Root => 0,
            Degree::Second | Degree::Ninth => 1,
            Degree::Third => 2,
            Degree::Fourth | Degree::Eleventh => 3,
            Degree::Fifth => 4,
            Degree::Sixth | Degree::Thirteenth => 5,
            Degree::Seventh => 6,
        }
    }

    /// Semitones above the root for the major/perfect form of the degree.
    pub fn base_semitone(self) -> i32 {
        match self {
            Degree::Root => 0,
            Degree::Second | Degree::Ninth => 2,
            Degree::Third => 4,
            Degree::Fourth | Degree::Eleventh => 5,
            Degree::Fifth => 7,
            Degree::Sixth | Degree::Thirteenth => 9,
            Degree::Seventh => 11,
        }
    }

    /// Position in [`TERTIAN_ORDER`]; 2, 4 and 6 sort after 13.
    pub fn tertian_rank(self) -> usize {
        TERTIAN_ORDER
            .iter()
            .position(|&d| d == self)
            .unwrap_or(TERTIAN_ORDER.len())
    }

    /// Name used in voicing analysis: "root", "3", "5", ...
    pub fn name(self) -> &'static str {
        match self {
            Degree::Root => "root",
            Degree::Second => "2",
            Degree::Third => "3",
            Degree::Fourth => "4",
            Degree::Fifth => "5",
            Degree::Sixth => "6",
            Degree::Seventh => "7",
            Degree::Ninth => "9",
            Degree::Eleventh => "11",
            Degree::Thirteenth => "13",
        }
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Spell the note `degree` above `root`, altered by `offset` semitones.
///
/// `offset` is relative to the major/perfect form: `(Third, -1)` is a minor
/// third, `(Seventh, -2)` a diminished seventh.
pub fn calculate_tone(root: NoteName, degree: Degree, offset: i8) -> Result<NoteName> {
    let letter = root.letter.step(degree.letter_offset());

    let target_pc =
        (root.pitch_class() as i32 + degree.base_semitone() + offset as i32).rem_euclid(12);

    let mut accidental = target_pc - letter.semitone();
    if accidental > 2 {
        accidental -= 12;
    } else if accidental < -2 {
        accidental += 12;
    }

    let accidental = Accidental::from_offset(accidental).ok_or(HarmonyError::Unspellable {
        root,
        degree,
        offset,
    })?;

    Ok(NoteName::new(letter, accidental))
}
