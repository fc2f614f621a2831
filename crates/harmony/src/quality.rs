//! Chord qualities, tensions and omissions, with the static interval table.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tone::Degree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    #[serde(rename = "maj")]
    Major,
    #[serde(rename = "min")]
    Minor,
    #[serde(rename = "dim")]
    Diminished,
    #[serde(rename = "aug")]
    Augmented,
    #[serde(rename = "7")]
    Dominant7,
    #[serde(rename = "maj7")]
    Major7,
    #[serde(rename = "min7")]
    Minor7,
    #[serde(rename = "m7b5")]
    HalfDiminished7,
    #[serde(rename = "dim7")]
    Diminished7,
    #[serde(rename = "9")]
    Dominant9,
    #[serde(rename = "maj9")]
    Major9,
    #[serde(rename = "min9")]
    Minor9,
    #[serde(rename = "11")]
    Dominant11,
    #[serde(rename = "maj11")]
    Major11,
    #[serde(rename = "min11")]
    Minor11,
    #[serde(rename = "13")]
    Dominant13,
    #[serde(rename = "maj13")]
    Major13,
    #[serde(rename = "min13")]
    Minor13,
}

/// A quality's spelling recipe: `(degree, offset from major/perfect)` pairs.
pub struct QualityDef {
    pub quality: ChordQuality,
    /// Token appended to the root in chord symbols
    pub token: &'static str,
    /// Name used in serialized specs
    pub name: &'static str,
    pub intervals: &'static [(Degree, i8)],
}

use Degree::{Eleventh as D11, Fifth as D5, Ninth as D9, Root as D1, Seventh as D7,
    Third as D3, Thirteenth as D13};

/// One entry per quality, in `ChordQuality` declaration order.
pub static QUALITIES: [QualityDef; 18] = [
    // Triads
    QualityDef { quality: ChordQuality::Major, token: "", name: "maj", intervals: &[(D1, 0), (D3, 0), (D5, 0)] },
    QualityDef { quality: ChordQuality::Minor, token: "m", name: "min", intervals: &[(D1, 0), (D3, -1), (D5, 0)] },
    QualityDef { quality: ChordQuality::Diminished, token: "dim", name: "dim", intervals: &[(D1, 0), (D3, -1), (D5, -1)] },
    QualityDef { quality: ChordQuality::Augmented, token: "aug", name: "aug", intervals: &[(D1, 0), (D3, 0), (D5, 1)] },
    // Sevenths
    QualityDef { quality: ChordQuality::Dominant7, token: "7", name: "7", intervals: &[(D1, 0), (D3, 0), (D5, 0), (D7, -1)] },
    QualityDef { quality: ChordQuality::Major7, token: "maj7", name: "maj7", intervals: &[(D1, 0), (D3, 0), (D5, 0), (D7, 0)] },
    QualityDef { quality: ChordQuality::Minor7, token: "m7", name: "min7", intervals: &[(D1, 0), (D3, -1), (D5, 0), (D7, -1)] },
    QualityDef { quality: ChordQuality::HalfDiminished7, token: "m7b5", name: "m7b5", intervals: &[(D1, 0), (D3, -1), (D5, -1), (D7, -1)] },
    QualityDef { quality: ChordQuality::Diminished7, token: "dim7", name: "dim7", intervals: &[(D1, 0), (D3, -1), (D5, -1), (D7, -2)] },
    // Ninths
    QualityDef { quality: ChordQuality::Dominant9, token: "9", name: "9", intervals: &[(D1, 0), (D3, 0), (D5, 0), (D7, -1), (D9, 0)] },
    QualityDef { quality: ChordQuality::Major9, token: "maj9", name: "maj9", intervals: &[(D1, 0), (D3, 0), (D5, 0), (D7, 0), (D9, 0)] },
    QualityDef { quality: ChordQuality::Minor9, token: "m9", name: "min9", intervals: &[(D1, 0), (D3, -1), (D5, 0), (D7, -1), (D9, 0)] },
    // Elevenths
    QualityDef { quality: ChordQuality::Dominant11, token: "11", name: "11", intervals: &[(D1, 0), (D3, 0), (D5, 0), (D7, -1), (D9, 0), (D11, 0)] },
    QualityDef { quality: ChordQuality::Major11, token: "maj11", name: "maj11", intervals: &[(D1, 0), (D3, 0), (D5, 0), (D7, 0), (D9, 0), (D11, 0)] },
    QualityDef { quality: ChordQuality::Minor11, token: "m11", name: "min11", intervals: &[(D1, 0), (D3, -1), (D5, 0), (D7, -1), (D9, 0), (D11, 0)] },
    // Thirteenths
    QualityDef { quality: ChordQuality::Dominant13, token: "13", name: "13", intervals: &[(D1, 0), (D3, 0), (D5, 0), (D7, -1), (D9, 0), (D11, 0), (D13, 0)] },
    QualityDef { quality: ChordQuality::Major13, token: "maj13", name: "maj13", intervals: &[(D1, 0), (D3, 0), (D5, 0), (D7, 0), (D9, 0), (D11, 0), (D13, 0)] },
    QualityDef { quality: ChordQuality::Minor13, token: "m13", name: "min13", intervals: &[(D1, 0), (D3, -1), (D5, 0), (D7, -1), (D9, 0), (D11, 0), (D13, 0)] },
];

impl ChordQuality {
    pub fn def(self) -> &'static QualityDef {
        &QUALITIES[self as usize]
    }

    pub fn intervals(self) -> &'static [(Degree, i8)] {
        self.def().intervals
    }

    /// Suffix for chord symbol display
    pub fn token(self) -> &'static str {
        self.def().token
    }

    pub fn has_degree(self, degree: Degree) -> bool {
        self.intervals().iter().any(|&(d, _)| d == degree)
    }

    /// dim, dim7 and m7b5: the flat fifth defines the chord.
    pub fn is_diminished(self) -> bool {
        matches!(
            self,
            ChordQuality::Diminished | ChordQuality::Diminished7 | ChordQuality::HalfDiminished7
        )
    }

    pub fn is_augmented(self) -> bool {
        matches!(self, ChordQuality::Augmented)
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.def().name)
    }
}

/// Altered extension added above the seventh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tension {
    #[serde(rename = "b9")]
    FlatNine,
    #[serde(rename = "#9")]
    SharpNine,
    #[serde(rename = "#11")]
    SharpEleven,
    #[serde(rename = "b13")]
    FlatThirteen,
}

impl Tension {
    /// Symbol order: b9, #9, #11, b13
    pub const ORDER: [Tension; 4] = [
        Tension::FlatNine,
        Tension::SharpNine,
        Tension::SharpEleven,
        Tension::FlatThirteen,
    ];

    pub fn degree(self) -> Degree {
        match self {
            Tension::FlatNine | Tension::SharpNine => Degree::Ninth,
            Tension::SharpEleven => Degree::Eleventh,
            Tension::FlatThirteen => Degree::Thirteenth,
        }
    }

    pub fn offset(self) -> i8 {
        match self {
            Tension::FlatNine | Tension::FlatThirteen => -1,
            Tension::SharpNine | Tension::SharpEleven => 1,
        }
    }

    fn rank(self) -> usize {
        self as usize
    }

    /// Sort tensions into symbol order.
    pub fn sorted(tensions: &[Tension]) -> Vec<Tension> {
        let mut sorted = tensions.to_vec();
        sorted.sort_by_key(|t| t.rank());
        sorted
    }
}

impl fmt::Display for Tension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tension::FlatNine => "b9",
            Tension::SharpNine => "#9",
            Tension::SharpEleven => "#11",
            Tension::FlatThirteen => "b13",
        };
        f.write_str(s)
    }
}

/// Chord tone that may be left out of a voicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OmitDegree {
    #[serde(rename = "3")]
    Third,
    #[serde(rename = "5")]
    Fifth,
}

impl OmitDegree {
    pub fn degree(self) -> Degree {
        match self {
            OmitDegree::Third => Degree::Third,
            OmitDegree::Fifth => Degree::Fifth,
        }
    }

    /// "3rd" or "5th", for messages.
    pub fn ordinal(self) -> &'static str {
        match self {
            OmitDegree::Third => "3rd",
            OmitDegree::Fifth => "5th",
        }
    }
}

impl fmt::Display for OmitDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OmitDegree::Third => f.write_str("3"),
            OmitDegree::Fifth => f.write_str("5"),
        }
    }
}
