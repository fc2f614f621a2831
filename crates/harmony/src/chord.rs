//! Chord assembly and validation.
//!
//! A [`ChordSpec`] is checked by an ordered chain of rules; the first rule
//! that fires is the only error reported. Valid specs are assembled from the
//! quality's interval table, tensions, and omissions, then spelled through
//! [`calculate_tone`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::note::NoteName;
use crate::quality::{ChordQuality, OmitDegree, Tension};
use crate::tone::{calculate_tone, Degree};
use crate::Result;

/// What to build: root, quality, optional alterations and slash bass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordSpec {
    pub root: NoteName,
    pub quality: ChordQuality,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tensions: Vec<Tension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omit: Vec<OmitDegree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bass: Option<NoteName>,
}

impl ChordSpec {
    pub fn new(root: NoteName, quality: ChordQuality) -> Self {
        ChordSpec {
            root,
            quality,
            tensions: Vec::new(),
            omit: Vec::new(),
            bass: None,
        }
    }

    pub fn with_tension(mut self, tension: Tension) -> Self {
        self.tensions.push(tension);
        self
    }

    pub fn with_omit(mut self, omit: OmitDegree) -> Self {
        self.omit.push(omit);
        self
    }

    pub fn with_bass(mut self, bass: NoteName) -> Self {
        self.bass = Some(bass);
        self
    }
}

/// A spelled chord: display symbol plus tones in tertian order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pub symbol: String,
    pub tones: Vec<NoteName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bass: Option<NoteName>,
}

/// One spelled chord tone and the degree it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordTone {
    pub degree: Degree,
    pub note: NoteName,
}

/// Stable machine-readable validation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    DuplicateTension,
    DuplicateOmit,
    BassEqualsRoot,
    TensionDuplicatesChordTone,
    InvalidTensionForQuality,
    CannotOmitDefiningTone,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::DuplicateTension => "DUPLICATE_TENSION",
            ErrorCode::DuplicateOmit => "DUPLICATE_OMIT",
            ErrorCode::BassEqualsRoot => "BASS_EQUALS_ROOT",
            ErrorCode::TensionDuplicatesChordTone => "TENSION_DUPLICATES_CHORD_TONE",
            ErrorCode::InvalidTensionForQuality => "INVALID_TENSION_FOR_QUALITY",
            ErrorCode::CannotOmitDefiningTone => "CANNOT_OMIT_DEFINING_TONE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a spec cannot be built. Returned as a value, never panicked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordError {
    #[error("Duplicate tension: {0}")]
    DuplicateTension(Tension),

    #[error("Duplicate omit: {0}")]
    DuplicateOmit(OmitDegree),

    #[error("Bass note cannot be the same as root")]
    BassEqualsRoot,

    #[error("Tension {tension} conflicts with existing {degree} in {quality} chord")]
    TensionDuplicatesChordTone {
        tension: Tension,
        degree: Degree,
        quality: ChordQuality,
    },

    #[error("Tensions not allowed on {0} chords")]
    InvalidTensionForQuality(ChordQuality),

    #[error(
        "Cannot omit {} from {} chord - it defines the quality",
        .omitted.ordinal(),
        quality_label(.quality)
    )]
    CannotOmitDefiningTone {
        omitted: OmitDegree,
        quality: ChordQuality,
    },
}

impl ChordError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ChordError::DuplicateTension(_) => ErrorCode::DuplicateTension,
            ChordError::DuplicateOmit(_) => ErrorCode::DuplicateOmit,
            ChordError::BassEqualsRoot => ErrorCode::BassEqualsRoot,
            ChordError::TensionDuplicatesChordTone { .. } => ErrorCode::TensionDuplicatesChordTone,
            ChordError::InvalidTensionForQuality(_) => ErrorCode::InvalidTensionForQuality,
            ChordError::CannotOmitDefiningTone { .. } => ErrorCode::CannotOmitDefiningTone,
        }
    }

    /// `{code, message}` pair for callers that report errors as data.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

/// Augmented is spelled out in messages; every other quality uses its name.
fn quality_label(quality: &ChordQuality) -> String {
    if quality.is_augmented() {
        "augmented".to_string()
    } else {
        quality.to_string()
    }
}

type Rule = fn(&ChordSpec) -> Option<ChordError>;

/// Evaluated in order; the first hit wins.
static RULES: [Rule; 7] = [
    duplicate_tension,
    duplicate_omit,
    bass_equals_root,
    tension_duplicates_chord_tone,
    tension_on_diminished,
    omit_defining_third,
    omit_defining_fifth,
];

fn first_duplicate<T: PartialEq + Copy>(items: &[T]) -> Option<T> {
    items
        .iter()
        .enumerate()
        .find(|(i, item)| items[..*i].contains(item))
        .map(|(_, &item)| item)
}

fn duplicate_tension(spec: &ChordSpec) -> Option<ChordError> {
    first_duplicate(&spec.tensions).map(ChordError::DuplicateTension)
}

fn duplicate_omit(spec: &ChordSpec) -> Option<ChordError> {
    first_duplicate(&spec.omit).map(ChordError::DuplicateOmit)
}

fn bass_equals_root(spec: &ChordSpec) -> Option<ChordError> {
    (spec.bass == Some(spec.root)).then_some(ChordError::BassEqualsRoot)
}

fn tension_duplicates_chord_tone(spec: &ChordSpec) -> Option<ChordError> {
    spec.tensions
        .iter()
        .find(|t| spec.quality.has_degree(t.degree()))
        .map(|&tension| ChordError::TensionDuplicatesChordTone {
            tension,
            degree: tension.degree(),
            quality: spec.quality,
        })
}

fn tension_on_diminished(spec: &ChordSpec) -> Option<ChordError> {
    (!spec.tensions.is_empty() && spec.quality.is_diminished())
        .then_some(ChordError::InvalidTensionForQuality(spec.quality))
}

fn omit_defining_third(spec: &ChordSpec) -> Option<ChordError> {
    (spec.omit.contains(&OmitDegree::Third) && spec.quality.is_diminished()).then_some(
        ChordError::CannotOmitDefiningTone {
            omitted: OmitDegree::Third,
            quality: spec.quality,
        },
    )
}

fn omit_defining_fifth(spec: &ChordSpec) -> Option<ChordError> {
    let defines_fifth = spec.quality.is_diminished() || spec.quality.is_augmented();
    (spec.omit.contains(&OmitDegree::Fifth) && defines_fifth).then_some(
        ChordError::CannotOmitDefiningTone {
            omitted: OmitDegree::Fifth,
            quality: spec.quality,
        },
    )
}

/// Check a spec, reporting only the first violated rule.
pub fn validate_chord_spec(spec: &ChordSpec) -> std::result::Result<(), ChordError> {
    match RULES.iter().find_map(|rule| rule(spec)) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Validate and spell a spec's tones, paired with their degrees.
pub fn chord_tones(spec: &ChordSpec) -> Result<Vec<ChordTone>> {
    validate_chord_spec(spec)?;

    let mut intervals: Vec<(Degree, i8)> = spec.quality.intervals().to_vec();

    for tension in &spec.tensions {
        let degree = tension.degree();
        match intervals.iter_mut().find(|(d, _)| *d == degree) {
            Some(entry) => entry.1 = tension.offset(),
            None => intervals.push((degree, tension.offset())),
        }
    }

    intervals.retain(|(degree, _)| !spec.omit.iter().any(|o| o.degree() == *degree));
    intervals.sort_by_key(|(degree, _)| degree.tertian_rank());

    intervals
        .into_iter()
        .map(|(degree, offset)| {
            calculate_tone(spec.root, degree, offset).map(|note| ChordTone { degree, note })
        })
        .collect()
}

/// Render the display symbol, e.g. `Cmaj9#11(no5)/E`.
pub fn chord_symbol(spec: &ChordSpec) -> String {
    let mut symbol = format!("{}{}", spec.root, spec.quality.token());

    for tension in Tension::sorted(&spec.tensions) {
        symbol.push_str(&tension.to_string());
    }

    for omit in &spec.omit {
        symbol.push_str(&format!("(no{})", omit));
    }

    if let Some(bass) = spec.bass {
        symbol.push('/');
        symbol.push_str(&bass.to_string());
    }

    symbol
}

/// Validate a spec and build its spelled chord.
pub fn build_chord(spec: &ChordSpec) -> Result<Chord> {
    let tones = chord_tones(spec)?;

    Ok(Chord {
        symbol: chord_symbol(spec),
        tones: tones.into_iter().map(|t| t.note).collect(),
        bass: spec.bass,
    })
}
