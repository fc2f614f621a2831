//! Synth-ready note lists.

use serde::{Deserialize, Serialize};

use crate::voicing::MidiChord;

/// How rendered chords are turned into performance events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceOptions {
    pub velocity: u8,
    /// Per-note velocities, passed through to every chord unchanged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocities: Option<Vec<u8>>,
    /// Start beat per chord index. Chords past the end get no start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_times: Option<Vec<f64>>,
    /// Duration in beats applied to every chord
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// 1-based MIDI channel
    pub channel: u8,
}

impl Default for PerformanceOptions {
    fn default() -> Self {
        PerformanceOptions {
            velocity: 100,
            velocities: None,
            start_times: None,
            duration: None,
            channel: 1,
        }
    }
}

/// One chord as a flat, sorted set of MIDI notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceChord {
    pub notes: Vec<u8>,
    pub velocity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocities: Option<Vec<u8>>,
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_beat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_beats: Option<f64>,
    pub channel: u8,
}

/// Merge bass and voices into one ascending, duplicate-free note list per
/// chord and attach the playback attributes.
pub fn to_performance_output(chords: &[MidiChord], options: &PerformanceOptions) -> Vec<PerformanceChord> {
    chords
        .iter()
        .enumerate()
        .map(|(index, chord)| {
            let mut notes = Vec::with_capacity(chord.voices.len() + 1);
            notes.push(chord.bass);
            notes.extend_from_slice(&chord.voices);
            notes.sort_unstable();
            notes.dedup();

            PerformanceChord {
                notes,
                velocity: options.velocity,
                velocities: options.velocities.clone(),
                index,
                start_beat: options
                    .start_times
                    .as_ref()
                    .and_then(|times| times.get(index).copied()),
                duration_beats: options.duration,
                channel: options.channel,
            }
        })
        .collect()
}
