use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::select::select_tones;
use super::{BassStrategy, MidiChord, VoiceAnalysis, VoiceLeadOptions};
use crate::chord::{chord_tones, ChordSpec};
use crate::midi::{note_to_midi, octave_floor};
use crate::{HarmonyError, Result};

/// Fold state for one [`super::voice_lead`] call.
pub(crate) struct VoiceLeader<'a> {
    options: &'a VoiceLeadOptions,
    previous_voices: Vec<u8>,
    previous_bass: Option<u8>,
    anchor_center: f64,
}

impl<'a> VoiceLeader<'a> {
    pub fn new(options: &'a VoiceLeadOptions) -> Self {
        VoiceLeader {
            options,
            previous_voices: Vec::new(),
            previous_bass: None,
            anchor_center: 0.0,
        }
    }

    pub fn voice(&mut self, spec: &ChordSpec, index: usize) -> Result<MidiChord> {
        let tones = chord_tones(spec)?;
        let selection = select_tones(&tones, self.options.max_voices, &self.options.tone_priority);
        if !selection.omitted.is_empty() {
            debug!(index, omitted = ?selection.omitted, "dropped tones to fit max_voices");
        }
        if !selection.doubled.is_empty() {
            debug!(index, doubled = ?selection.doubled, "doubled tones to fill max_voices");
        }
        let targets = selection.pitch_classes();

        let bass = self.place_bass(spec)?;
        let mut taken = BTreeSet::from([bass]);

        let voices = if self.previous_voices.is_empty() {
            let voices = self.first_voicing(&targets, &mut taken)?;
            self.anchor_center = mean(&voices)
                .unwrap_or_else(|| f64::from(octave_floor(self.options.base_octave)));
            voices
        } else if self.options.keep_common_tones {
            self.common_tone_voicing(&targets, &mut taken)?
        } else {
            self.greedy_voicing(&targets, &mut taken)?
        };

        self.previous_voices = voices.clone();
        self.previous_bass = Some(bass);

        Ok(MidiChord {
            bass,
            voices,
            spec: spec.clone(),
            analysis: VoiceAnalysis::non_empty(selection.omitted, selection.doubled),
        })
    }

    fn place_bass(&self, spec: &ChordSpec) -> Result<u8> {
        let octave = self.options.effective_bass_octave();
        let (pitch_class, desired) =
            match (spec.bass, self.options.bass_strategy, self.previous_bass) {
                (Some(bass), _, _) => (bass.pitch_class(), note_to_midi(bass, octave)),
                (None, BassStrategy::MinimalMotion, Some(previous)) => {
                    let pitch_class = spec.root.pitch_class();
                    // Signed, so a tritone keeps the direction of the raw difference.
                    let mut shift = i32::from(pitch_class) - i32::from(previous % 12);
                    if shift > 6 {
                        shift -= 12;
                    } else if shift < -6 {
                        shift += 12;
                    }
                    (pitch_class, i32::from(previous) + shift)
                }
                (None, _, _) => (spec.root.pitch_class(), note_to_midi(spec.root, octave)),
            };

        let desired = f64::from(desired);
        closest(self.candidates(pitch_class), &BTreeSet::new(), desired, desired)
            .ok_or_else(|| self.no_candidate(pitch_class))
    }

    /// Stack upward from the base octave, each voice on the lowest free
    /// note at or above the one before it.
    fn first_voicing(&self, targets: &[u8], taken: &mut BTreeSet<u8>) -> Result<Vec<u8>> {
        let (min, max) = (self.options.min_note, self.options.max_note);
        let mut floor = octave_floor(self.options.base_octave).clamp(i32::from(min), i32::from(max)) as u8;
        let mut voices = Vec::with_capacity(targets.len());

        for &pitch_class in targets {
            let note = self
                .candidates(pitch_class)
                .find(|n| *n >= floor && !taken.contains(n))
                .or_else(|| {
                    let floor = f64::from(floor);
                    closest(self.candidates(pitch_class), taken, floor, floor)
                })
                .ok_or_else(|| self.no_candidate(pitch_class))?;
            taken.insert(note);
            floor = note;
            voices.push(note);
        }

        // Only reachable out of order when the range forced a fallback.
        if !self.options.allow_voice_crossing {
            voices.sort_unstable();
        }
        Ok(voices)
    }

    /// Rank targets by their note nearest the anchor, then pair them with
    /// slots in ascending order of previous value. Each slot takes its
    /// target's free note nearest to where the slot was.
    fn greedy_voicing(&self, targets: &[u8], taken: &mut BTreeSet<u8>) -> Result<Vec<u8>> {
        let anchor = self.anchor_center;

        let mut ranked: Vec<(u8, f64)> = targets
            .iter()
            .map(|&pc| {
                let near = closest(self.candidates(pc), &BTreeSet::new(), anchor, anchor)
                    .map_or(f64::INFINITY, f64::from);
                (pc, near)
            })
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut slots: Vec<usize> = (0..self.previous_voices.len()).collect();
        slots.sort_by_key(|&slot| self.previous_voices[slot]);

        let mut voices = self.previous_voices.clone();
        for (i, &slot) in slots.iter().enumerate() {
            let previous = self.previous_voices[slot];
            voices[slot] = match ranked.get(i) {
                Some(&(pc, _)) => closest(self.candidates(pc), taken, f64::from(previous), anchor)
                    .ok_or_else(|| self.no_candidate(pc))?,
                None => self.double_nearest(targets, previous, taken)?,
            };
            taken.insert(voices[slot]);
        }

        for &(pc, _) in ranked.iter().skip(slots.len()) {
            voices.push(self.place_near_anchor(pc, taken)?);
        }

        // Slots are ascending on entry, so sorting keeps each slot's identity.
        if !self.options.allow_voice_crossing {
            voices.sort_unstable();
        }
        Ok(voices)
    }

    /// Hold shared pitch classes in place, move the remaining slots to the
    /// nearest unclaimed pitch class, then let any leftover slot double.
    ///
    /// Each distinct pitch class is held or claimed once; the doubled copies
    /// in `targets` only widen the pool for leftover slots.
    fn common_tone_voicing(&self, targets: &[u8], taken: &mut BTreeSet<u8>) -> Result<Vec<u8>> {
        let anchor = self.anchor_center;
        let mut remaining: Vec<u8> = Vec::with_capacity(targets.len());
        for &pc in targets {
            if !remaining.contains(&pc) {
                remaining.push(pc);
            }
        }
        let mut voices: Vec<Option<u8>> = vec![None; self.previous_voices.len()];

        for (slot, &previous) in self.previous_voices.iter().enumerate() {
            if taken.contains(&previous) {
                continue;
            }
            if let Some(pos) = remaining.iter().position(|&pc| pc == previous % 12) {
                remaining.remove(pos);
                taken.insert(previous);
                voices[slot] = Some(previous);
            }
        }

        for (slot, voice) in voices.iter_mut().enumerate() {
            if voice.is_some() {
                continue;
            }
            let Some(&first) = remaining.first() else {
                break;
            };
            let previous = f64::from(self.previous_voices[slot]);
            let pool = remaining.iter().flat_map(|&pc| self.candidates(pc));
            let note = closest(pool, taken, previous, anchor)
                .ok_or_else(|| self.no_candidate(first))?;
            remaining.retain(|&pc| pc != note % 12);
            taken.insert(note);
            *voice = Some(note);
        }

        let mut placed = Vec::with_capacity(voices.len());
        for (slot, voice) in voices.into_iter().enumerate() {
            let note = match voice {
                Some(note) => note,
                None => self.double_nearest(targets, self.previous_voices[slot], taken)?,
            };
            taken.insert(note);
            placed.push(note);
        }

        if !self.options.allow_voice_crossing && placed.windows(2).any(|w| w[0] > w[1]) {
            warn!(voices = ?placed, "common-tone voicing crosses voices");
        }
        Ok(placed)
    }

    /// Free note of any target pitch class nearest `previous`, or `previous`
    /// itself when nothing in range is free.
    fn double_nearest(&self, targets: &[u8], previous: u8, taken: &BTreeSet<u8>) -> Result<u8> {
        let pool = targets.iter().flat_map(|&pc| self.candidates(pc));
        closest(pool, taken, f64::from(previous), self.anchor_center)
            .or_else(|| (!taken.contains(&previous)).then_some(previous))
            .ok_or_else(|| self.no_candidate(previous % 12))
    }

    fn place_near_anchor(&self, pitch_class: u8, taken: &mut BTreeSet<u8>) -> Result<u8> {
        let anchor = self.anchor_center;
        let note = closest(self.candidates(pitch_class), taken, anchor, anchor)
            .ok_or_else(|| self.no_candidate(pitch_class))?;
        taken.insert(note);
        Ok(note)
    }

    fn candidates(&self, pitch_class: u8) -> impl Iterator<Item = u8> {
        candidates(pitch_class, self.options.min_note, self.options.max_note)
    }

    fn no_candidate(&self, pitch_class: u8) -> HarmonyError {
        HarmonyError::NoCandidate {
            pitch_class,
            min: self.options.min_note,
            max: self.options.max_note,
        }
    }
}

/// Every MIDI note of `pitch_class` within `min..=max`, ascending.
fn candidates(pitch_class: u8, min: u8, max: u8) -> impl Iterator<Item = u8> {
    let first = i32::from(min) + (i32::from(pitch_class) - i32::from(min)).rem_euclid(12);
    (first..=i32::from(max)).step_by(12).map(|n| n as u8)
}

/// Free candidate nearest `target`. Ties go to the one nearer `anchor`,
/// then to the lower note.
fn closest(
    candidates: impl Iterator<Item = u8>,
    taken: &BTreeSet<u8>,
    target: f64,
    anchor: f64,
) -> Option<u8> {
    candidates.filter(|n| !taken.contains(n)).min_by(|a, b| {
        let (a_f, b_f) = (f64::from(*a), f64::from(*b));
        (a_f - target)
            .abs()
            .total_cmp(&(b_f - target).abs())
            .then((a_f - anchor).abs().total_cmp(&(b_f - anchor).abs()))
            .then(a.cmp(b))
    })
}

fn mean(voices: &[u8]) -> Option<f64> {
    if voices.is_empty() {
        return None;
    }
    let sum: u32 = voices.iter().map(|&v| u32::from(v)).sum();
    Some(f64::from(sum) / voices.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::ChordError;
    use crate::quality::{ChordQuality, OmitDegree, Tension};
    use crate::tone::Degree;
    use crate::voicing::voice_lead;
    use pretty_assertions::assert_eq;

    fn chord(root: &str, quality: ChordQuality) -> ChordSpec {
        ChordSpec::new(root.parse().unwrap(), quality)
    }

    fn voices(chords: &[MidiChord]) -> Vec<Vec<u8>> {
        chords.iter().map(|c| c.voices.clone()).collect()
    }

    fn basses(chords: &[MidiChord]) -> Vec<u8> {
        chords.iter().map(|c| c.bass).collect()
    }

    #[test]
    fn candidates_respect_range() {
        assert_eq!(candidates(0, 0, 127).take(3).collect::<Vec<_>>(), vec![0, 12, 24]);
        assert_eq!(candidates(4, 50, 80).collect::<Vec<_>>(), vec![52, 64, 76]);
        assert_eq!(candidates(9, 60, 68).count(), 0);
        assert_eq!(candidates(7, 120, 127).collect::<Vec<_>>(), vec![127]);
    }

    #[test]
    fn closest_breaks_ties_toward_anchor_then_lower() {
        let free = BTreeSet::new();
        // 54 and 66 are both 6 away from 60.
        assert_eq!(closest([54, 66].into_iter(), &free, 60.0, 70.0), Some(66));
        assert_eq!(closest([54, 66].into_iter(), &free, 60.0, 60.0), Some(54));
        assert_eq!(closest([54, 66].into_iter(), &BTreeSet::from([54]), 60.0, 60.0), Some(66));
    }

    #[test]
    fn two_five_one_in_four_voices() {
        let progression = [
            chord("D", ChordQuality::Minor7),
            chord("G", ChordQuality::Dominant7),
            chord("C", ChordQuality::Major7),
        ];
        let out = voice_lead(&progression, &VoiceLeadOptions::new(3)).unwrap();

        assert_eq!(
            voices(&out),
            vec![vec![50, 53, 57, 60], vec![50, 53, 55, 59], vec![52, 55, 59, 60]]
        );
        assert_eq!(basses(&out), vec![38, 43, 36]);
        assert!(out.iter().all(|c| c.analysis.is_none()));
    }

    #[test]
    fn greedy_moves_to_relative_minor() {
        let progression = [chord("C", ChordQuality::Major), chord("A", ChordQuality::Minor)];
        let options = VoiceLeadOptions::new(4).with_max_voices(3);
        let out = voice_lead(&progression, &options).unwrap();

        assert_eq!(voices(&out), vec![vec![60, 64, 67], vec![60, 64, 69]]);
        assert_eq!(basses(&out), vec![48, 57]);
    }

    #[test]
    fn greedy_keeps_shared_g_when_moving_to_dominant() {
        let progression = [chord("C", ChordQuality::Major), chord("G", ChordQuality::Major)];
        let options = VoiceLeadOptions::new(4).with_max_voices(3);
        let out = voice_lead(&progression, &options).unwrap();

        assert_eq!(out[1].voices, vec![59, 62, 67]);
    }

    #[test]
    fn common_tones_hold_their_slots() {
        let progression = [chord("C", ChordQuality::Major), chord("A", ChordQuality::Minor)];
        let options = VoiceLeadOptions::new(4)
            .with_max_voices(3)
            .keep_common_tones(true);
        let out = voice_lead(&progression, &options).unwrap();

        assert_eq!(voices(&out), vec![vec![60, 64, 67], vec![60, 64, 69]]);
        assert_eq!(&out[0].voices[..2], &out[1].voices[..2]);
    }

    #[test]
    fn common_tones_double_without_leaping() {
        let progression = [
            chord("C", ChordQuality::Major),
            chord("A", ChordQuality::Minor),
            chord("F", ChordQuality::Major7),
        ];
        let options = VoiceLeadOptions::new(4).keep_common_tones(true);
        let out = voice_lead(&progression, &options).unwrap();

        // The top C is held as the doubled root of Am, then steps to F.
        assert_eq!(
            voices(&out),
            vec![vec![60, 64, 67, 72], vec![60, 64, 69, 72], vec![60, 64, 69, 77]]
        );
        assert_eq!(out[1].analysis.clone().unwrap().doubled, vec![Degree::Root]);
    }

    #[test]
    fn common_tones_keep_slot_identity_over_order() {
        let progression = [
            chord("C", ChordQuality::Major),
            chord("C", ChordQuality::Major7).with_omit(OmitDegree::Third),
        ];
        let options = VoiceLeadOptions::new(4)
            .with_max_voices(3)
            .keep_common_tones(true);
        let out = voice_lead(&progression, &options).unwrap();

        // The E slot falls to B below the held C instead of being re-sorted.
        assert_eq!(out[1].voices, vec![60, 59, 67]);
    }

    #[test]
    fn triad_in_four_voices_reports_doubled_root() {
        let out = voice_lead(&[chord("C", ChordQuality::Major)], &VoiceLeadOptions::new(4)).unwrap();
        assert_eq!(out[0].voices, vec![60, 64, 67, 72]);
        let analysis = out[0].analysis.clone().unwrap();
        assert_eq!(analysis.doubled, vec![Degree::Root]);
        assert!(analysis.omitted.is_empty());
    }

    #[test]
    fn thirteenth_in_four_voices_reports_omissions() {
        let out = voice_lead(&[chord("C", ChordQuality::Dominant13)], &VoiceLeadOptions::new(4)).unwrap();
        assert_eq!(out[0].voices.len(), 4);
        assert_eq!(
            out[0].analysis.clone().unwrap().omitted,
            vec![Degree::Fifth, Degree::Eleventh, Degree::Thirteenth]
        );
    }

    #[test]
    fn slash_bass_overrides_strategy() {
        let progression = [
            chord("C", ChordQuality::Major),
            chord("C", ChordQuality::Major).with_bass("E".parse().unwrap()),
        ];
        let options = VoiceLeadOptions::new(4).with_bass_strategy(BassStrategy::MinimalMotion);
        let out = voice_lead(&progression, &options).unwrap();
        assert_eq!(basses(&out), vec![48, 52]);
    }

    #[test]
    fn minimal_motion_bass_moves_within_a_tritone() {
        let progression = [
            chord("C", ChordQuality::Major),
            chord("G", ChordQuality::Major),
            chord("C", ChordQuality::Major),
        ];
        let follow = voice_lead(&progression, &VoiceLeadOptions::new(4)).unwrap();
        assert_eq!(basses(&follow), vec![48, 55, 48]);

        let options = VoiceLeadOptions::new(4).with_bass_strategy(BassStrategy::MinimalMotion);
        let minimal = voice_lead(&progression, &options).unwrap();
        assert_eq!(basses(&minimal), vec![48, 43, 48]);
    }

    #[test]
    fn minimal_motion_tritone_follows_the_signed_difference() {
        let progression = [
            chord("F#", ChordQuality::Major),
            chord("C", ChordQuality::Major),
            chord("F#", ChordQuality::Major),
        ];
        let options = VoiceLeadOptions::new(4).with_bass_strategy(BassStrategy::MinimalMotion);
        let out = voice_lead(&progression, &options).unwrap();
        assert_eq!(basses(&out), vec![54, 48, 54]);
    }

    #[test]
    fn explicit_bass_octave() {
        let options = VoiceLeadOptions::new(4).with_bass_octave(1);
        let out = voice_lead(&[chord("A", ChordQuality::Minor)], &options).unwrap();
        assert_eq!(out[0].bass, 33);
    }

    #[test]
    fn bass_never_shares_a_note_with_voices() {
        // bass octave equal to base octave puts the root right on voice 0
        let options = VoiceLeadOptions::new(4).with_bass_octave(4).with_max_voices(3);
        let out = voice_lead(&[chord("C", ChordQuality::Major)], &options).unwrap();
        assert_eq!(out[0].bass, 60);
        assert_eq!(out[0].voices, vec![72, 76, 79]);
    }

    #[test]
    fn too_narrow_range_is_fatal() {
        let options = VoiceLeadOptions::new(4).with_range(60, 61).with_max_voices(3);
        let err = voice_lead(&[chord("C", ChordQuality::Major)], &options).unwrap_err();
        assert_eq!(
            err,
            HarmonyError::NoCandidate { pitch_class: 0, min: 60, max: 61 }
        );
    }

    #[test]
    fn inverted_range_is_rejected_before_any_chord() {
        let options = VoiceLeadOptions::new(4).with_range(72, 60);
        let err = voice_lead(&[], &options).unwrap_err();
        assert_eq!(err, HarmonyError::InvalidRange { min: 72, max: 60 });
    }

    #[test]
    fn octaves_outside_midi_are_rejected() {
        let c = [chord("C", ChordQuality::Major)];
        let err = voice_lead(&c, &VoiceLeadOptions::new(i32::MAX / 2)).unwrap_err();
        assert_eq!(err, HarmonyError::InvalidOctave(i32::MAX / 2));

        let err = voice_lead(&c, &VoiceLeadOptions::new(i32::MIN)).unwrap_err();
        assert_eq!(err, HarmonyError::InvalidOctave(i32::MIN));

        let err = voice_lead(&c, &VoiceLeadOptions::new(4).with_bass_octave(10)).unwrap_err();
        assert_eq!(err, HarmonyError::InvalidOctave(10));
    }

    #[test]
    fn lowest_octave_pushes_bass_to_note_zero() {
        let out = voice_lead(&[chord("C", ChordQuality::Major)], &VoiceLeadOptions::new(-1)).unwrap();
        assert_eq!(out[0].bass, 0);
        assert_eq!(out[0].voices, vec![12, 16, 19, 24]);
    }

    #[test]
    fn invalid_spec_aborts_the_sequence() {
        let progression = [
            chord("C", ChordQuality::Major),
            chord("G", ChordQuality::Dominant7)
                .with_tension(Tension::FlatNine)
                .with_tension(Tension::FlatNine),
        ];
        let err = voice_lead(&progression, &VoiceLeadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            HarmonyError::InvalidChord(ChordError::DuplicateTension(Tension::FlatNine))
        ));
    }

    #[test]
    fn empty_progression() {
        assert!(voice_lead(&[], &VoiceLeadOptions::default()).unwrap().is_empty());
    }
}
