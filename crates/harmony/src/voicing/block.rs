use super::{MidiChord, RenderOptions, Voicing};
use crate::chord::{chord_tones, ChordSpec};
use crate::midi::{check_octave, note_to_midi, MIDI_MAX};
use crate::{HarmonyError, Result};

/// Render each chord on its own as a block chord, with no voice leading.
///
/// Tones are stacked upward from the root in `base_octave`, each at or above
/// the one before. Drop voicings apply to chords of four or more voices.
pub fn render_chord_sequence(specs: &[ChordSpec], options: &RenderOptions) -> Result<Vec<MidiChord>> {
    let base_octave = check_octave(options.base_octave)?;
    let bass_octave = match options.bass_octave {
        Some(octave) => check_octave(octave)?,
        None => base_octave - 1,
    };

    specs
        .iter()
        .map(|spec| {
            let tones = chord_tones(spec)?;
            let bass = to_midi(note_to_midi(spec.bass.unwrap_or(spec.root), bass_octave))?;

            let mut stacked = Vec::with_capacity(tones.len());
            let mut floor = tones
                .first()
                .map_or(0, |t| note_to_midi(t.note, base_octave));
            for tone in &tones {
                let mut midi = note_to_midi(tone.note, base_octave);
                while midi < floor {
                    midi += 12;
                }
                stacked.push(midi);
                floor = midi;
            }

            let voices = apply_voicing(stacked, options.voicing)
                .into_iter()
                .map(to_midi)
                .collect::<Result<Vec<_>>>()?;

            Ok(MidiChord {
                bass,
                voices,
                spec: spec.clone(),
                analysis: None,
            })
        })
        .collect()
}

fn apply_voicing(mut voices: Vec<i32>, voicing: Voicing) -> Vec<i32> {
    let drop = match voicing {
        Voicing::Close => return voices,
        Voicing::Drop2 => 2,
        Voicing::Drop3 => 3,
    };
    if voices.len() < 4 {
        return voices;
    }

    voices.sort_unstable();
    let idx = voices.len() - drop;
    voices[idx] -= 12;
    voices.sort_unstable();
    voices
}

fn to_midi(value: i32) -> Result<u8> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= MIDI_MAX)
        .ok_or(HarmonyError::OutOfMidiRange(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::{ChordQuality, OmitDegree, Tension};
    use pretty_assertions::assert_eq;

    fn chord(root: &str, quality: ChordQuality) -> ChordSpec {
        ChordSpec::new(root.parse().unwrap(), quality)
    }

    fn render(spec: ChordSpec, voicing: Voicing) -> MidiChord {
        let options = RenderOptions {
            voicing,
            ..Default::default()
        };
        render_chord_sequence(&[spec], &options).unwrap().remove(0)
    }

    #[test]
    fn close_triad_and_seventh() {
        let c = render(chord("C", ChordQuality::Major), Voicing::Close);
        assert_eq!(c.bass, 48);
        assert_eq!(c.voices, vec![60, 64, 67]);
        assert_eq!(c.analysis, None);

        let g7 = render(chord("G", ChordQuality::Dominant7), Voicing::Close);
        assert_eq!(g7.voices, vec![67, 71, 74, 77]);
    }

    #[test]
    fn stack_wraps_past_the_octave() {
        let a = render(chord("A", ChordQuality::Minor), Voicing::Close);
        assert_eq!(a.voices, vec![69, 72, 76]);
    }

    #[test]
    fn drop_voicings() {
        let cmaj7 = chord("C", ChordQuality::Major7);
        assert_eq!(render(cmaj7.clone(), Voicing::Close).voices, vec![60, 64, 67, 71]);
        assert_eq!(render(cmaj7.clone(), Voicing::Drop2).voices, vec![55, 60, 64, 71]);
        assert_eq!(render(cmaj7, Voicing::Drop3).voices, vec![52, 60, 67, 71]);
    }

    #[test]
    fn drop_voicing_skips_triads() {
        let c = render(chord("C", ChordQuality::Major), Voicing::Drop2);
        assert_eq!(c.voices, vec![60, 64, 67]);
    }

    #[test]
    fn tensions_omissions_and_slash_bass() {
        let spec = chord("G", ChordQuality::Dominant7)
            .with_tension(Tension::FlatNine)
            .with_omit(OmitDegree::Fifth)
            .with_bass("B".parse().unwrap());
        let out = render(spec, Voicing::Close);
        assert_eq!(out.bass, 59);
        assert_eq!(out.voices, vec![67, 71, 77, 80]);
    }

    #[test]
    fn explicit_bass_octave() {
        let options = RenderOptions {
            base_octave: 5,
            bass_octave: Some(2),
            voicing: Voicing::Close,
        };
        let out = render_chord_sequence(&[chord("D", ChordQuality::Minor)], &options).unwrap();
        assert_eq!(out[0].bass, 38);
        assert_eq!(out[0].voices, vec![74, 77, 81]);
    }

    #[test]
    fn octave_outside_midi_is_an_error() {
        let options = RenderOptions {
            base_octave: 10,
            ..Default::default()
        };
        let err = render_chord_sequence(&[chord("B", ChordQuality::Major)], &options).unwrap_err();
        assert_eq!(err, HarmonyError::InvalidOctave(10));

        let options = RenderOptions {
            bass_octave: Some(i32::MIN),
            ..Default::default()
        };
        let err = render_chord_sequence(&[chord("B", ChordQuality::Major)], &options).unwrap_err();
        assert_eq!(err, HarmonyError::InvalidOctave(i32::MIN));
    }

    #[test]
    fn stack_past_note_127_is_an_error() {
        let options = RenderOptions {
            base_octave: 9,
            ..Default::default()
        };
        // G9 is 127, so the B above it is not a MIDI note.
        let err = render_chord_sequence(&[chord("G", ChordQuality::Major)], &options).unwrap_err();
        assert_eq!(err, HarmonyError::OutOfMidiRange(131));
    }
}
