//! Fitting a chord's tones to a fixed number of voices.

use crate::chord::ChordTone;
use crate::tone::Degree;

/// Tones chosen for the upper voices, in tertian order with any doublings
/// appended at the end.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Selection {
    pub tones: Vec<ChordTone>,
    pub omitted: Vec<Degree>,
    pub doubled: Vec<Degree>,
}

impl Selection {
    pub fn pitch_classes(&self) -> Vec<u8> {
        self.tones.iter().map(|t| t.note.pitch_class()).collect()
    }
}

/// Keep or double tones so exactly `max_voices` remain.
///
/// With room to spare, degrees are doubled by walking `priority` from the
/// top (wrapping if more doublings are needed). Otherwise the lowest-ranked
/// degrees are dropped; degrees missing from `priority` rank last.
pub(crate) fn select_tones(tones: &[ChordTone], max_voices: usize, priority: &[Degree]) -> Selection {
    if max_voices >= tones.len() {
        let mut doublable: Vec<ChordTone> = priority
            .iter()
            .filter_map(|p| tones.iter().find(|t| t.degree == *p))
            .copied()
            .collect();
        if doublable.is_empty() {
            doublable = tones.to_vec();
        }

        let extra: Vec<ChordTone> = doublable
            .iter()
            .cycle()
            .take(max_voices - tones.len())
            .copied()
            .collect();

        let mut selected = tones.to_vec();
        selected.extend_from_slice(&extra);

        return Selection {
            tones: selected,
            omitted: Vec::new(),
            doubled: extra.iter().map(|t| t.degree).collect(),
        };
    }

    let rank = |degree: Degree| {
        priority
            .iter()
            .position(|p| *p == degree)
            .unwrap_or(usize::MAX)
    };

    let mut by_priority: Vec<usize> = (0..tones.len()).collect();
    by_priority.sort_by_key(|&i| rank(tones[i].degree));
    let kept = &by_priority[..max_voices];

    let (selected, dropped): (Vec<(usize, &ChordTone)>, Vec<(usize, &ChordTone)>) =
        tones.iter().enumerate().partition(|(i, _)| kept.contains(i));

    Selection {
        tones: selected.into_iter().map(|(_, t)| *t).collect(),
        omitted: dropped.into_iter().map(|(_, t)| t.degree).collect(),
        doubled: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::{chord_tones, ChordSpec};
    use crate::quality::ChordQuality;
    use crate::voicing::DEFAULT_TONE_PRIORITY;

    fn tones(root: &str, quality: ChordQuality) -> Vec<ChordTone> {
        chord_tones(&ChordSpec::new(root.parse().unwrap(), quality)).unwrap()
    }

    fn degrees(selection: &Selection) -> Vec<Degree> {
        selection.tones.iter().map(|t| t.degree).collect()
    }

    #[test]
    fn exact_fit_keeps_everything() {
        let s = select_tones(&tones("G", ChordQuality::Dominant7), 4, &DEFAULT_TONE_PRIORITY);
        assert_eq!(s.tones.len(), 4);
        assert!(s.omitted.is_empty());
        assert!(s.doubled.is_empty());
    }

    #[test]
    fn triad_in_four_voices_doubles_root() {
        let s = select_tones(&tones("C", ChordQuality::Major), 4, &DEFAULT_TONE_PRIORITY);
        assert_eq!(
            degrees(&s),
            vec![Degree::Root, Degree::Third, Degree::Fifth, Degree::Root]
        );
        assert_eq!(s.doubled, vec![Degree::Root]);
        assert_eq!(s.pitch_classes(), vec![0, 4, 7, 0]);
    }

    #[test]
    fn doubling_walks_priority_then_wraps() {
        let s = select_tones(&tones("C", ChordQuality::Major), 6, &DEFAULT_TONE_PRIORITY);
        // root, 3, then 7/9/11/13 are absent, so 5, then wrap to root
        assert_eq!(s.doubled, vec![Degree::Root, Degree::Third, Degree::Fifth]);
        assert_eq!(s.tones.len(), 6);
    }

    #[test]
    fn thirteenth_in_four_voices_drops_by_priority() {
        let s = select_tones(&tones("C", ChordQuality::Dominant13), 4, &DEFAULT_TONE_PRIORITY);
        assert_eq!(
            degrees(&s),
            vec![Degree::Root, Degree::Third, Degree::Seventh, Degree::Ninth]
        );
        // Reported in chord order, not priority order.
        assert_eq!(
            s.omitted,
            vec![Degree::Fifth, Degree::Eleventh, Degree::Thirteenth]
        );
    }

    #[test]
    fn seventh_chord_in_three_voices_drops_fifth() {
        let s = select_tones(&tones("D", ChordQuality::Minor7), 3, &DEFAULT_TONE_PRIORITY);
        assert_eq!(degrees(&s), vec![Degree::Root, Degree::Third, Degree::Seventh]);
        assert_eq!(s.omitted, vec![Degree::Fifth]);
    }

    #[test]
    fn unlisted_degrees_rank_last_in_stable_order() {
        let priority = [Degree::Seventh, Degree::Third];
        let s = select_tones(&tones("C", ChordQuality::Dominant9), 3, &priority);
        // 7 and 3 by priority, then root is the first unlisted tone.
        assert_eq!(degrees(&s), vec![Degree::Root, Degree::Third, Degree::Seventh]);
        assert_eq!(s.omitted, vec![Degree::Fifth, Degree::Ninth]);
    }

    #[test]
    fn priority_without_present_degrees_doubles_in_chord_order() {
        let s = select_tones(&tones("C", ChordQuality::Major), 5, &[Degree::Thirteenth]);
        assert_eq!(s.doubled, vec![Degree::Root, Degree::Third]);
    }
}
