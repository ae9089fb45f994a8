use serde::Serialize;

use crate::models::chord::AnnotatedEvent;

/// 时间线的只读摘要
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChordSummary {
    /// 首次出现顺序，不含占位符与空值
    pub unique_chords: Vec<String>,
    /// 首次出现顺序的不同乐谱行
    pub progressions: Vec<Vec<String>>,
}

impl ChordSummary {
    pub fn from_timeline(timeline: &[AnnotatedEvent]) -> Self {
        let mut summary = Self::default();

        for event in timeline {
            if event.has_chord() && !summary.unique_chords.contains(&event.current_chord) {
                summary.unique_chords.push(event.current_chord.clone());
            }
            if !event.progression.is_empty() && !summary.progressions.contains(&event.progression) {
                summary.progressions.push(event.progression.clone());
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video::ChangeEvent;
    use crate::models::chord::FrameObservation;
    use std::path::PathBuf;

    fn event(i: usize, chord: &str, line: &[&str]) -> AnnotatedEvent {
        AnnotatedEvent::from_observation(
            &ChangeEvent {
                frame_index: i,
                timestamp: i as f64 / 2.0,
                frame_path: PathBuf::from(format!("frame_{:04}.jpg", i + 1)),
            },
            FrameObservation {
                current_chord: chord.to_string(),
                progression: line.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_unique_chords_first_seen_order() {
        let timeline = vec![
            event(0, "Am", &[]),
            event(2, "F", &[]),
            event(4, "G", &[]),
            event(6, "Am", &[]),
        ];
        let summary = ChordSummary::from_timeline(&timeline);
        assert_eq!(summary.unique_chords, vec!["Am", "F", "G"]);
        assert!(summary.progressions.is_empty());
    }

    #[test]
    fn test_skips_placeholder_and_empty() {
        let mut failed = event(2, "?", &[]);
        failed.parse_error = true;
        let timeline = vec![event(0, "", &[]), failed, event(4, "E7", &[])];
        assert_eq!(ChordSummary::from_timeline(&timeline).unique_chords, vec!["E7"]);
    }

    #[test]
    fn test_unique_progression_lines() {
        let timeline = vec![
            event(0, "AM7", &["AM7", "E/G#", "F#m7"]),
            event(2, "E/G#", &["AM7", "E/G#", "F#m7"]),
            event(4, "Bm7", &["Bm7", "E7"]),
            event(6, "E7", &[]),
            event(8, "AM7", &["AM7", "E/G#", "F#m7"]),
            event(10, "F#m7", &["AM7", "E/G#"]),
        ];
        let summary = ChordSummary::from_timeline(&timeline);
        assert_eq!(
            summary.progressions,
            vec![
                vec!["AM7", "E/G#", "F#m7"],
                vec!["Bm7", "E7"],
                vec!["AM7", "E/G#"],
            ]
        );
    }

    #[test]
    fn test_empty_timeline() {
        assert_eq!(ChordSummary::from_timeline(&[]), ChordSummary::default());
    }
}
