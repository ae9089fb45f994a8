use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use super::summary::ChordSummary;
use crate::core::error::ChordError;
use crate::models::chord::{AnnotatedEvent, Fretboard, PLACEHOLDER_CHORD};

const RULE_WIDTH: usize = 70;

/// 秒 → H:MM:SS（舍去小数部分）
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

fn describe_fretboard(fretboard: &Fretboard) -> Option<String> {
    let join = |values: &[i32]| {
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut parts = Vec::new();
    if !fretboard.muted.is_empty() {
        parts.push(format!("Muted: [{}]", join(&fretboard.muted)));
    }
    if !fretboard.open.is_empty() {
        parts.push(format!("Open: [{}]", join(&fretboard.open)));
    }
    if !fretboard.fingers.is_empty() {
        let fingers = fretboard
            .fingers
            .iter()
            .map(|f| format!("S{}F{}", f.string, f.fret))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("Fingers: {}", fingers));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

/// 人类可读的和弦谱
pub fn format_chord_chart(timeline: &[AnnotatedEvent], summary: &ChordSummary) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        "  CHORD PROGRESSION — Extracted from video".to_string(),
        rule.clone(),
        String::new(),
    ];

    for event in timeline {
        let chord = if event.current_chord.is_empty() {
            PLACEHOLDER_CHORD
        } else {
            event.current_chord.as_str()
        };
        lines.push(format!("[{}]  {}", format_timestamp(event.timestamp), chord));

        if event.parse_error {
            lines.push("        (unreadable: vision output could not be parsed)".to_string());
        } else if let Some(description) = event.fretboard.as_ref().and_then(describe_fretboard) {
            lines.push(format!("        {}", description));
        }

        if !event.progression.is_empty() {
            lines.push(format!("        Line: {}", event.progression.join(" | ")));
        }
        lines.push(String::new());
    }

    lines.push(rule.clone());
    lines.push(format!("  UNIQUE CHORDS ({}):", summary.unique_chords.len()));
    lines.push(format!("  {}", summary.unique_chords.join(", ")));
    lines.push(String::new());
    lines.push("  SONG STRUCTURE (unique progression lines):".to_string());
    for (i, line) in summary.progressions.iter().enumerate() {
        lines.push(format!("  {}. {}", i + 1, line.join(" | ")));
    }
    lines.push(rule);

    lines.join("\n")
}

/// 待写出的和弦谱（文本 + JSON）
#[derive(Debug, Clone)]
pub struct ChordChart {
    pub text: String,
    pub json: String,
}

impl ChordChart {
    /// json_events 可以是去重前或去重后的序列，由调用方决定
    pub fn new(
        timeline: &[AnnotatedEvent],
        summary: &ChordSummary,
        json_events: &[AnnotatedEvent],
    ) -> Result<Self, ChordError> {
        Ok(Self {
            text: format_chord_chart(timeline, summary),
            json: serde_json::to_string_pretty(json_events)?,
        })
    }

    /// 写出文本到 path，JSON 写到同名 .json；返回 JSON 路径
    pub fn write_to(&self, path: &Path) -> Result<PathBuf, ChordError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json_path = json_path_for(path);
        fs::write(path, &self.text)?;
        fs::write(&json_path, &self.json)?;

        info!("💾 Saved: {:?}", path);
        info!("💾 Saved: {:?}", json_path);
        Ok(json_path)
    }
}

pub fn json_path_for(path: &Path) -> PathBuf {
    let mut json_path = path.to_path_buf();
    json_path.set_extension("json");
    if json_path == path {
        // 输出文件本身就是 .json
        json_path.set_extension("events.json");
    }
    json_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video::ChangeEvent;
    use crate::models::chord::{FingerPlacement, FrameObservation};

    fn source(i: usize, timestamp: f64) -> ChangeEvent {
        ChangeEvent {
            frame_index: i,
            timestamp,
            frame_path: PathBuf::from(format!("frame_{:04}.jpg", i + 1)),
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "0:00:00");
        assert_eq!(format_timestamp(65.5), "0:01:05");
        assert_eq!(format_timestamp(3725.9), "1:02:05");
        assert_eq!(format_timestamp(-3.0), "0:00:00");
    }

    #[test]
    fn test_chart_layout() {
        let first = AnnotatedEvent::from_observation(
            &source(0, 0.0),
            FrameObservation {
                current_chord: "AM7".to_string(),
                progression: vec!["AM7".to_string(), "E/G#".to_string()],
                fretboard: Some(Fretboard {
                    muted: vec![6, 5],
                    open: vec![1],
                    fingers: vec![
                        FingerPlacement { string: 4, fret: 6 },
                        FingerPlacement { string: 3, fret: 6 },
                    ],
                }),
                ..Default::default()
            },
        );
        let failed = AnnotatedEvent::placeholder(&source(9, 4.5));
        let timeline = vec![first, failed];
        let summary = ChordSummary::from_timeline(&timeline);

        let chart = format_chord_chart(&timeline, &summary);
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines[0], "=".repeat(70));
        assert_eq!(lines[1], "  CHORD PROGRESSION — Extracted from video");
        assert_eq!(lines[4], "[0:00:00]  AM7");
        assert_eq!(lines[5], "        Muted: [6, 5] | Open: [1] | Fingers: S4F6, S3F6");
        assert_eq!(lines[6], "        Line: AM7 | E/G#");
        assert_eq!(lines[8], "[0:00:04]  ?");
        assert_eq!(lines[9], "        (unreadable: vision output could not be parsed)");
        assert!(chart.contains("  UNIQUE CHORDS (1):\n  AM7\n"));
        assert!(chart.contains("  1. AM7 | E/G#\n"));
        assert!(chart.ends_with(&"=".repeat(70)));
    }

    #[test]
    fn test_empty_chord_rendered_as_placeholder() {
        let event = AnnotatedEvent::from_observation(&source(0, 1.0), FrameObservation::default());
        let chart = format_chord_chart(&[event], &ChordSummary::default());
        assert!(chart.contains("[0:00:01]  ?\n"));
        assert!(chart.contains("UNIQUE CHORDS (0):"));
    }

    #[test]
    fn test_json_path_for() {
        assert_eq!(json_path_for(Path::new("out/chart.txt")), PathBuf::from("out/chart.json"));
        assert_eq!(json_path_for(Path::new("chart")), PathBuf::from("chart.json"));
        assert_eq!(json_path_for(Path::new("chart.json")), PathBuf::from("chart.events.json"));
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let events = vec![AnnotatedEvent::placeholder(&source(0, 0.0))];
        let chart = ChordChart::new(&events, &ChordSummary::default(), &events).expect("chart");

        let path = dir.path().join("nested").join("chord_chart.txt");
        let json_path = chart.write_to(&path).expect("write");

        assert_eq!(fs::read_to_string(&path).expect("read chart"), chart.text);
        let decoded: Vec<AnnotatedEvent> =
            serde_json::from_str(&fs::read_to_string(json_path).expect("read json")).expect("decode");
        assert_eq!(decoded, events);
    }
}
