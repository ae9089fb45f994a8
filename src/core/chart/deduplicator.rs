use log::info;

use crate::models::chord::AnnotatedEvent;

/// 去掉与上一个保留项和弦名相同的连续项。
/// 按字符串比较，占位符 "?" 与空字符串也参与比较。
pub fn deduplicate(events: Vec<AnnotatedEvent>) -> Vec<AnnotatedEvent> {
    let before = events.len();
    let mut timeline: Vec<AnnotatedEvent> = Vec::with_capacity(before);

    for event in events {
        let repeated = timeline
            .last()
            .map(|kept| kept.current_chord == event.current_chord)
            .unwrap_or(false);
        if !repeated {
            timeline.push(event);
        }
    }

    info!("🧹 Deduplicated: {} → {} chord changes", before, timeline.len());
    timeline
}
