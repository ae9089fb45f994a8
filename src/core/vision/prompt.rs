use crate::core::chart::format::format_timestamp;
use crate::core::video::ChangeEvent;

/// 每个批次共用的说明文字
pub const INSTRUCTION: &str = "\
These are frames from a guitar tutorial video. Each frame has:
- A chord name shown in large text at the BOTTOM-RIGHT (e.g., 'AM7', 'F#m7', 'Bm7')
- A fretboard chord diagram showing finger positions
- A sheet music line at the bottom showing chord names above the staff

For EACH frame, extract:
1. current_chord: the large chord name label at the bottom-right
2. progression: all chord names visible in the sheet music line, left to right
3. fretboard: the chord diagram, i.e. which strings are muted (X), open (O), and where \
fingers are placed (string number 1=high e, 6=low E, and fret number)

Return one object per frame, in the order the frames are given. Example:
[{\"frame_index\":1,\"current_chord\":\"AM7\",\"progression\":[\"AM7\",\"E/G#\",\"F#m7\",\"EM7\"],\
\"fretboard\":{\"muted\":[6,5],\"open\":[1],\"fingers\":[{\"string\":4,\"fret\":6},{\"string\":3,\"fret\":6},{\"string\":2,\"fret\":5}]}}]

Return ONLY a JSON array, no surrounding prose or markdown.";

/// 帧前的标签，position 从 0 开始
pub fn frame_label(position: usize, event: &ChangeEvent) -> String {
    format!("Frame {} (at {}):", position + 1, format_timestamp(event.timestamp))
}
