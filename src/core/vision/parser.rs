use crate::models::chord::FrameObservation;

/// 去掉可选的 ``` 代码块包裹和 json 语言标记
pub fn strip_code_fence(raw: &str) -> &str {
    if !raw.contains("```") {
        return raw.trim();
    }

    let inner = raw.split("```").nth(1).unwrap_or("");
    let trimmed = inner.trim_start();
    let body = match trimmed.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &trimmed[4..],
        _ => trimmed,
    };
    body.trim()
}

/// 解析模型文本为逐帧结果；只接受 JSON 数组
pub fn parse_observations(raw: &str) -> Result<Vec<FrameObservation>, serde_json::Error> {
    serde_json::from_str(strip_code_fence(raw))
}

/// 日志里只保留原文开头
pub fn preview(raw: &str, max_chars: usize) -> String {
    match raw.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &raw[..idx]),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_array() {
        let obs = parse_observations(r#"[{"current_chord":"Am"},{"current_chord":"F"}]"#).expect("parse");
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[1].current_chord, "F");
    }

    #[test]
    fn test_fenced_array() {
        let raw = "Here you go:\n```json\n[{\"current_chord\":\"G\"}]\n```\nLet me know!";
        let obs = parse_observations(raw).expect("parse");
        assert_eq!(obs[0].current_chord, "G");

        let untagged = "```\n[{\"current_chord\":\"C\"}]\n```";
        assert_eq!(parse_observations(untagged).expect("parse")[0].current_chord, "C");
    }

    #[test]
    fn test_rejects_prose_and_non_arrays() {
        assert!(parse_observations("I could not read the chords.").is_err());
        assert!(parse_observations(r#"{"current_chord":"Am"}"#).is_err());
        assert!(parse_observations("").is_err());
        assert!(parse_observations("```json\n[{\"current_chord\": \n```").is_err());
    }

    #[test]
    fn test_rejects_wrong_field_types() {
        assert!(parse_observations(r#"[{"current_chord":"Am","progression":"Am F"}]"#).is_err());
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("ab", 3), "ab");
        assert_eq!(preview("和弦进行", 2), "和弦...");
    }
}
