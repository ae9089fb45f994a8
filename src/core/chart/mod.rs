//! 结果汇总：相邻去重、摘要、和弦谱输出

pub mod deduplicator;
pub mod format;
pub mod summary;

pub use deduplicator::deduplicate;
pub use format::{format_chord_chart, format_timestamp, ChordChart};
pub use summary::ChordSummary;
