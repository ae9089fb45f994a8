pub mod extractor;

pub use extractor::{ChordExtractor, ExtractionReport, ExtractionStats};
