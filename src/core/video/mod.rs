pub mod diff_filter;
pub mod error;
pub mod frame;
pub mod sampler;

pub use diff_filter::{ChangeDetector, ChangeEvent, DetectionOutcome};
pub use error::FrameError;
pub use frame::{Frame, FrameSource, RegionSignature};
