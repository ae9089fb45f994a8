pub mod api;
pub mod core;
pub mod models;

pub use crate::core::config::{ExtractionConfig, RegionOfInterest};
pub use crate::core::error::ChordError;

/// 初始化 env_logger，默认 info 级别，可用 RUST_LOG 覆盖。重复调用无副作用
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .try_init();
}
