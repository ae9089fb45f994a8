pub mod chart;
pub mod config;
pub mod error;
pub mod video;
pub mod vision;
