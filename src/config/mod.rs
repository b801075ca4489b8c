//! Configuration module
//!
//! Detector thresholds and default evasion tuning, loadable from JSON.

pub mod settings;

pub use settings::{ConfigError, Settings};
