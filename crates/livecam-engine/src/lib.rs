//! livecam-engine — Frame analysis on a dedicated worker thread.
//!
//! Camera frames are offered through a keep-only-latest slot; the worker
//! converts each one to BGR, rotates it upright, hands it to a
//! [`FrameAnalyzer`] and returns the result as an owned value.

pub mod config;
pub mod engine;

pub use config::{ConfigError, EngineConfig};
pub use engine::{spawn_engine, AnalysisResult, EngineError, EngineHandle, EngineStats, FrameAnalyzer};
