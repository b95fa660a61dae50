//! Shared utilities for trusted introductions.

pub mod logging;

pub use logging::{init_logging, LogFormat, UnknownLogFormat};
