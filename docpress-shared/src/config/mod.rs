//! # Configuration
//!
//! Client-side settings resolved from a file, `DOCPRESS_*` environment
//! variables, and built-in defaults.

pub mod client;

pub use client::{ClientConfig, ConfigError, LogFormat};
