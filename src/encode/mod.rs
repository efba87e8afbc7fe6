//! Frame sinks and the external video encoder.
//!
//! Sinks consume rendered frames in timeline order; the encoder turns a finished PNG sequence
//! into a playback-ready container.

/// System `ffmpeg` invocation.
pub mod ffmpeg;
/// Alpha flattening and PNG encoding.
pub mod png;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
