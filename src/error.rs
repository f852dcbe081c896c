//! Error types for the engine and preset layers

use thiserror::Error;

/// Errors reported by `ReverbEngine` entry points.
///
/// None of these are fatal: the engine leaves the buffer as dry passthrough
/// and keeps its state intact.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("engine has not been prepared")]
    NotPrepared,

    #[error("unsupported channel count {0} (mono or stereo only)")]
    UnsupportedChannelCount(usize),

    #[error("block of {len} samples exceeds prepared maximum of {max}")]
    BlockTooLarge { len: usize, max: usize },

    #[error("expected {expected} channels, got {got}")]
    ChannelMismatch { expected: usize, got: usize },

    #[error("interleaved buffer of {len} samples is not a whole number of {channels}-channel frames")]
    PartialFrame { len: usize, channels: usize },

    #[error("invalid sample rate {0}")]
    InvalidSampleRate(f64),

    #[error("invalid block size {0}")]
    InvalidBlockSize(usize),
}

/// Errors from saving or loading a preset document.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed preset: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("preset has no parameters object")]
    MissingParameters,
}
