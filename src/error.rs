//! Error types for clip detection and saving

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while saving a single clip
#[derive(Error, Debug)]
pub enum ClipError {
    /// Output file could not be created
    #[error("Error creating clip file {}: {source}", path.display())]
    FileCreate { path: PathBuf, source: io::Error },

    /// Header or payload could not be written completely
    #[error("Error writing clip file {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    /// Existence probe for a candidate file name failed
    #[error("Error probing clip file name {}: {source}", path.display())]
    Probe { path: PathBuf, source: io::Error },

    /// Format cannot hold this many channels
    #[error("Clip format can only save up to {max} channels, got {channels}")]
    UnsupportedChannelCount { channels: usize, max: usize },

    /// Every collision-avoidance suffix is already taken
    #[error("No free clip file name for {}", stem.display())]
    FilenameExhausted { stem: PathBuf },

    /// Sample or gate buffer does not match the configured widths
    #[error("Buffer size mismatch: expected {expected} values, got {actual}")]
    BufferMismatch { expected: usize, actual: usize },
}

/// Errors found while validating a configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Buffer size must be positive")]
    BufferSize,

    #[error("FIFO size ({fifo}) must not be smaller than buffer size ({buffer})")]
    FifoSize { fifo: usize, buffer: usize },

    #[error("Number of channels must be positive")]
    Channels,

    #[error("Sample rate must be positive and finite, got {0}")]
    SampleRate(f64),

    #[error("Base file name must not be empty")]
    EmptyBaseName,

    #[error("Unrecognized file type code {0}")]
    UnknownFormat(i64),

    #[error("Unrecognized time stamp option code {0}")]
    UnknownTimestampMode(i64),

    #[error("Unrecognized {kind} '{name}'")]
    UnknownName { kind: &'static str, name: String },

    #[error("{format} clip files can only save up to {max} channels, got {channels}")]
    UnsupportedChannelCount {
        format: &'static str,
        channels: usize,
        max: usize,
    },

    /// Least-squares band design has no solution for these bands
    #[error("Cannot design a {taps}-tap band-pass filter for these bands")]
    FilterDesign { taps: usize },

    #[error("Detector band {low}-{high} Hz does not fit below Nyquist ({nyquist} Hz)")]
    DetectorBand { low: f64, high: f64, nyquist: f64 },

    #[error("Invalid detector setting: {0}")]
    DetectorSetting(&'static str),
}

/// Result type for clip operations
pub type ClipResult<T> = Result<T, ClipError>;
