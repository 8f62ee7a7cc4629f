//! Gate-driven clip detection and archival.
//!
//! A [`ClipSaver`] is fed one overlapping window of multi-channel samples
//! and one of gate values per cycle. Every closed run of non-zero gate
//! values becomes one file in the configured [`ClipFormat`], named after
//! a base name, a time stamp and a two-digit disambiguator.

pub mod codec;
pub mod config;
pub mod detector;
pub mod error;
pub mod fifo;
pub mod format;
pub mod gate;
pub mod naming;
pub mod old_bird;
pub mod saver;
pub mod window;

pub use config::{ClipConfig, ErrorPolicy};
pub use detector::{find_clips, ClipInterval, DetectorState};
pub use error::{ClipError, ClipResult, ConfigError};
pub use fifo::OverlapFifo;
pub use format::{Clip, ClipFormat, ClipWriter};
pub use naming::TimestampMode;
pub use old_bird::{DetectorPreset, DetectorSettings, OldBirdDetector, Transient};
pub use saver::{ClipSaver, CycleReport, SavedClip};
pub use window::{ChannelOrder, GateWindow, SampleWindow};
