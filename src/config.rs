use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::format::ClipFormat;
use crate::naming::TimestampMode;
use crate::old_bird::{DetectorPreset, DetectorSettings};
use crate::window::ChannelOrder;

/// What to do when a single clip cannot be saved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Log the failure, drop the clip and keep detecting
    #[default]
    Skip,
    /// Stop the cycle and return the error
    Abort,
}

impl FromStr for ErrorPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(ErrorPolicy::Skip),
            "abort" => Ok(ErrorPolicy::Abort),
            _ => Err(ConfigError::UnknownName {
                kind: "error policy",
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorPolicy::Skip => "skip",
            ErrorPolicy::Abort => "abort",
        })
    }
}

/// Settings of one clip-and-save stage, fixed for the whole run.
#[derive(Clone, Debug, Deserialize)]
pub struct ClipConfig {
    /// New slots per cycle
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Slots per window, look-back included
    #[serde(default = "default_fifo_size")]
    pub fifo_size: usize,
    #[serde(default = "default_channels")]
    pub channels: usize,
    #[serde(default)]
    pub column_major: bool,
    #[serde(default = "default_base_name")]
    pub base_name: String,
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,
    #[serde(default)]
    pub format: ClipFormat,
    #[serde(default)]
    pub timestamp: TimestampMode,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            fifo_size: default_fifo_size(),
            channels: default_channels(),
            column_major: false,
            base_name: default_base_name(),
            save_dir: default_save_dir(),
            format: ClipFormat::default(),
            timestamp: TimestampMode::default(),
            sample_rate: default_sample_rate(),
            on_error: ErrorPolicy::default(),
        }
    }
}

impl ClipConfig {
    pub fn order(&self) -> ChannelOrder {
        ChannelOrder::from_column_major(self.column_major)
    }

    /// Slots each window repeats from the previous cycle.
    pub fn overlap(&self) -> usize {
        self.fifo_size.saturating_sub(self.buffer_size)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::BufferSize);
        }
        if self.fifo_size < self.buffer_size {
            return Err(ConfigError::FifoSize {
                fifo: self.fifo_size,
                buffer: self.buffer_size,
            });
        }
        if self.channels == 0 {
            return Err(ConfigError::Channels);
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::SampleRate(self.sample_rate));
        }
        if self.base_name.is_empty() {
            return Err(ConfigError::EmptyBaseName);
        }
        if let Some(max) = self.format.writer().max_channels() {
            if self.channels > max {
                return Err(ConfigError::UnsupportedChannelCount {
                    format: self.format.name(),
                    channels: self.channels,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Gate computed from the input itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateSource {
    /// Old Bird flight call detector on the first channel
    #[default]
    OldBird,
    /// Absolute level over all channels
    Level,
}

impl FromStr for GateSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "old-bird" | "oldbird" => Ok(GateSource::OldBird),
            "level" => Ok(GateSource::Level),
            _ => Err(ConfigError::UnknownName {
                kind: "gate source",
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for GateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GateSource::OldBird => "old-bird",
            GateSource::Level => "level",
        })
    }
}

/// How the command-line driver derives the gate stream.
#[derive(Clone, Debug, Deserialize)]
pub struct GateConfig {
    /// Used unless `channel` or `file` is set
    #[serde(default)]
    pub source: GateSource,
    #[serde(default)]
    pub detector: DetectorPreset,
    /// Replaces the preset's power ratio threshold
    #[serde(default)]
    pub detector_threshold: Option<f64>,
    /// Level at which the level gate opens
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Frames the gate stays open after the level drops
    #[serde(default)]
    pub release: usize,
    /// Take the gate from this input channel instead of the level
    #[serde(default)]
    pub channel: Option<usize>,
    /// Take the gate from the first channel of this file instead of the level
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            source: GateSource::default(),
            detector: DetectorPreset::default(),
            detector_threshold: None,
            threshold: default_threshold(),
            release: 0,
            channel: None,
            file: None,
        }
    }
}

impl GateConfig {
    /// Preset settings with the configured overrides applied.
    pub fn detector_settings(&self) -> DetectorSettings {
        let mut settings = self.detector.settings();
        if let Some(threshold) = self.detector_threshold {
            settings.threshold = threshold;
        }
        settings
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub clip: ClipConfig,
    #[serde(default)]
    pub gate: GateConfig,
}

fn default_buffer_size() -> usize { 1024 }
fn default_fifo_size() -> usize { 8192 }
fn default_channels() -> usize { 1 }
fn default_base_name() -> String { "clip".into() }
fn default_save_dir() -> PathBuf { PathBuf::from(".") }
fn default_sample_rate() -> f64 { 22050.0 }
fn default_threshold() -> f64 { 0.1 }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("Invalid config {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ClipConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.overlap(), 8192 - 1024);
        assert_eq!(config.order(), ChannelOrder::Interleaved);
    }

    #[test]
    fn validation_rules() {
        let base = ClipConfig::default();

        let c = ClipConfig { buffer_size: 0, ..base.clone() };
        assert_eq!(c.validate(), Err(ConfigError::BufferSize));

        let c = ClipConfig { buffer_size: 16, fifo_size: 8, ..base.clone() };
        assert_eq!(c.validate(), Err(ConfigError::FifoSize { fifo: 8, buffer: 16 }));

        let c = ClipConfig { channels: 0, ..base.clone() };
        assert_eq!(c.validate(), Err(ConfigError::Channels));

        let c = ClipConfig { sample_rate: 0.0, ..base.clone() };
        assert!(matches!(c.validate(), Err(ConfigError::SampleRate(_))));

        let c = ClipConfig { base_name: String::new(), ..base.clone() };
        assert_eq!(c.validate(), Err(ConfigError::EmptyBaseName));

        let c = ClipConfig { fifo_size: 1024, ..base };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn aiff_channel_limit_is_a_config_error() {
        let config = ClipConfig {
            format: ClipFormat::Aiff,
            channels: 3,
            ..ClipConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedChannelCount { channels: 3, max: 2, .. })
        ));

        let stereo = ClipConfig { channels: 2, ..config };
        assert!(stereo.validate().is_ok());
    }

    #[test]
    fn parses_toml_with_names_and_codes() {
        let config: Config = toml::from_str(
            r#"
            [clip]
            buffer_size = 256
            fifo_size = 1024
            channels = 2
            column_major = true
            base_name = "tseep"
            save_dir = "/tmp/clips"
            format = "aiff"
            timestamp = 3
            sample_rate = 22050
            on_error = "abort"

            [gate]
            source = "level"
            threshold = 0.25
            release = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.clip.buffer_size, 256);
        assert_eq!(config.clip.order(), ChannelOrder::ChannelMajor);
        assert_eq!(config.clip.format, ClipFormat::Aiff);
        assert_eq!(config.clip.timestamp, TimestampMode::FromStart);
        assert_eq!(config.clip.sample_rate, 22050.0);
        assert_eq!(config.clip.on_error, ErrorPolicy::Abort);
        assert_eq!(config.gate.source, GateSource::Level);
        assert_eq!(config.gate.release, 100);
        assert!(config.gate.channel.is_none());
    }

    #[test]
    fn detector_preset_and_threshold_override() {
        let config: Config = toml::from_str(
            "[gate]\ndetector = \"thrush\"\ndetector_threshold = 1.5\n",
        )
        .unwrap();
        assert_eq!(config.gate.source, GateSource::OldBird);
        assert_eq!(config.gate.detector, DetectorPreset::Thrush);

        let settings = config.gate.detector_settings();
        assert_eq!(settings.threshold, 1.5);
        assert_eq!(settings.integration_time, 4000);
        assert_eq!(settings.initial_padding, 5000);

        assert!(toml::from_str::<Config>("[gate]\ndetector = \"robin\"\n").is_err());
        assert_eq!("Level".parse::<GateSource>().unwrap(), GateSource::Level);
    }

    #[test]
    fn numeric_format_code_in_toml() {
        let config: Config = toml::from_str("[clip]\nformat = 3\n").unwrap();
        assert_eq!(config.clip.format, ClipFormat::Matlab);
        assert!(toml::from_str::<Config>("[clip]\nformat = 12\n").is_err());
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.clip.buffer_size, 1024);
        assert_eq!(config.gate.threshold, 0.1);
        assert_eq!(config.gate.source, GateSource::OldBird);
        assert_eq!(config.gate.detector, DetectorPreset::Tseep);
        assert_eq!(config.gate.detector_settings().threshold, 2.0);
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateclip.toml");
        std::fs::write(&path, "[clip]\nbase_name = \"night\"\n").unwrap();
        assert_eq!(load_config(&path).unwrap().clip.base_name, "night");

        std::fs::write(&path, "[clip\n").unwrap();
        assert!(load_config(&path).is_none());
        assert!(load_config(&dir.path().join("missing.toml")).is_none());
    }
}
