//! Old Bird Tseep and Thrush nocturnal flight call detectors.
//!
//! The signal is band-pass filtered, squared and averaged over a sliding
//! window. The ratio of the average power to the power `delay` seconds
//! earlier is compared with a threshold and its inverse; outward crossings
//! drive a [`TransientFinder`]. Each transient, with some lead-in, becomes
//! a stretch of open gate.

mod firls;
mod transient;

pub use firls::firls;
pub use transient::{Crossing, Transient, TransientFinder};

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// Built-in detector tunings, all for 22050 Hz input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectorPreset {
    /// Thin high calls, 6-10 kHz
    #[default]
    Tseep,
    /// Lower thrush calls, 2.8-5 kHz
    Thrush,
}

impl DetectorPreset {
    pub fn name(self) -> &'static str {
        match self {
            DetectorPreset::Tseep => "tseep",
            DetectorPreset::Thrush => "thrush",
        }
    }

    pub fn settings(self) -> DetectorSettings {
        match self {
            DetectorPreset::Tseep => DetectorSettings {
                f0: 6000.0,
                f1: 10000.0,
                bw: 100.0,
                filter_length: 100,
                integration_time: 2000,
                delay: 0.02,
                threshold: 2.0,
                min_duration: 0.1,
                max_duration: 0.4,
                initial_padding: 3000,
            },
            DetectorPreset::Thrush => DetectorSettings {
                f0: 2800.0,
                f1: 5000.0,
                bw: 100.0,
                filter_length: 100,
                integration_time: 4000,
                delay: 0.02,
                threshold: 1.3,
                min_duration: 0.1,
                max_duration: 0.4,
                initial_padding: 5000,
            },
        }
    }
}

impl fmt::Display for DetectorPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DetectorPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tseep" => Ok(DetectorPreset::Tseep),
            "thrush" => Ok(DetectorPreset::Thrush),
            _ => Err(ConfigError::UnknownName {
                kind: "detector",
                name: s.to_string(),
            }),
        }
    }
}

/// Detector parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorSettings {
    /// Lower pass band edge, Hz
    pub f0: f64,
    /// Upper pass band edge, Hz
    pub f1: f64,
    /// Transition band width, Hz
    pub bw: f64,
    /// Band-pass filter taps
    pub filter_length: usize,
    /// Power averaging window, samples
    pub integration_time: usize,
    /// Power ratio delay, seconds
    pub delay: f64,
    /// Power ratio threshold; its inverse ends a transient
    pub threshold: f64,
    /// Seconds
    pub min_duration: f64,
    /// Seconds
    pub max_duration: f64,
    /// Samples of lead-in before each transient
    pub initial_padding: usize,
}

impl DetectorSettings {
    /// Longest gate run one transient can produce, in samples.
    pub fn max_clip_len(&self, sample_rate: f64) -> usize {
        (self.max_duration * sample_rate).floor() as usize + self.initial_padding
    }

    fn band_pass(&self, sample_rate: f64) -> Result<Vec<f64>, ConfigError> {
        let nyquist = sample_rate / 2.0;
        let (low, high) = (self.f0 - self.bw, self.f1 + self.bw);
        if !(low > 0.0 && self.f0 < self.f1 && high < nyquist) {
            return Err(ConfigError::DetectorBand { low, high, nyquist });
        }
        let bands = [
            (0.0, low / nyquist),
            (self.f0 / nyquist, self.f1 / nyquist),
            (high / nyquist, 1.0),
        ];
        firls(self.filter_length, &bands, &[0.0, 1.0, 0.0])
    }
}

/// Streaming detector over one channel.
///
/// Samples may be fed in blocks of any size; the crossings found are the
/// same as for a single call over the whole input.
pub struct OldBirdDetector {
    coefficients: Vec<f64>,
    inputs: VecDeque<f64>,
    powers: VecDeque<f64>,
    power_sum: f64,
    since_resum: usize,
    integration_time: usize,
    averages: VecDeque<f64>,
    delay: usize,
    threshold: f64,
    last_mark: Option<f64>,
    processed: usize,
    finder: TransientFinder,
}

impl OldBirdDetector {
    pub fn new(settings: &DetectorSettings, sample_rate: f64) -> Result<Self, ConfigError> {
        if settings.integration_time == 0 {
            return Err(ConfigError::DetectorSetting("integration time must be positive"));
        }
        if !(settings.threshold > 0.0) {
            return Err(ConfigError::DetectorSetting("threshold must be positive"));
        }
        if settings.max_duration < settings.min_duration {
            return Err(ConfigError::DetectorSetting("maximum duration is below minimum"));
        }
        let delay = (settings.delay * sample_rate).floor() as usize;
        if delay == 0 {
            return Err(ConfigError::DetectorSetting("delay is shorter than one sample"));
        }

        let coefficients = settings.band_pass(sample_rate)?;
        log::debug!(
            "Old Bird detector: {} taps, {} Hz - {} Hz, delay {} samples",
            coefficients.len(),
            settings.f0,
            settings.f1,
            delay
        );

        Ok(Self {
            inputs: VecDeque::with_capacity(coefficients.len()),
            coefficients,
            powers: VecDeque::with_capacity(settings.integration_time),
            power_sum: 0.0,
            since_resum: 0,
            integration_time: settings.integration_time,
            averages: VecDeque::with_capacity(delay + 1),
            delay,
            threshold: settings.threshold,
            last_mark: None,
            processed: 0,
            finder: TransientFinder::from_durations(
                settings.min_duration,
                settings.max_duration,
                sample_rate,
            ),
        })
    }

    pub fn samples_processed(&self) -> usize {
        self.processed
    }

    /// Feed the next samples and return the transients that closed.
    pub fn detect(&mut self, samples: &[f64]) -> Vec<Transient> {
        let mut transients = Vec::new();
        for &x in samples {
            if let Some(crossing) = self.next_sample(x) {
                transients.extend(self.finder.process(crossing));
            }
        }
        transients
    }

    /// Close a transient still open at the end of the input.
    pub fn complete_detection(&mut self) -> Option<Transient> {
        self.finder.process(Crossing::Fall(self.processed))
    }

    fn next_sample(&mut self, x: f64) -> Option<Crossing> {
        let t = self.processed;
        self.processed += 1;

        // band-pass
        if self.inputs.len() == self.coefficients.len() {
            self.inputs.pop_front();
        }
        self.inputs.push_back(x);
        if self.inputs.len() < self.coefficients.len() {
            return None;
        }
        let filtered: f64 = self
            .coefficients
            .iter()
            .zip(self.inputs.iter().rev())
            .map(|(h, x)| h * x)
            .sum();

        // square and average
        let power = filtered * filtered;
        self.powers.push_back(power);
        self.power_sum += power;
        if self.powers.len() > self.integration_time {
            if let Some(old) = self.powers.pop_front() {
                self.power_sum -= old;
            }
        }
        self.since_resum += 1;
        if self.since_resum >= self.integration_time {
            // running sums drift, refresh from the window now and then
            self.power_sum = self.powers.iter().sum();
            self.since_resum = 0;
        }
        if self.powers.len() < self.integration_time {
            return None;
        }
        let average = self.power_sum / self.integration_time as f64;

        // ratio against the average `delay` samples back
        self.averages.push_back(average);
        if self.averages.len() > self.delay + 1 {
            self.averages.pop_front();
        }
        if self.averages.len() < self.delay + 1 {
            return None;
        }
        let ratio = average / self.averages[0];

        let mark = if ratio > self.threshold {
            1.0
        } else if ratio < 1.0 / self.threshold {
            -2.0
        } else {
            0.0
        };
        let step = self.last_mark.replace(mark).map(|last| mark - last)?;

        // crossings are reported against the sample before the current one
        if step == 1.0 {
            Some(Crossing::Rise(t - 1))
        } else if step == -2.0 {
            Some(Crossing::Fall(t - 1))
        } else {
            None
        }
    }
}

/// Gate with every padded transient open, `frames` long.
pub fn transient_gate(transients: &[Transient], frames: usize, padding: usize) -> Vec<f64> {
    let mut gate = vec![0.0; frames];
    for transient in transients {
        let range = transient.padded(padding);
        let end = range.end.min(frames);
        if range.start < end {
            gate[range.start..end].fill(1.0);
        }
    }
    gate
}
