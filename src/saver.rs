//! Per-cycle driver: detect closed gate runs and save each one as a file.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::config::{ClipConfig, ErrorPolicy};
use crate::detector::{find_clips, ClipInterval, DetectorState};
use crate::error::{ClipError, ClipResult, ConfigError};
use crate::format::{self, Clip, ClipWriter};
use crate::naming::{self, StreamPosition};
use crate::window::{GateWindow, SampleWindow};

/// A clip that made it to disk.
#[derive(Clone, Debug)]
pub struct SavedClip {
    pub path: PathBuf,
    /// Slot range within the cycle's window
    pub interval: ClipInterval,
    /// Cycle the clip was detected in
    pub cycle: u64,
}

impl SavedClip {
    pub fn frames(&self) -> usize {
        self.interval.len()
    }
}

/// Outcome of one [`ClipSaver::process`] call.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub saved: Vec<SavedClip>,
    /// Clips dropped under [`ErrorPolicy::Skip`]
    pub failed: usize,
}

pub struct ClipSaver {
    config: ClipConfig,
    writer: Box<dyn ClipWriter>,
    state: DetectorState,
}

impl ClipSaver {
    pub fn new(config: ClipConfig) -> Result<Self, ConfigError> {
        let writer = config.format.writer();
        Self::with_writer(config, writer)
    }

    /// Like [`ClipSaver::new`], but clips go through `writer` instead of
    /// the configured format's. The format still picks the file suffix.
    pub fn with_writer(
        config: ClipConfig,
        writer: Box<dyn ClipWriter>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.overlap() == 0 {
            log::warn!(
                "FIFO size equals buffer size; runs already high at the start of a buffer \
                 cannot be told apart from continuations and will be cut at the buffer edge"
            );
        }
        Ok(Self {
            config,
            writer,
            state: DetectorState::new(),
        })
    }

    pub fn config(&self) -> &ClipConfig {
        &self.config
    }

    /// Cycles processed so far.
    pub fn cycle(&self) -> u64 {
        self.state.cycle()
    }

    /// Run one cycle against the current wall clock.
    pub fn process(&mut self, samples: &[f64], gate: &[f64]) -> ClipResult<CycleReport> {
        self.process_at(Utc::now(), samples, gate)
    }

    /// Run one cycle. `samples` and `gate` are the full overlapping windows.
    ///
    /// The cycle counter advances exactly once per call that gets past the
    /// buffer size checks, including when a clip failure aborts the cycle.
    pub fn process_at(
        &mut self,
        now: DateTime<Utc>,
        samples: &[f64],
        gate: &[f64],
    ) -> ClipResult<CycleReport> {
        let width = self.config.fifo_size;
        let channels = self.config.channels;

        if gate.len() != width {
            return Err(ClipError::BufferMismatch {
                expected: width,
                actual: gate.len(),
            });
        }
        let window = SampleWindow::new(samples, width, channels, self.config.order()).ok_or(
            ClipError::BufferMismatch {
                expected: width * channels,
                actual: samples.len(),
            },
        )?;

        let intervals = find_clips(&GateWindow::new(gate), self.config.buffer_size);
        if !intervals.is_empty() {
            log::debug!("Cycle {}: clips at {:?}", self.state.cycle(), intervals);
        }

        let result = self.save_all(now, &window, &intervals);
        self.state.advance();
        result
    }

    fn save_all(
        &self,
        now: DateTime<Utc>,
        window: &SampleWindow<'_>,
        intervals: &[ClipInterval],
    ) -> ClipResult<CycleReport> {
        let mut report = CycleReport::default();

        for &interval in intervals {
            if interval.start == 0 && self.config.overlap() > 0 {
                log::warn!(
                    "Clip in cycle {} reaches the start of the look-back; \
                     it may have begun earlier",
                    self.state.cycle()
                );
            }

            match self.save_clip(now, window, interval) {
                Ok(path) => {
                    log::info!(
                        "Saved {} frame {} clip: {}",
                        interval.len(),
                        self.config.format,
                        path.display()
                    );
                    report.saved.push(SavedClip {
                        path,
                        interval,
                        cycle: self.state.cycle(),
                    });
                }
                Err(e) => match self.config.on_error {
                    ErrorPolicy::Abort => return Err(e),
                    ErrorPolicy::Skip => {
                        log::warn!("Skipping clip: {}", e);
                        report.failed += 1;
                    }
                },
            }
        }

        Ok(report)
    }

    fn save_clip(
        &self,
        now: DateTime<Utc>,
        window: &SampleWindow<'_>,
        interval: ClipInterval,
    ) -> ClipResult<PathBuf> {
        let position = StreamPosition {
            cycle: self.state.cycle(),
            buffer_size: self.config.buffer_size,
            start: interval.start,
            sample_rate: self.config.sample_rate,
        };
        let stamp = naming::timestamp(self.config.timestamp, now, &position);
        let path = naming::unique_path(
            &self.config.save_dir,
            &self.config.base_name,
            &stamp,
            self.config.format.suffix(),
        )?;

        let clip = Clip::new(*window, interval, self.config.sample_rate);
        format::save(&path, self.writer.as_ref(), &clip)?;
        Ok(path)
    }
}
