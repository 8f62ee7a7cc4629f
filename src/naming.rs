//! Timestamped, collision-free clip file names.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Deserialize;

use crate::error::{ClipError, ClipResult, ConfigError};

/// Number of `_NN` suffixes tried before giving up.
pub const MAX_ATTEMPTS: u32 = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "TimestampRepr")]
pub enum TimestampMode {
    /// Wall clock, UTC
    #[default]
    Utc,
    /// Wall clock, local time zone
    Local,
    /// Stream time since the first cycle
    FromStart,
}

impl TimestampMode {
    pub const ALL: [TimestampMode; 3] =
        [TimestampMode::Utc, TimestampMode::Local, TimestampMode::FromStart];

    /// Legacy numeric option (1 = GMT, 2 = local, 3 = from start).
    pub fn from_code(code: i64) -> Result<Self, ConfigError> {
        usize::try_from(code - 1)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(ConfigError::UnknownTimestampMode(code))
    }

    pub fn name(self) -> &'static str {
        match self {
            TimestampMode::Utc => "utc",
            TimestampMode::Local => "local",
            TimestampMode::FromStart => "from-start",
        }
    }
}

impl fmt::Display for TimestampMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimestampMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<i64>() {
            return Self::from_code(code);
        }
        match s.to_ascii_lowercase().as_str() {
            "utc" | "gmt" => Ok(TimestampMode::Utc),
            "local" => Ok(TimestampMode::Local),
            "from-start" | "relative" => Ok(TimestampMode::FromStart),
            _ => Err(ConfigError::UnknownName {
                kind: "time stamp option",
                name: s.to_string(),
            }),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampRepr {
    Code(i64),
    Name(String),
}

impl TryFrom<TimestampRepr> for TimestampMode {
    type Error = ConfigError;

    fn try_from(repr: TimestampRepr) -> Result<Self, Self::Error> {
        match repr {
            TimestampRepr::Code(code) => Self::from_code(code),
            TimestampRepr::Name(name) => name.parse(),
        }
    }
}

/// Where in the stream a clip starts, for stream-relative time stamps.
#[derive(Clone, Copy, Debug)]
pub struct StreamPosition {
    pub cycle: u64,
    pub buffer_size: usize,
    /// Offset of the clip within the cycle's window
    pub start: usize,
    pub sample_rate: f64,
}

impl StreamPosition {
    pub fn seconds(&self) -> f64 {
        (self.cycle as f64 * self.buffer_size as f64 + self.start as f64) / self.sample_rate
    }
}

/// Time stamp text inserted between the base name and the `_NN` suffix.
///
/// Wall-clock stamps look like `_1998-09-23_14.05.09`, stream-relative
/// ones like `_001.02.03` (hours, minutes, seconds).
pub fn timestamp(mode: TimestampMode, now: DateTime<Utc>, position: &StreamPosition) -> String {
    match mode {
        TimestampMode::Utc => wall_clock(&now),
        TimestampMode::Local => wall_clock(&now.with_timezone(&Local)),
        TimestampMode::FromStart => elapsed(position.seconds()),
    }
}

fn wall_clock<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    time.format("_%Y-%m-%d_%H.%M.%S").to_string()
}

fn elapsed(seconds: f64) -> String {
    let hours = (seconds / 3600.0).floor();
    let rest = seconds - 3600.0 * hours;
    let minutes = (rest / 60.0).floor();
    let rest = rest - 60.0 * minutes;
    let secs = rest.floor();
    format!("_{:03}.{:02}.{:02}", hours as i64, minutes as i64, secs as i64)
}

/// First `<dir>/<base><stamp>_NN<suffix>` that does not exist yet.
pub fn unique_path(dir: &Path, base: &str, stamp: &str, suffix: &str) -> ClipResult<PathBuf> {
    let stem = format!("{}{}", base, stamp);

    for n in 0..MAX_ATTEMPTS {
        let candidate = dir.join(format!("{}_{:02}{}", stem, n, suffix));
        match candidate.try_exists() {
            Ok(false) => return Ok(candidate),
            Ok(true) => log::debug!("Clip file {} exists, trying next suffix", candidate.display()),
            Err(source) => {
                return Err(ClipError::Probe {
                    path: candidate,
                    source,
                })
            }
        }
    }

    Err(ClipError::FilenameExhausted { stem: dir.join(stem) })
}
