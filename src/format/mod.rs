//! Clip file formats.
//!
//! Every writer reads the same rectangular region of a [`SampleWindow`]
//! through [`Clip`] and differs only in how it lays samples out on disk.

mod aiff;
mod ascii;
mod mat;
mod raw;
mod wave;

pub use aiff::AiffWriter;
pub use ascii::{AsciiFixedWriter, AsciiFloatWriter};
pub use mat::MatWriter;
pub use raw::{BinaryFixedWriter, BinaryFloatWriter, MacBinaryWriter};
pub use wave::WaveWriter;

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::codec::{byteswap16, byteswap32};
use crate::detector::ClipInterval;
use crate::error::{ClipError, ClipResult, ConfigError};
use crate::window::{ChannelOrder, SampleWindow};

/// Output file format of saved clips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "FormatRepr")]
pub enum ClipFormat {
    /// RIFF WAVE, 16-bit little-endian PCM
    #[default]
    Wave,
    /// Headerless 16-bit big-endian, channel-major
    MacBinary,
    /// Level 1.0 MAT file with `soundData` and `fs`
    Matlab,
    AsciiFloat,
    AsciiFixed,
    /// Headerless native-endian f64
    BinaryFloat,
    /// Headerless native-endian i16
    BinaryFixed,
    /// AIFF, 16-bit big-endian PCM, at most two channels
    Aiff,
}

impl ClipFormat {
    pub const ALL: [ClipFormat; 8] = [
        ClipFormat::Wave,
        ClipFormat::MacBinary,
        ClipFormat::Matlab,
        ClipFormat::AsciiFloat,
        ClipFormat::AsciiFixed,
        ClipFormat::BinaryFloat,
        ClipFormat::BinaryFixed,
        ClipFormat::Aiff,
    ];

    /// Legacy numeric file type code (1 = WAVE ... 8 = AIFF).
    pub fn from_code(code: i64) -> Result<Self, ConfigError> {
        usize::try_from(code - 1)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(ConfigError::UnknownFormat(code))
    }

    pub fn name(self) -> &'static str {
        match self {
            ClipFormat::Wave => "wave",
            ClipFormat::MacBinary => "mac-binary",
            ClipFormat::Matlab => "matlab",
            ClipFormat::AsciiFloat => "ascii-float",
            ClipFormat::AsciiFixed => "ascii-fixed",
            ClipFormat::BinaryFloat => "binary-float",
            ClipFormat::BinaryFixed => "binary-fixed",
            ClipFormat::Aiff => "aiff",
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            ClipFormat::Wave => ".wav",
            ClipFormat::MacBinary => ".mac",
            ClipFormat::Matlab => ".mat",
            ClipFormat::AsciiFloat | ClipFormat::AsciiFixed => ".txt",
            ClipFormat::BinaryFloat => ".flt",
            ClipFormat::BinaryFixed => ".bin",
            ClipFormat::Aiff => ".aif",
        }
    }

    /// Writer for this format, chosen once per configuration.
    pub fn writer(self) -> Box<dyn ClipWriter> {
        match self {
            ClipFormat::Wave => Box::new(WaveWriter),
            ClipFormat::MacBinary => Box::new(MacBinaryWriter),
            ClipFormat::Matlab => Box::new(MatWriter),
            ClipFormat::AsciiFloat => Box::new(AsciiFloatWriter),
            ClipFormat::AsciiFixed => Box::new(AsciiFixedWriter),
            ClipFormat::BinaryFloat => Box::new(BinaryFloatWriter),
            ClipFormat::BinaryFixed => Box::new(BinaryFixedWriter),
            ClipFormat::Aiff => Box::new(AiffWriter),
        }
    }
}

impl fmt::Display for ClipFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClipFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<i64>() {
            return Self::from_code(code);
        }
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownName {
                kind: "file type",
                name: s.to_string(),
            })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FormatRepr {
    Code(i64),
    Name(String),
}

impl TryFrom<FormatRepr> for ClipFormat {
    type Error = ConfigError;

    fn try_from(repr: FormatRepr) -> Result<Self, Self::Error> {
        match repr {
            FormatRepr::Code(code) => Self::from_code(code),
            FormatRepr::Name(name) => name.parse(),
        }
    }
}

/// One detected clip: an interval of a sample window plus its sample rate.
#[derive(Clone, Copy, Debug)]
pub struct Clip<'a> {
    window: SampleWindow<'a>,
    interval: ClipInterval,
    sample_rate: f64,
}

impl<'a> Clip<'a> {
    pub fn new(window: SampleWindow<'a>, interval: ClipInterval, sample_rate: f64) -> Self {
        debug_assert!(interval.start < interval.end && interval.end <= window.fifo_width());
        Self {
            window,
            interval,
            sample_rate,
        }
    }

    pub fn frames(&self) -> usize {
        self.interval.len()
    }

    pub fn channels(&self) -> usize {
        self.window.channels()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Channel order of the buffer the clip was cut from.
    pub fn input_order(&self) -> ChannelOrder {
        self.window.order()
    }

    #[inline]
    pub fn sample(&self, channel: usize, frame: usize) -> f64 {
        self.window.sample(channel, self.interval.start + frame)
    }

    /// All samples of the clip, laid out in `layout` order.
    pub fn samples(&self, layout: ChannelOrder) -> impl Iterator<Item = f64> + '_ {
        let frames = self.frames();
        let channels = self.channels();
        (0..frames * channels).map(move |i| match layout {
            ChannelOrder::Interleaved => self.sample(i % channels, i / channels),
            ChannelOrder::ChannelMajor => self.sample(i / frames, i % frames),
        })
    }

    /// One iterator per time slot over that slot's channels.
    pub fn rows(&self) -> impl Iterator<Item = impl Iterator<Item = f64> + '_> + '_ {
        (0..self.frames()).map(move |t| (0..self.channels()).map(move |c| self.sample(c, t)))
    }
}

/// Serializes a clip into one self-contained file.
pub trait ClipWriter {
    /// Largest channel count the format can hold, if limited.
    fn max_channels(&self) -> Option<usize> {
        None
    }

    fn write(&self, out: &mut dyn Write, clip: &Clip<'_>) -> io::Result<()>;
}

/// Create `path`, write `clip` with `writer`, and close the file.
///
/// A partially written file is removed before the error is returned.
pub fn save(path: &Path, writer: &dyn ClipWriter, clip: &Clip<'_>) -> ClipResult<()> {
    if let Some(max) = writer.max_channels() {
        if clip.channels() > max {
            return Err(ClipError::UnsupportedChannelCount {
                channels: clip.channels(),
                max,
            });
        }
    }

    let file = File::create(path).map_err(|source| ClipError::FileCreate {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);

    let result = writer.write(&mut out, clip).and_then(|()| out.flush());
    drop(out);

    if let Err(source) = result {
        if let Err(e) = fs::remove_file(path) {
            log::debug!("Could not remove partial clip file {}: {}", path.display(), e);
        }
        return Err(ClipError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

pub(crate) fn write_u16_be(out: &mut dyn Write, x: u16) -> io::Result<()> {
    out.write_all(&byteswap16(x).to_le_bytes())
}

pub(crate) fn write_u32_be(out: &mut dyn Write, x: u32) -> io::Result<()> {
    out.write_all(&byteswap32(x).to_le_bytes())
}


#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;

    #[test]
    fn codes_and_names_round_trip() {
        for (i, format) in ClipFormat::ALL.iter().enumerate() {
            assert_eq!(ClipFormat::from_code(i as i64 + 1).unwrap(), *format);
            assert_eq!(format.name().parse::<ClipFormat>().unwrap(), *format);
        }
        assert_eq!("3".parse::<ClipFormat>().unwrap(), ClipFormat::Matlab);
        assert!(ClipFormat::from_code(0).is_err());
        assert!(ClipFormat::from_code(9).is_err());
        assert!("flac".parse::<ClipFormat>().is_err());
    }

    #[test]
    fn suffixes() {
        assert_eq!(ClipFormat::Wave.suffix(), ".wav");
        assert_eq!(ClipFormat::AsciiFixed.suffix(), ".txt");
        assert_eq!(ClipFormat::Aiff.suffix(), ".aif");
    }

    #[test]
    fn clip_iterates_sub_range_in_either_layout() {
        for order in [ChannelOrder::Interleaved, ChannelOrder::ChannelMajor] {
            let data = stereo(order);
            let window = SampleWindow::new(&data, 4, 2, order).unwrap();
            let clip = Clip::new(window, ClipInterval { start: 1, end: 3 }, 8000.0);

            let interleaved: Vec<f64> = clip.samples(ChannelOrder::Interleaved).collect();
            assert_eq!(interleaved, vec![0.25, -0.25, 0.5, -0.5]);

            let channel_major: Vec<f64> = clip.samples(ChannelOrder::ChannelMajor).collect();
            assert_eq!(channel_major, vec![0.25, 0.5, -0.25, -0.5]);

            let rows: Vec<Vec<f64>> = clip.rows().map(|r| r.collect()).collect();
            assert_eq!(rows, vec![vec![0.25, -0.25], vec![0.5, -0.5]]);
        }
    }

    #[test]
    fn save_rejects_too_many_channels_before_creating_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.aif");
        let data = [0.0; 6];
        let window = SampleWindow::new(&data, 2, 3, ChannelOrder::Interleaved).unwrap();
        let clip = Clip::new(window, ClipInterval { start: 0, end: 2 }, 8000.0);

        let err = save(&path, &AiffWriter, &clip).unwrap_err();
        assert!(matches!(err, ClipError::UnsupportedChannelCount { channels: 3, max: 2 }));
        assert!(!path.exists());
    }

    #[test]
    fn save_reports_create_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("clip.wav");
        let data = [0.0; 2];
        let window = SampleWindow::new(&data, 2, 1, ChannelOrder::Interleaved).unwrap();
        let clip = Clip::new(window, ClipInterval { start: 0, end: 2 }, 8000.0);

        let err = save(&path, &WaveWriter, &clip).unwrap_err();
        assert!(matches!(err, ClipError::FileCreate { .. }));
    }

    /// Writes a header's worth of bytes, then runs out of space.
    struct DiskFull;

    impl ClipWriter for DiskFull {
        fn write(&self, out: &mut dyn Write, _clip: &Clip<'_>) -> io::Result<()> {
            // larger than the BufWriter buffer, so bytes reach the file
            out.write_all(&[0x55; 16 * 1024])?;
            Err(io::Error::other("disk full"))
        }
    }

    #[test]
    fn save_removes_partial_file_on_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let data = [0.5; 4];
        let window = SampleWindow::new(&data, 4, 1, ChannelOrder::Interleaved).unwrap();
        let clip = Clip::new(window, ClipInterval { start: 0, end: 4 }, 8000.0);

        match save(&path, &DiskFull, &clip) {
            Err(ClipError::Write { path: failed, source }) => {
                assert_eq!(failed, path);
                assert_eq!(source.to_string(), "disk full");
            }
            other => panic!("expected a write error, got {:?}", other),
        }
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn big_endian_helpers() {
        let mut out = Vec::new();
        write_u16_be(&mut out, 0x1234).unwrap();
        write_u32_be(&mut out, 0xDEAD_BEEF).unwrap();
        assert_eq!(out, vec![0x12, 0x34, 0xDE, 0xAD, 0xBE, 0xEF]);
    }
}
