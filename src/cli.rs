use clap::Parser;
use std::path::PathBuf;

use gateclip::config::GateSource;
use gateclip::{ClipFormat, DetectorPreset, ErrorPolicy, TimestampMode};

#[derive(Parser, Debug)]
#[command(name = "gateclip", about = "Save gated stretches of an audio stream as clip files")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Path to config file (default: ./gateclip.toml or ~/.config/gateclip/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory the clips are written to
    #[arg(short = 'd', long)]
    pub save_dir: Option<PathBuf>,

    /// Leading part of every clip file name
    #[arg(short = 'n', long)]
    pub base_name: Option<String>,

    /// Clip format: wave, mac-binary, matlab, ascii-float, ascii-fixed,
    /// binary-float, binary-fixed, aiff (or 1-8)
    #[arg(short, long)]
    pub format: Option<ClipFormat>,

    /// File name time stamp: utc, local, from-start (or 1-3)
    #[arg(short, long)]
    pub timestamp: Option<TimestampMode>,

    /// New frames per processing cycle
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Frames per window, look-back included
    #[arg(long)]
    pub fifo_size: Option<usize>,

    /// Hand the saver channel-major windows instead of interleaved ones
    #[arg(long)]
    pub column_major: bool,

    /// Hand the saver interleaved windows, even if the config asks for channel-major
    #[arg(long, conflicts_with = "column_major")]
    pub interleaved: bool,

    /// On a failed clip: skip it and continue, or abort
    #[arg(long)]
    pub on_error: Option<ErrorPolicy>,

    /// Use this input channel as the gate instead of computing one
    #[arg(long, conflicts_with = "gate")]
    pub gate_channel: Option<usize>,

    /// Use the first channel of this audio file as the gate
    #[arg(long)]
    pub gate: Option<PathBuf>,

    /// Computed gate: old-bird (flight call detector) or level
    #[arg(long)]
    pub gate_source: Option<GateSource>,

    /// Old Bird detector preset: tseep or thrush
    #[arg(long)]
    pub detector: Option<DetectorPreset>,

    /// Power ratio threshold replacing the preset's
    #[arg(long)]
    pub detector_threshold: Option<f64>,

    /// Level at which the gate opens (level gate only)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Frames the gate stays open after the level drops (level gate only)
    #[arg(long)]
    pub release: Option<usize>,
}
