mod audio;
mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use audio::decode::{decode_audio, AudioData};
use cli::Cli;
use gateclip::config::{self, Config, GateSource};
use gateclip::gate::{split_gate_channel, LevelGate};
use gateclip::old_bird::transient_gate;
use gateclip::{ChannelOrder, ClipSaver, OldBirdDetector, OverlapFifo};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect gateclip.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from("gateclip.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("gateclip").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("gateclip").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });
    let mut cfg = match config_path {
        Some(ref path) => match config::load_config(path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}", path.display());
                Config::default()
            }
        },
        None => Config::default(),
    };
    apply_overrides(&mut cfg, &cli);

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    log::info!("gateclip - gated clip saver");
    log::info!("Input: {}", cli.input.display());
    log::info!("Saving {} clips to {}", cfg.clip.format, cfg.clip.save_dir.display());

    // 1. Decode audio
    let audio = decode_audio(&cli.input)?;
    if audio.channels == 0 {
        anyhow::bail!("Input has no channels");
    }

    // 2. Derive the gate
    let sample_rate = audio.sample_rate as f64;
    let (samples, gate, channels) = derive_gate(audio.samples, audio.channels, sample_rate, &cfg)?;
    let frames = gate.len();

    cfg.clip.channels = channels;
    cfg.clip.sample_rate = sample_rate;
    let mut saver = ClipSaver::new(cfg.clip.clone()).context("Invalid clip configuration")?;

    let buffer_size = cfg.clip.buffer_size;
    let order = cfg.clip.order();
    log::info!(
        "{} frames x {} channels, buffer {} / fifo {} ({} frames look-back)",
        frames,
        channels,
        buffer_size,
        cfg.clip.fifo_size,
        cfg.clip.overlap()
    );

    // 3. Feed fixed-size blocks through the FIFOs, then one closed-gate block
    // so a run still open at the end of the input gets saved.
    let mut sample_fifo = OverlapFifo::new(buffer_size, cfg.clip.fifo_size, channels, order);
    let mut gate_fifo =
        OverlapFifo::new(buffer_size, cfg.clip.fifo_size, 1, ChannelOrder::Interleaved);

    let blocks = frames.div_ceil(buffer_size);
    let pb = ProgressBar::new(blocks as u64 + 1);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} blocks ({eta} remaining)",
            )
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let mut saved = 0usize;
    let mut failed = 0usize;
    let mut block = vec![0.0; buffer_size * channels];
    let mut gate_block = vec![0.0; buffer_size];

    for b in 0..=blocks {
        let first = b * buffer_size;
        let n = frames.saturating_sub(first).min(buffer_size);

        let input = &samples[first * channels..(first + n) * channels];
        fill_block(&mut block, input, channels, buffer_size, order);
        gate_block.fill(0.0);
        gate_block[..n].copy_from_slice(&gate[first..first + n]);

        let cycle = saver.cycle();
        let window = sample_fifo.push(&block);
        let gate_window = gate_fifo.push(&gate_block);
        let report = saver
            .process(window, gate_window)
            .with_context(|| format!("Cycle {} failed", cycle))?;

        saved += report.saved.len();
        failed += report.failed;
        pb.set_position(b as u64 + 1);
    }

    pb.finish_with_message("Done");

    if failed > 0 {
        log::warn!("{} clips could not be saved", failed);
    }
    log::info!("Done! {} clips saved in {} cycles", saved, saver.cycle());
    Ok(())
}

fn apply_overrides(cfg: &mut Config, cli: &Cli) {
    let clip = &mut cfg.clip;
    if let Some(ref dir) = cli.save_dir { clip.save_dir = dir.clone(); }
    if let Some(ref name) = cli.base_name { clip.base_name = name.clone(); }
    if let Some(format) = cli.format { clip.format = format; }
    if let Some(mode) = cli.timestamp { clip.timestamp = mode; }
    if let Some(n) = cli.buffer_size { clip.buffer_size = n; }
    if let Some(n) = cli.fifo_size { clip.fifo_size = n; }
    if cli.column_major { clip.column_major = true; }
    if cli.interleaved { clip.column_major = false; }
    if let Some(policy) = cli.on_error { clip.on_error = policy; }

    let gate = &mut cfg.gate;
    if let Some(threshold) = cli.threshold { gate.threshold = threshold; }
    if let Some(release) = cli.release { gate.release = release; }
    if let Some(source) = cli.gate_source { gate.source = source; }
    if let Some(preset) = cli.detector { gate.detector = preset; }
    if let Some(t) = cli.detector_threshold { gate.detector_threshold = Some(t); }
    if cli.gate_channel.is_some() {
        gate.channel = cli.gate_channel;
        gate.file = None;
    }
    if cli.gate.is_some() {
        gate.file = cli.gate.clone();
        gate.channel = None;
    }
}

/// Returns the clip samples (interleaved), one gate value per frame and the
/// clip channel count.
fn derive_gate(
    samples: Vec<f64>,
    channels: usize,
    sample_rate: f64,
    cfg: &Config,
) -> Result<(Vec<f64>, Vec<f64>, usize)> {
    let frames = samples.len() / channels;

    if let Some(gate_channel) = cfg.gate.channel {
        let split = split_gate_channel(&samples, channels, gate_channel);
        let (rest, gate) = split.with_context(|| {
            format!(
                "Gate channel {} unusable with a {} channel input (need at least one channel left)",
                gate_channel, channels
            )
        })?;
        log::info!("Gate: input channel {}", gate_channel);
        return Ok((rest, gate, channels - 1));
    }

    if let Some(ref path) = cfg.gate.file {
        let gate_audio = decode_audio(path).context("Failed to decode gate file")?;
        let mut gate = first_channel(&gate_audio);
        if gate.len() != frames {
            log::warn!(
                "Gate file has {} frames, input has {}; {}",
                gate.len(),
                frames,
                if gate.len() > frames { "truncating" } else { "padding with closed gate" }
            );
        }
        gate.resize(frames, 0.0);
        log::info!("Gate: first channel of {}", path.display());
        return Ok((samples, gate, channels));
    }

    let gate = match cfg.gate.source {
        GateSource::Level => {
            log::info!(
                "Gate: level >= {} with {} frames release",
                cfg.gate.threshold,
                cfg.gate.release
            );
            LevelGate::new(cfg.gate.threshold, cfg.gate.release)
                .process_interleaved(&samples, channels)
        }
        GateSource::OldBird => old_bird_gate(&samples, channels, sample_rate, cfg)?,
    };
    Ok((samples, gate, channels))
}

/// Runs the detector over the first channel and opens the gate over every
/// padded transient.
fn old_bird_gate(
    samples: &[f64],
    channels: usize,
    sample_rate: f64,
    cfg: &Config,
) -> Result<Vec<f64>> {
    let settings = cfg.gate.detector_settings();
    let mut detector = OldBirdDetector::new(&settings, sample_rate)
        .with_context(|| format!("Cannot run the {} detector", cfg.gate.detector))?;

    let longest = settings.max_clip_len(sample_rate);
    if longest > cfg.clip.overlap() {
        log::warn!(
            "Detector clips reach {} frames but the look-back is {}; longer clips start late",
            longest,
            cfg.clip.overlap()
        );
    }

    let channel: Vec<f64> = samples.iter().step_by(channels).copied().collect();
    let mut transients = detector.detect(&channel);
    transients.extend(detector.complete_detection());
    log::info!(
        "Gate: {} detector (threshold {}), {} transients",
        cfg.gate.detector,
        settings.threshold,
        transients.len()
    );

    Ok(transient_gate(&transients, channel.len(), settings.initial_padding))
}

fn first_channel(audio: &AudioData) -> Vec<f64> {
    audio.samples.iter().step_by(audio.channels.max(1)).copied().collect()
}

/// Copy `frames` interleaved frames into a full block in `order`,
/// zero-filling whatever the input does not cover.
fn fill_block(
    block: &mut [f64],
    frames: &[f64],
    channels: usize,
    buffer_size: usize,
    order: ChannelOrder,
) {
    block.fill(0.0);
    match order {
        ChannelOrder::Interleaved => block[..frames.len()].copy_from_slice(frames),
        ChannelOrder::ChannelMajor => {
            for (t, frame) in frames.chunks_exact(channels).enumerate() {
                for (c, &x) in frame.iter().enumerate() {
                    block[order.index(buffer_size, channels, c, t)] = x;
                }
            }
        }
    }
}
