use std::io::{self, Write};

use super::{Clip, ClipWriter};
use crate::codec::quantize;
use crate::window::ChannelOrder;

const BITS_PER_SAMPLE: u16 = 16;
const FORMAT_PCM: u16 = 1;
const FMT_CHUNK_SIZE: u32 = 16;

/// RIFF WAVE with 16-bit PCM, always interleaved.
pub struct WaveWriter;

impl ClipWriter for WaveWriter {
    fn write(&self, out: &mut dyn Write, clip: &Clip<'_>) -> io::Result<()> {
        let channels = clip.channels() as u16;
        let sample_rate = (0.5 + clip.sample_rate()).floor() as u32;
        let block_align = channels * (BITS_PER_SAMPLE / 8);
        let byte_rate = sample_rate * block_align as u32;
        let data_size = (clip.frames() * clip.channels() * 2) as u32;

        // RIFF header; size excludes the first 8 bytes
        out.write_all(b"RIFF")?;
        out.write_all(&(36 + data_size).to_le_bytes())?;
        out.write_all(b"WAVE")?;

        out.write_all(b"fmt ")?;
        out.write_all(&FMT_CHUNK_SIZE.to_le_bytes())?;
        out.write_all(&FORMAT_PCM.to_le_bytes())?;
        out.write_all(&channels.to_le_bytes())?;
        out.write_all(&sample_rate.to_le_bytes())?;
        out.write_all(&byte_rate.to_le_bytes())?;
        out.write_all(&block_align.to_le_bytes())?;
        out.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

        out.write_all(b"data")?;
        out.write_all(&data_size.to_le_bytes())?;
        for x in clip.samples(ChannelOrder::Interleaved) {
            out.write_all(&quantize(x).to_le_bytes())?;
        }
        Ok(())
    }
}
