use std::io::{self, Write};

use super::{write_u16_be, write_u32_be, Clip, ClipWriter};
use crate::codec::{double_to_extended, quantize};
use crate::window::ChannelOrder;

const COMM_CHUNK_SIZE: u32 = 18;
/// 'AIFF' tag, COMM chunk header and body, SSND header and offset/block size
const FORM_OVERHEAD: u32 = 4 + 8 + COMM_CHUNK_SIZE + 8 + 8;
const SAMPLE_SIZE: u16 = 16;

/// AIFF with 16-bit big-endian PCM, interleaved, one or two channels.
pub struct AiffWriter;

impl ClipWriter for AiffWriter {
    fn max_channels(&self) -> Option<usize> {
        Some(2)
    }

    fn write(&self, out: &mut dyn Write, clip: &Clip<'_>) -> io::Result<()> {
        let frames = clip.frames() as u32;
        let sample_bytes = frames * clip.channels() as u32 * 2;

        out.write_all(b"FORM")?;
        write_u32_be(out, FORM_OVERHEAD + sample_bytes)?;
        out.write_all(b"AIFF")?;

        out.write_all(b"COMM")?;
        write_u32_be(out, COMM_CHUNK_SIZE)?;
        write_u16_be(out, clip.channels() as u16)?;
        write_u32_be(out, frames)?;
        write_u16_be(out, SAMPLE_SIZE)?;
        out.write_all(&double_to_extended(clip.sample_rate()))?;

        out.write_all(b"SSND")?;
        write_u32_be(out, 8 + sample_bytes)?;
        write_u32_be(out, 0)?; // offset
        write_u32_be(out, 0)?; // block size

        for x in clip.samples(ChannelOrder::Interleaved) {
            write_u16_be(out, quantize(x) as u16)?;
        }
        Ok(())
    }
}
