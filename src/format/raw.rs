use std::io::{self, Write};

use super::{write_u16_be, Clip, ClipWriter};
use crate::codec::quantize;
use crate::window::ChannelOrder;

/// Headerless 16-bit big-endian samples, always channel-major.
pub struct MacBinaryWriter;

impl ClipWriter for MacBinaryWriter {
    fn write(&self, out: &mut dyn Write, clip: &Clip<'_>) -> io::Result<()> {
        for x in clip.samples(ChannelOrder::ChannelMajor) {
            write_u16_be(out, quantize(x) as u16)?;
        }
        Ok(())
    }
}

/// Headerless native-endian f64 samples in the input's channel order.
pub struct BinaryFloatWriter;

impl ClipWriter for BinaryFloatWriter {
    fn write(&self, out: &mut dyn Write, clip: &Clip<'_>) -> io::Result<()> {
        for x in clip.samples(clip.input_order()) {
            out.write_all(&x.to_ne_bytes())?;
        }
        Ok(())
    }
}

/// Headerless native-endian i16 samples in the input's channel order.
pub struct BinaryFixedWriter;

impl ClipWriter for BinaryFixedWriter {
    fn write(&self, out: &mut dyn Write, clip: &Clip<'_>) -> io::Result<()> {
        for x in clip.samples(clip.input_order()) {
            out.write_all(&quantize(x).to_ne_bytes())?;
        }
        Ok(())
    }
}
