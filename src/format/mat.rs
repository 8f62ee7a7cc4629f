use std::io::{self, Write};

use super::{Clip, ClipWriter};
use crate::window::ChannelOrder;

pub const SOUND_VAR: &str = "soundData";
pub const RATE_VAR: &str = "fs";

/// Level 1.0 type code: little-endian machine, float64, numeric matrix.
const TYPE_LE_F64_NUMERIC: i32 = 0;

/// Level 1.0 MAT file holding the samples and the sample rate.
///
/// Channel-major input is stored as a frames x channels matrix, interleaved
/// input as channels x frames. Either way the doubles follow in the file's
/// column-major order, which is the input's own order.
pub struct MatWriter;

impl ClipWriter for MatWriter {
    fn write(&self, out: &mut dyn Write, clip: &Clip<'_>) -> io::Result<()> {
        let order = clip.input_order();
        let (rows, cols) = match order {
            ChannelOrder::ChannelMajor => (clip.frames(), clip.channels()),
            ChannelOrder::Interleaved => (clip.channels(), clip.frames()),
        };

        write_matrix_header(out, rows as i32, cols as i32, SOUND_VAR)?;
        for x in clip.samples(order) {
            out.write_all(&x.to_le_bytes())?;
        }

        write_matrix_header(out, 1, 1, RATE_VAR)?;
        out.write_all(&clip.sample_rate().to_le_bytes())
    }
}

fn write_matrix_header(out: &mut dyn Write, rows: i32, cols: i32, name: &str) -> io::Result<()> {
    let imaginary = 0i32;
    let name_len = name.len() as i32 + 1;
    for field in [TYPE_LE_F64_NUMERIC, rows, cols, imaginary, name_len] {
        out.write_all(&field.to_le_bytes())?;
    }
    out.write_all(name.as_bytes())?;
    out.write_all(&[0])
}
