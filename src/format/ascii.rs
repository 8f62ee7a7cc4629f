use std::io::{self, Write};

use super::{Clip, ClipWriter};
use crate::codec::quantize;

/// One line per time slot, each sample as `%.15e` followed by a space.
pub struct AsciiFloatWriter;

impl ClipWriter for AsciiFloatWriter {
    fn write(&self, out: &mut dyn Write, clip: &Clip<'_>) -> io::Result<()> {
        for row in clip.rows() {
            for x in row {
                write!(out, "{} ", c_exponential(x, 15))?;
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// One line per time slot, each quantized sample as `%6d` followed by a space.
pub struct AsciiFixedWriter;

impl ClipWriter for AsciiFixedWriter {
    fn write(&self, out: &mut dyn Write, clip: &Clip<'_>) -> io::Result<()> {
        for row in clip.rows() {
            for x in row {
                write!(out, "{:6} ", quantize(x))?;
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// Format like C's `%.<precision>e`: signed exponent of at least two digits.
fn c_exponential(x: f64, precision: usize) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x < 0.0 { "-inf" } else { "inf" }.to_string();
    }

    let formatted = format!("{:.*e}", precision, x);
    match formatted.split_once('e').map(|(m, e)| (m, e.parse::<i32>())) {
        Some((mantissa, Ok(exp))) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs())
        }
        _ => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::test_util::{render, stereo};
    use crate::window::ChannelOrder;

    #[test]
    fn c_exponential_matches_printf() {
        assert_eq!(c_exponential(0.0, 15), "0.000000000000000e+00");
        assert_eq!(c_exponential(-0.5, 15), "-5.000000000000000e-01");
        assert_eq!(c_exponential(1.0, 15), "1.000000000000000e+00");
        assert_eq!(c_exponential(12345.0, 3), "1.234e+04");
        assert_eq!(c_exponential(1e-300, 2), "1.00e-300");
        assert_eq!(c_exponential(f64::NEG_INFINITY, 15), "-inf");
    }

    #[test]
    fn float_lines_per_slot() {
        for order in [ChannelOrder::Interleaved, ChannelOrder::ChannelMajor] {
            let bytes = render(&AsciiFloatWriter, &stereo(order), 2, order, 1, 3);
            let text = String::from_utf8(bytes).unwrap();
            assert_eq!(
                text,
                "2.500000000000000e-01 -2.500000000000000e-01 \n\
                 5.000000000000000e-01 -5.000000000000000e-01 \n"
            );
        }
    }

    #[test]
    fn fixed_is_six_wide() {
        let order = ChannelOrder::ChannelMajor;
        let bytes = render(&AsciiFixedWriter, &stereo(order), 2, order, 2, 4);
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, " 16384 -16383 \n 32767 -32767 \n");
    }
}
