//! Numeric conversions shared by the clip writers.

/// Full-scale value used when converting normalized samples to 16-bit.
pub const FULL_SCALE: f64 = 32767.0;

/// Convert a normalized sample to a signed 16-bit value as `floor(0.5 + 32767 x)`.
///
/// Inputs outside [-1, 1] saturate at the i16 limits instead of wrapping.
pub fn quantize(x: f64) -> i16 {
    (0.5 + FULL_SCALE * x).floor() as i16
}

/// Inverse of [`quantize`] up to rounding.
pub fn dequantize(q: i16) -> f64 {
    q as f64 / FULL_SCALE
}

pub fn byteswap16(x: u16) -> u16 {
    (x >> 8) | (x << 8)
}

pub fn byteswap32(x: u32) -> u32 {
    ((x & 0x0000_00FF) << 24)
        | ((x & 0x0000_FF00) << 8)
        | ((x & 0x00FF_0000) >> 8)
        | ((x & 0xFF00_0000) >> 24)
}

const F64_EXP_MAX: u16 = 0x7FF;
const F64_MANTISSA_MASK: u64 = (1 << 52) - 1;
const EXT_EXP_MAX: u16 = 0x7FFF;
const EXT_BIAS_SHIFT: u16 = 16383 - 1023;
const EXT_INTEGER_BIT: u64 = 1 << 63;

/// Convert a double to the 80-bit IEEE extended format, big-endian.
///
/// Layout of the result: sign bit and 15-bit exponent in the first two
/// bytes, then a 64-bit mantissa with an explicit integer bit. Zero maps to
/// all zero bytes, infinities and NaNs keep the all-ones exponent, and
/// denormals are re-biased like normal numbers but without the integer bit.
pub fn double_to_extended(x: f64) -> [u8; 10] {
    let bits = x.to_bits();
    let sign = ((bits >> 48) as u16) & 0x8000;
    let exponent = ((bits >> 52) as u16) & F64_EXP_MAX;
    let fraction = bits & F64_MANTISSA_MASK;

    let mut mantissa = fraction << 11;
    let ext_exponent = match exponent {
        F64_EXP_MAX => EXT_EXP_MAX,
        0 if fraction == 0 => 0,
        0 => EXT_BIAS_SHIFT,
        e => {
            mantissa |= EXT_INTEGER_BIT;
            e + EXT_BIAS_SHIFT
        }
    };

    let mut out = [0u8; 10];
    out[..2].copy_from_slice(&(sign | ext_exponent).to_be_bytes());
    out[2..].copy_from_slice(&mantissa.to_be_bytes());
    out
}
