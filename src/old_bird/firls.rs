//! Least-squares linear-phase FIR design for piecewise-constant bands.

use std::f64::consts::PI;

use crate::error::ConfigError;

/// Normalized sinc, `sin(pi x) / (pi x)`.
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Sum over bands of `gain * (hi * sinc(hi * n) - lo * sinc(lo * n))`.
fn band_sum(bands: &[(f64, f64)], gains: impl Iterator<Item = f64>, n: f64) -> f64 {
    bands
        .iter()
        .zip(gains)
        .map(|(&(lo, hi), g)| g * (hi * sinc(hi * n) - lo * sinc(lo * n)))
        .sum()
}

/// Design a symmetric FIR filter with `num_taps` coefficients.
///
/// `bands` are `(low, high)` edge pairs normalized to the Nyquist
/// frequency, `desired` the constant gain of each band. Gaps between bands
/// are don't-care regions. Both odd and even lengths are supported.
pub fn firls(
    num_taps: usize,
    bands: &[(f64, f64)],
    desired: &[f64],
) -> Result<Vec<f64>, ConfigError> {
    let edges_ok = bands
        .iter()
        .all(|&(lo, hi)| (0.0..=1.0).contains(&lo) && lo <= hi && hi <= 1.0)
        && bands.windows(2).all(|w| w[0].1 <= w[1].0);
    if num_taps < 2 || bands.is_empty() || bands.len() != desired.len() || !edges_ok {
        return Err(ConfigError::FilterDesign { taps: num_taps });
    }

    let q: Vec<f64> = (0..num_taps)
        .map(|n| band_sum(bands, std::iter::repeat(1.0), n as f64))
        .collect();
    let gains = || desired.iter().copied();

    if num_taps % 2 == 1 {
        let m = (num_taps - 1) / 2;
        let size = m + 1;
        let mut matrix = vec![0.0; size * size];
        for i in 0..size {
            for j in 0..size {
                matrix[i * size + j] = q[i.abs_diff(j)] + q[i + j];
            }
        }
        let rhs: Vec<f64> = (0..size).map(|i| band_sum(bands, gains(), i as f64)).collect();
        let a = solve(matrix, rhs, size).ok_or(ConfigError::FilterDesign { taps: num_taps })?;

        let mut h: Vec<f64> = a[1..].iter().rev().copied().collect();
        h.push(2.0 * a[0]);
        h.extend_from_slice(&a[1..]);
        Ok(h)
    } else {
        let size = num_taps / 2;
        let mut matrix = vec![0.0; size * size];
        for i in 0..size {
            for j in 0..size {
                matrix[i * size + j] = q[i.abs_diff(j)] + q[i + j + 1];
            }
        }
        let rhs: Vec<f64> = (0..size)
            .map(|i| band_sum(bands, gains(), i as f64 + 0.5))
            .collect();
        let a = solve(matrix, rhs, size).ok_or(ConfigError::FilterDesign { taps: num_taps })?;

        let mut h: Vec<f64> = a.iter().rev().copied().collect();
        h.extend_from_slice(&a);
        Ok(h)
    }
}

/// Gaussian elimination with partial pivoting on a row-major `size` x `size` matrix.
fn solve(mut matrix: Vec<f64>, mut rhs: Vec<f64>, size: usize) -> Option<Vec<f64>> {
    for col in 0..size {
        let pivot = (col..size).max_by(|&a, &b| {
            matrix[a * size + col].abs().total_cmp(&matrix[b * size + col].abs())
        })?;
        if matrix[pivot * size + col].abs() < 1e-12 {
            return None;
        }
        if pivot != col {
            for k in 0..size {
                matrix.swap(pivot * size + k, col * size + k);
            }
            rhs.swap(pivot, col);
        }

        for row in col + 1..size {
            let factor = matrix[row * size + col] / matrix[col * size + col];
            if factor == 0.0 {
                continue;
            }
            for k in col..size {
                matrix[row * size + k] -= factor * matrix[col * size + k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0; size];
    for row in (0..size).rev() {
        let tail: f64 = (row + 1..size).map(|k| matrix[row * size + k] * x[k]).sum();
        x[row] = (rhs[row] - tail) / matrix[row * size + row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Magnitude of the frequency response at `f` (normalized to Nyquist).
    fn gain(h: &[f64], f: f64) -> f64 {
        let (re, im) = h.iter().enumerate().fold((0.0, 0.0), |(re, im), (n, &c)| {
            let w = PI * f * n as f64;
            (re + c * w.cos(), im - c * w.sin())
        });
        (re * re + im * im).sqrt()
    }

    #[test]
    fn full_band_odd_length_is_an_impulse() {
        let h = firls(5, &[(0.0, 1.0)], &[1.0]).unwrap();
        let expected = [0.0, 0.0, 1.0, 0.0, 0.0];
        for (a, b) in h.iter().zip(expected) {
            assert!((a - b).abs() < 1e-9, "{:?}", h);
        }
    }

    #[test]
    fn even_length_is_symmetric() {
        let h = firls(10, &[(0.0, 0.3), (0.4, 1.0)], &[1.0, 0.0]).unwrap();
        assert_eq!(h.len(), 10);
        for n in 0..5 {
            assert!((h[n] - h[9 - n]).abs() < 1e-12);
        }
    }

    #[test]
    fn tseep_bandpass_at_22050_hz() {
        let nyquist = 22050.0 / 2.0;
        let bands = [
            (0.0, 5900.0 / nyquist),
            (6000.0 / nyquist, 10000.0 / nyquist),
            (10100.0 / nyquist, 1.0),
        ];
        let h = firls(100, &bands, &[0.0, 1.0, 0.0]).unwrap();

        assert_eq!(h.len(), 100);
        assert!((gain(&h, 8000.0 / nyquist) - 1.0).abs() < 0.1);
        assert!(gain(&h, 1000.0 / nyquist) < 0.1);
    }

    #[test]
    fn rejects_bad_bands() {
        assert!(firls(1, &[(0.0, 1.0)], &[1.0]).is_err());
        assert!(firls(8, &[(0.5, 0.2)], &[1.0]).is_err());
        assert!(firls(8, &[(0.0, 0.5), (0.4, 1.0)], &[1.0, 0.0]).is_err());
        assert!(firls(8, &[(0.0, 1.2)], &[1.0]).is_err());
        assert!(firls(8, &[(0.0, 1.0)], &[1.0, 0.0]).is_err());
    }
}
