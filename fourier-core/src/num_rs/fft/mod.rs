use crate::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use num_traits::{Float, NumCast};
pub use rustfft::num_complex::Complex;
use rustfft::{Fft, FftDirection, FftNum, FftPlanner};
use std::sync::Arc;

/// `1 / n` in the working precision.
pub(crate) fn recip_len<F: Float>(n: usize) -> F {
    <F as NumCast>::from(n).map_or_else(F::nan, F::recip)
}

/// Smallest power of two greater than or equal to `n`.
///
/// ```
/// use fourier_core::num_rs::next_pow2_len;
///
/// assert_eq!(next_pow2_len(59), 64);
/// assert_eq!(next_pow2_len(64), 64);
/// assert_eq!(next_pow2_len(1), 1);
/// ```
pub fn next_pow2_len(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

fn transform_1d<F>(
    x: ArrayView1<Complex<F>>,
    n: Option<usize>,
    direction: FftDirection,
) -> Result<Array1<Complex<F>>>
where
    F: FftNum + Float,
{
    let n = n.unwrap_or(x.len());
    if n == 0 {
        return Err(Error::invalid_arg(
            "n",
            "invalid number of data points (0) specified",
        ));
    }

    // Zero-pad or truncate to the working length
    let mut buf = vec![Complex::new(F::zero(), F::zero()); n];
    for (dst, src) in buf.iter_mut().zip(x.iter()) {
        *dst = *src;
    }

    let mut planner = FftPlanner::<F>::new();
    let fft = planner.plan_fft(n, direction);
    tracing::trace!(n, ?direction, "planned 1d transform");
    fft.process(&mut buf);

    if direction == FftDirection::Inverse {
        let scale = recip_len::<F>(n);
        buf.iter_mut().for_each(|c| *c = c.scale(scale));
    }
    Ok(Array1::from_vec(buf))
}

/// Compute the one-dimensional discrete Fourier Transform.
///
/// Mirrors `numpy.fft.fft`: when `n` is given the input is zero-padded or
/// truncated to `n` samples before transforming. The forward transform is
/// unnormalised.
///
/// # Errors
/// [Error::InvalidArg] when the working length is zero.
pub fn fft<F>(x: ArrayView1<Complex<F>>, n: Option<usize>) -> Result<Array1<Complex<F>>>
where
    F: FftNum + Float,
{
    transform_1d(x, n, FftDirection::Forward)
}

/// Compute the one-dimensional inverse discrete Fourier Transform.
///
/// Mirrors `numpy.fft.ifft`, including the `1/n` normalisation, so that
/// `ifft(fft(x)) == x` up to round-off.
///
/// # Errors
/// [Error::InvalidArg] when the working length is zero.
pub fn ifft<F>(x: ArrayView1<Complex<F>>, n: Option<usize>) -> Result<Array1<Complex<F>>>
where
    F: FftNum + Float,
{
    transform_1d(x, n, FftDirection::Inverse)
}

fn transform_lanes<F>(data: &mut Array2<Complex<F>>, axis: Axis, fft: Arc<dyn Fft<F>>)
where
    F: FftNum,
{
    let len = data.len_of(axis);
    let zero = Complex::new(F::zero(), F::zero());
    let mut buf = vec![zero; len];
    let mut scratch = vec![zero; fft.get_inplace_scratch_len()];
    for mut lane in data.lanes_mut(axis) {
        for (dst, src) in buf.iter_mut().zip(lane.iter()) {
            *dst = *src;
        }
        fft.process_with_scratch(&mut buf, &mut scratch);
        for (dst, src) in lane.iter_mut().zip(buf.iter()) {
            *dst = *src;
        }
    }
}

fn transform_2d<F>(x: ArrayView2<Complex<F>>, direction: FftDirection) -> Result<Array2<Complex<F>>>
where
    F: FftNum + Float,
{
    let (rows, cols) = x.dim();
    if rows == 0 || cols == 0 {
        return Err(Error::empty("x"));
    }

    let mut out = x.to_owned();
    let mut planner = FftPlanner::<F>::new();
    transform_lanes(&mut out, Axis(1), planner.plan_fft(cols, direction));
    transform_lanes(&mut out, Axis(0), planner.plan_fft(rows, direction));
    tracing::trace!(rows, cols, ?direction, "applied 2d transform");

    if direction == FftDirection::Inverse {
        let scale = recip_len::<F>(rows * cols);
        out.mapv_inplace(|c| c.scale(scale));
    }
    Ok(out)
}

/// Compute the two-dimensional discrete Fourier Transform over both axes.
///
/// Mirrors `numpy.fft.fft2`: a 1D transform along every row followed by a 1D
/// transform along every column.
///
/// # Errors
/// [Error::EmptyInput] when either axis has no samples.
pub fn fft2<F>(x: ArrayView2<Complex<F>>) -> Result<Array2<Complex<F>>>
where
    F: FftNum + Float,
{
    transform_2d(x, FftDirection::Forward)
}

/// Compute the two-dimensional inverse discrete Fourier Transform.
///
/// Mirrors `numpy.fft.ifft2`, normalised by `1 / (rows * cols)`.
///
/// # Errors
/// [Error::EmptyInput] when either axis has no samples.
pub fn ifft2<F>(x: ArrayView2<Complex<F>>) -> Result<Array2<Complex<F>>>
where
    F: FftNum + Float,
{
    transform_2d(x, FftDirection::Inverse)
}

/// Return the Discrete Fourier Transform sample frequencies.
///
/// Mirrors `numpy.fft.fftfreq`. For window length `n` and sample spacing `d`
/// the bins are
///
/// ```text
/// f = [0, 1, ...,   n/2-1,     -n/2, ..., -1] / (d*n)   if n is even
/// f = [0, 1, ..., (n-1)/2, -(n-1)/2, ..., -1] / (d*n)   if n is odd
/// ```
///
/// in cycles per unit of `d`.
///
/// ```
/// use fourier_core::num_rs::fftfreq;
///
/// let f = fftfreq(8, 0.1f64).unwrap();
/// assert_eq!(f.to_vec(), vec![0.0, 1.25, 2.5, 3.75, -5.0, -3.75, -2.5, -1.25]);
/// ```
///
/// # Errors
/// [Error::InvalidArg] when `n` is zero or `d` is not finite and positive.
pub fn fftfreq<F>(n: usize, d: F) -> Result<Array1<F>>
where
    F: Float,
{
    if n == 0 {
        return Err(Error::invalid_arg("n", "window length must be > 0"));
    }
    if !(d.is_finite() && d > F::zero()) {
        return Err(Error::invalid_arg(
            "d",
            "sample spacing must be finite and > 0",
        ));
    }

    let scale = recip_len::<F>(n) / d;
    let split = n.div_ceil(2);
    Ok(Array1::from_shape_fn(n, |k| {
        let bin = if k < split {
            <F as NumCast>::from(k)
        } else {
            <F as NumCast>::from(n - k).map(|b| -b)
        };
        bin.unwrap_or_else(F::nan) * scale
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};
    use rand::Rng;

    fn lift(x: &[f64]) -> Array1<Complex<f64>> {
        x.iter().map(|&v| Complex::new(v, 0.0)).collect()
    }

    #[test]
    fn fftfreq_even_length_matches_numpy_ordering() {
        let f = fftfreq(8, 1.0f64).expect("fftfreq should succeed");
        assert_eq!(
            f.to_vec(),
            vec![0.0, 0.125, 0.25, 0.375, -0.5, -0.375, -0.25, -0.125]
        );
    }

    #[test]
    fn fftfreq_odd_length_has_no_nyquist_bin() {
        let f = fftfreq(5, 0.5f64).expect("fftfreq should succeed");
        let expected = [0.0, 0.4, 0.8, -0.8, -0.4];
        f.iter()
            .zip(expected.iter())
            .for_each(|(a, b)| assert_abs_diff_eq!(*a, *b, epsilon = 1e-12));
    }

    #[test]
    fn fftfreq_rejects_bad_arguments() {
        assert!(fftfreq(0, 1.0f64).is_err());
        assert!(fftfreq(4, 0.0f64).is_err());
        assert!(fftfreq(4, f64::NAN).is_err());
    }

    #[test]
    fn fft_of_impulse_is_flat() {
        let x = lift(&[1.0, 0.0, 0.0, 0.0]);
        let y = fft(x.view(), None).expect("fft should succeed");
        for c in y.iter() {
            assert_abs_diff_eq!(c.re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(c.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn fft_matches_direct_dft() {
        let x = lift(&[0.5, -1.0, 2.0, 0.25, 3.0]);
        let n = x.len();
        let y = fft(x.view(), None).expect("fft should succeed");
        for k in 0..n {
            let mut acc = Complex::new(0.0, 0.0);
            for (j, xj) in x.iter().enumerate() {
                let angle = -2.0 * core::f64::consts::PI * (j * k) as f64 / n as f64;
                acc += xj * Complex::from_polar(1.0, angle);
            }
            assert_abs_diff_eq!(y[k].re, acc.re, epsilon = 1e-10);
            assert_abs_diff_eq!(y[k].im, acc.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn fft_with_length_pads_and_truncates() {
        let x = lift(&[1.0, 2.0, 3.0]);
        let padded = fft(x.view(), Some(8)).expect("padded fft");
        assert_eq!(padded.len(), 8);
        assert_abs_diff_eq!(padded[0].re, 6.0, epsilon = 1e-12);

        let truncated = fft(x.view(), Some(2)).expect("truncated fft");
        assert_eq!(truncated.len(), 2);
        assert_abs_diff_eq!(truncated[0].re, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(truncated[1].re, -1.0, epsilon = 1e-12);

        assert!(fft(x.view(), Some(0)).is_err());
    }

    #[test]
    fn ifft_inverts_fft() {
        let mut rng = rand::rng();
        let x: Array1<Complex<f64>> = (0..37)
            .map(|_| Complex::new(rng.random_range(-5.0..5.0), rng.random_range(-5.0..5.0)))
            .collect();
        let back = ifft(fft(x.view(), None).unwrap().view(), None).unwrap();
        for (a, b) in x.iter().zip(back.iter()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-10);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn fft2_is_separable_row_then_column() {
        let x = array![[1.0, 2.0, 0.0], [0.0, -1.0, 3.0]].mapv(|v| Complex::new(v, 0.0));
        let y = fft2(x.view()).expect("fft2 should succeed");
        assert_eq!(y.dim(), (2, 3));

        // DC bin is the sum of all samples
        assert_abs_diff_eq!(y[[0, 0]].re, 5.0, epsilon = 1e-12);
        // Row-axis Nyquist at column zero: (1 + 2 + 0) - (0 - 1 + 3)
        assert_abs_diff_eq!(y[[1, 0]].re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y[[1, 0]].im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn ifft2_inverts_fft2() {
        let x = Array::from_shape_fn((6, 5), |(i, j)| {
            Complex::new((i as f64 * 0.7).sin() + j as f64, (j as f64 * 0.3).cos())
        });
        let back = ifft2(fft2(x.view()).unwrap().view()).unwrap();
        for (a, b) in x.iter().zip(back.iter()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-10);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn fft2_rejects_empty_axes() {
        let x = Array2::<Complex<f64>>::zeros((0, 4));
        assert_eq!(fft2(x.view()).unwrap_err(), Error::empty("x"));
    }
}
