//! Epicycle decomposition of planar curves.
//!
//! A curve sampled at `n` points `(x[m], y[m])` is read as the complex series
//! `a[m] = x[m] + i·y[m]`. Its inverse DFT writes every point as a sum of `n`
//! rotating arrows, one per frequency bin:
//!
//! ```text
//! a[m] = Σ_k A[k] · exp(2πi·m·k/n) / n
//! ```
//!
//! [`dft_partials`] tabulates every term of that sum and [`Epicycles`] turns a
//! column of the table into a drawable frame: arrows laid tip to tail, the last
//! tip landing on the curve.

use crate::kernel::ExecInvariantViolation;
use crate::signal::{count, lit};
use fourier_core::num_rs::fft;
use ndarray::{Array1, Array2, ArrayView2};
use num_traits::Float;
use rustfft::num_complex::Complex;
use rustfft::FftNum;

/// Per-frequency terms of the inverse DFT of `x + i·y`.
///
/// Returns an `n × n` matrix `S` with `S[[k, m]] = A[k]·exp(2πi·m·k/n)/n`, where
/// `A` is the DFT of `x + i·y`. Rows are frequency bins in FFT order, columns
/// are sample indices, and each column sums to `x[m] + i·y[m]`.
///
/// # Errors
/// When `x` is empty or `x` and `y` differ in length.
pub fn dft_partials<F>(x: &[F], y: &[F]) -> Result<Array2<Complex<F>>, ExecInvariantViolation>
where
    F: Float + FftNum,
{
    if x.is_empty() {
        return Err(ExecInvariantViolation::InvalidState {
            reason: "dft_partials input must be non-empty",
        });
    }
    if y.len() != x.len() {
        return Err(ExecInvariantViolation::LengthMismatch {
            arg: "y",
            expected: x.len(),
            got: y.len(),
        });
    }

    let n = x.len();
    tracing::debug!(n, "dft partials");
    let a = x
        .iter()
        .zip(y.iter())
        .map(|(&re, &im)| Complex::new(re, im))
        .collect::<Array1<_>>();
    let coeffs = fft(a.view(), None)?;

    let two_pi_over_n = lit::<F>(core::f64::consts::TAU) / count::<F>(n);
    let inv_n = count::<F>(n).recip();
    Ok(Array2::from_shape_fn((n, n), |(k, m)| {
        // Reduce m·k mod n before scaling to keep the phase exact for large n
        let phase = two_pi_over_n * count::<F>((m * k) % n);
        coeffs[k] * Complex::from_polar(inv_n, phase)
    }))
}

/// One animation frame: the arrows of every frequency bin at a sample index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EpicycleFrame<F> {
    /// Horizontal arrow components, one per frequency bin.
    pub u: Vec<F>,
    /// Vertical arrow components, one per frequency bin.
    pub v: Vec<F>,
    /// Horizontal arrow tails: the running sum of the preceding arrows, starting at zero.
    pub x: Vec<F>,
    /// Vertical arrow tails.
    pub y: Vec<F>,
}

impl<F: Float> EpicycleFrame<F> {
    /// Tip of the last arrow, which lies on the curve.
    pub fn tip(&self) -> (F, F) {
        match (self.x.last(), self.u.last(), self.y.last(), self.v.last()) {
            (Some(&x), Some(&u), Some(&y), Some(&v)) => (x + u, y + v),
            _ => (F::zero(), F::zero()),
        }
    }
}

/// A planar curve together with its DFT partial-sum table.
#[derive(Debug, Clone, PartialEq)]
pub struct Epicycles<F> {
    x: Vec<F>,
    y: Vec<F>,
    partials: Array2<Complex<F>>,
}

impl<F> Epicycles<F>
where
    F: Float + FftNum,
{
    /// Decompose the curve `(x, y)`.
    ///
    /// # Errors
    /// When `x` is empty or `x` and `y` differ in length.
    pub fn new(x: &[F], y: &[F]) -> Result<Self, ExecInvariantViolation> {
        let partials = dft_partials(x, y)?;
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            partials,
        })
    }

    /// Number of samples, which is also the number of frames and of arrows per frame.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Always false; construction rejects empty curves.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// The `n × n` partial-sum table from [`dft_partials`].
    pub fn partials(&self) -> ArrayView2<'_, Complex<F>> {
        self.partials.view()
    }

    /// Arrows at sample index `m`, or `None` past the last sample.
    pub fn frame(&self, m: usize) -> Option<EpicycleFrame<F>> {
        if m >= self.len() {
            return None;
        }
        let column = self.partials.column(m);
        let u: Vec<F> = column.iter().map(|c| c.re).collect();
        let v: Vec<F> = column.iter().map(|c| c.im).collect();
        let tails = |d: &[F]| {
            d.iter()
                .scan(F::zero(), |acc, &step| {
                    let tail = *acc;
                    *acc = *acc + step;
                    Some(tail)
                })
                .collect::<Vec<_>>()
        };
        let x = tails(&u);
        let y = tails(&v);
        Some(EpicycleFrame { u, v, x, y })
    }

    /// Iterate every frame in sample order.
    pub fn frames(&self) -> impl Iterator<Item = EpicycleFrame<F>> + '_ {
        (0..self.len()).filter_map(move |m| self.frame(m))
    }

    /// Symmetric axis limit that keeps every arrow tip of every frame in view.
    ///
    /// The largest modulus over the running sums down each column of the table.
    pub fn extent(&self) -> F {
        self.partials
            .columns()
            .into_iter()
            .map(|column| {
                column
                    .iter()
                    .scan(Complex::new(F::zero(), F::zero()), |acc, &c| {
                        *acc = *acc + c;
                        Some(acc.norm())
                    })
                    .fold(F::zero(), F::max)
            })
            .fold(F::zero(), F::max)
    }

    /// The first `m` samples of the curve, the part already traced at frame `m`.
    pub fn trace(&self, m: usize) -> (&[F], &[F]) {
        let m = m.min(self.len());
        (&self.x[..m], &self.y[..m])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::wave::{lissajous, theta_grid, LissajousConfig};
    use approx::assert_abs_diff_eq;

    fn square() -> (Vec<f64>, Vec<f64>) {
        (vec![1.0, -1.0, -1.0, 1.0], vec![1.0, 1.0, -1.0, -1.0])
    }

    #[test]
    fn columns_sum_to_the_input_points() {
        let (x, y) = square();
        let s = dft_partials(&x, &y).expect("partials");
        assert_eq!(s.dim(), (4, 4));
        for m in 0..4 {
            let sum = s.column(m).iter().fold(Complex::new(0.0, 0.0), |a, c| a + c);
            assert_abs_diff_eq!(sum.re, x[m], epsilon = 1e-12);
            assert_abs_diff_eq!(sum.im, y[m], epsilon = 1e-12);
        }
    }

    #[test]
    fn first_column_is_the_scaled_spectrum() {
        let (x, y) = square();
        let s = dft_partials(&x, &y).expect("partials");
        // Zero-mean square traced counter-clockwise: all energy in bin 1
        assert_abs_diff_eq!(s[[0, 0]].norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s[[1, 0]].re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s[[1, 0]].im, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s[[2, 0]].norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s[[3, 0]].norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = dft_partials(&[1.0f64, 2.0], &[1.0]).expect_err("length mismatch");
        assert_eq!(
            err,
            ExecInvariantViolation::LengthMismatch {
                arg: "y",
                expected: 2,
                got: 1,
            }
        );
        let empty: [f64; 0] = [];
        assert!(Epicycles::new(&empty, &empty).is_err());
    }

    #[test]
    fn frame_tails_are_exclusive_running_sums() {
        let (x, y) = square();
        let epicycles = Epicycles::new(&x, &y).expect("epicycles");
        for m in 0..epicycles.len() {
            let frame = epicycles.frame(m).expect("frame in range");
            assert_eq!(frame.x[0], 0.0);
            assert_eq!(frame.y[0], 0.0);
            for k in 1..frame.u.len() {
                assert_abs_diff_eq!(frame.x[k], frame.x[k - 1] + frame.u[k - 1], epsilon = 1e-12);
                assert_abs_diff_eq!(frame.y[k], frame.y[k - 1] + frame.v[k - 1], epsilon = 1e-12);
            }
            let (tx, ty) = frame.tip();
            assert_abs_diff_eq!(tx, x[m], epsilon = 1e-12);
            assert_abs_diff_eq!(ty, y[m], epsilon = 1e-12);
        }
        assert!(epicycles.frame(epicycles.len()).is_none());
        assert_eq!(epicycles.frames().count(), 4);
    }

    #[test]
    fn extent_covers_the_curve() {
        let kernel_config = LissajousConfig {
            x_amplitude: 3.0,
            y_amplitude: 3.0,
            a: 1.0,
            b: 3.0,
            delta: core::f64::consts::FRAC_PI_2,
        };
        let theta = theta_grid(200, core::f64::consts::TAU);
        let (x, y) = lissajous(theta.as_slice().unwrap(), kernel_config).expect("curve");
        let epicycles = Epicycles::new(&x, &y).expect("epicycles");
        let extent = epicycles.extent();
        let radius = x
            .iter()
            .zip(y.iter())
            .map(|(a, b)| a.hypot(*b))
            .fold(0.0, f64::max);
        assert!(extent >= radius - 1e-9);
        assert!(extent.is_finite());
    }

    #[test]
    fn trace_clamps_to_curve_length() {
        let (x, y) = square();
        let epicycles = Epicycles::new(&x, &y).expect("epicycles");
        assert_eq!(epicycles.trace(2), (&x[..2], &y[..2]));
        assert_eq!(epicycles.trace(10).0.len(), 4);
        assert_eq!(epicycles.trace(0).0.len(), 0);
    }
}
