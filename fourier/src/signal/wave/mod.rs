use crate::error::Error;
use crate::kernel::KernelLifecycle;
use crate::signal::traits::CurveGenerate2D;
use nalgebra::RealField;
use ndarray::Array1;

mod kernels;
pub use kernels::*;

/// Return a rectangular pulse: `n1` zeros, `n2` ones, then `n3` zeros.
///
/// ```
/// use fourier::signal::wave::hat;
///
/// let pulse = hat::<f64>(1, 2, 1);
/// assert_eq!(pulse.to_vec(), vec![0.0, 1.0, 1.0, 0.0]);
/// ```
pub fn hat<F>(n1: usize, n2: usize, n3: usize) -> Array1<F>
where
    F: RealField + Copy,
{
    match HatKernel::try_new(HatConfig { n1, n2, n3 }) {
        Ok(kernel) => {
            let mut out = Array1::from_elem(kernel.len(), F::zero());
            if let Some(out) = out.as_slice_mut() {
                kernel.fill(out);
            }
            out
        }
        // Overflowing lengths cannot be allocated either; zero length is the empty pulse
        Err(_) => Array1::from_vec(Vec::new()),
    }
}

/// Parameter grid for the demo curves: `n` points from `1/n` to `end`, inclusive.
///
/// Equivalent to `numpy.linspace(1/n, end, n)`.
pub fn theta_grid<F>(n: usize, end: F) -> Array1<F>
where
    F: RealField + Copy,
{
    let start = F::one() / nalgebra::convert::<f64, F>(n as f64);
    match n {
        0 => Array1::from_vec(Vec::new()),
        1 => Array1::from_elem(1, start),
        _ => {
            let step = (end - start) / nalgebra::convert::<f64, F>((n - 1) as f64);
            Array1::from_shape_fn(n, |i| {
                if i == n - 1 {
                    end
                } else {
                    start + nalgebra::convert::<f64, F>(i as f64) * step
                }
            })
        }
    }
}

/// Sample a Lissajous curve at every `theta`.
///
/// # Errors
/// When any parameter is not finite.
pub fn lissajous<F>(theta: &[F], config: LissajousConfig<F>) -> Result<(Vec<F>, Vec<F>), Error>
where
    F: RealField + Copy,
{
    let kernel = LissajousKernel::try_new(config)?;
    Ok(kernel.run_alloc(theta)?)
}

/// Sample a four-pendulum harmonograph at every `theta`.
///
/// # Errors
/// When any parameter is not finite or a decay rate is negative.
pub fn harmonograph<F>(
    theta: &[F],
    config: HarmonographConfig<F>,
) -> Result<(Vec<F>, Vec<F>), Error>
where
    F: RealField + Copy,
{
    let kernel = HarmonographKernel::try_new(config)?;
    Ok(kernel.run_alloc(theta)?)
}
