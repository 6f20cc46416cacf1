use crate::{Error, Result};
use ndarray::{Array1, ArrayView1};
use ndarray_conv::{ConvExt, ConvMode, PaddingMode};
use num_traits::NumAssign;

/// Convolution mode determines behavior near edges and output size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvolveMode {
    /// Full convolution, output size is `in1.len() + in2.len() - 1`
    Full,
    /// Valid convolution, output size is `max(in1.len(), in2.len()) - min(in1.len(), in2.len()) + 1`
    Valid,
    /// Same convolution, output size is `max(in1.len(), in2.len())`
    Same,
}

impl ConvolveMode {
    /// Offset into the full convolution and number of samples kept for inputs of
    /// lengths `n` and `m`.
    pub fn window(self, n: usize, m: usize) -> (usize, usize) {
        let (short, long) = if n < m { (n, m) } else { (m, n) };
        let full = n + m - 1;
        match self {
            ConvolveMode::Full => (0, full),
            ConvolveMode::Same => ((short - 1) / 2, long),
            ConvolveMode::Valid => (short - 1, long - short + 1),
        }
    }
}

/// Best effort parallel behaviour with numpy's convolve method, computed directly in the
/// time domain.
///
/// Returns the discrete, linear convolution of two one-dimensional sequences. The operation
/// is commutative, so unlike numpy the shorter sequence does not have to be passed second.
///
/// # Parameters
/// * `a` : (N,) [[array_like]]([ndarray::Array1])
///   Signal to be (linearly) convolved.
/// * `v` : (M,) [[array_like]]([ndarray::Array1])
///   Second one-dimensional input array.
/// * `mode` : [ConvolveMode]
///   [ConvolveMode::Full]:
///   This returns the convolution at each point of overlap, with an output shape of (N+M-1,).
///   At the end-points of the convolution, the signals do not overlap completely, and boundary
///   effects may be seen.
///
///   [ConvolveMode::Same]:
///   Mode 'same' returns output of length ``max(M, N)``.  Boundary effects are still visible.
///
///   [ConvolveMode::Valid]:
///   Mode 'valid' returns output of length ``max(M, N) - min(M, N) + 1``.  The convolution
///   product is only given for points where the signals overlap completely.
///
/// # Errors
/// [Error::EmptyInput] when either sequence has no samples; [Error::Conv] when
/// `ndarray-conv` rejects the operands.
///
/// # Examples
/// With [ConvolveMode::Full]:
/// ```
/// use ndarray::array;
/// use fourier_core::num_rs::{ConvolveMode, convolve};
///
/// let a = array![1., 2., 3.];
/// let v = array![0., 1., 0.5];
///
/// let expected = array![0., 1., 2.5, 4., 1.5];
/// let result = convolve((&a).into(), (&v).into(), ConvolveMode::Full).unwrap();
/// assert_eq!(result, expected);
/// ```
/// With [ConvolveMode::Same]:
/// ```
/// use ndarray::array;
/// use fourier_core::num_rs::{ConvolveMode, convolve};
///
/// let a = array![1., 2., 3.];
/// let v = array![0., 1., 0.5];
///
/// let expected = array![1., 2.5, 4.];
/// let result = convolve((&a).into(), (&v).into(), ConvolveMode::Same).unwrap();
/// assert_eq!(result, expected);
/// ```
pub fn convolve<T>(a: ArrayView1<T>, v: ArrayView1<T>, mode: ConvolveMode) -> Result<Array1<T>>
where
    T: NumAssign + Copy,
{
    if a.is_empty() {
        return Err(Error::empty("a"));
    }
    if v.is_empty() {
        return Err(Error::empty("v"));
    }

    // The full product is sliced so "same" keeps numpy's offset for even kernels too.
    let (long, short) = if a.len() >= v.len() { (a.view(), v.view()) } else { (v.view(), a.view()) };
    let full = long
        .conv(&short, ConvMode::Full, PaddingMode::Zeros)
        .map_err(|e| Error::Conv {
            reason: e.to_string(),
        })?;

    let (start, len) = mode.window(a.len(), v.len());
    Ok(full.slice_move(ndarray::s![start..start + len]))
}
