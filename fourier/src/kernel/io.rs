use super::ConfigError;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};

/// Adapter trait for reading contiguous 1D input.
pub trait Read1D<T> {
    /// Borrow the underlying input as a contiguous slice.
    fn read_slice(&self) -> Result<&[T], ConfigError>;
}

/// Adapter trait for writing contiguous 1D output.
pub trait Write1D<T> {
    /// Borrow the underlying output as a mutable contiguous slice.
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError>;
}

/// Adapter trait for reading a 2D field laid out as `(rows, cols)`.
///
/// Rows index the `y` axis and columns the `x` axis, matching
/// `meshgrid(x, y)`. The view may be strided.
pub trait Read2D<T> {
    /// Borrow the underlying field as a 2D view.
    fn read_view(&self) -> ArrayView2<'_, T>;
}

/// Adapter trait for writing a 2D field laid out as `(rows, cols)`.
pub trait Write2D<T> {
    /// Borrow the underlying field as a mutable 2D view.
    fn write_view_mut(&mut self) -> ArrayViewMut2<'_, T>;
}

impl<T> Read1D<T> for [T] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T> Write1D<T> for [T] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Read1D<T> for [T; N] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Write1D<T> for [T; N] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

impl<T> Read1D<T> for Vec<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self.as_slice())
    }
}

impl<T> Write1D<T> for Vec<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self.as_mut_slice())
    }
}

impl<T> Read1D<T> for Array1<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

impl<T> Write1D<T> for Array1<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        self.as_slice_mut()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

impl<'a, T> Read1D<T> for ArrayView1<'a, T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "array_view" })
    }
}

impl<'a, T> Write1D<T> for ArrayViewMut1<'a, T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        self.as_slice_mut().ok_or(ConfigError::NonContiguous {
            arg: "array_view_mut",
        })
    }
}

impl<T> Read2D<T> for Array2<T> {
    fn read_view(&self) -> ArrayView2<'_, T> {
        self.view()
    }
}

impl<T> Write2D<T> for Array2<T> {
    fn write_view_mut(&mut self) -> ArrayViewMut2<'_, T> {
        self.view_mut()
    }
}

impl<'a, T> Read2D<T> for ArrayView2<'a, T> {
    fn read_view(&self) -> ArrayView2<'_, T> {
        self.view()
    }
}

impl<'a, T> Write2D<T> for ArrayViewMut2<'a, T> {
    fn write_view_mut(&mut self) -> ArrayViewMut2<'_, T> {
        self.view_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, Read1D, Read2D, Write1D, Write2D};
    use ndarray::{s, Array1, Array2};

    #[test]
    fn slice_and_array_adapters() {
        let a = [1.0f32, 2.0, 3.0];
        assert_eq!(a.read_slice().expect("array adapter").len(), 3);

        let s: &[f32] = &a;
        assert_eq!(s.read_slice().expect("slice adapter")[1], 2.0);
    }

    #[test]
    fn vec_write_adapter() {
        let mut out = vec![0.0f32; 4];
        let slice = out.write_slice_mut().expect("vec write adapter");
        slice.copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn strided_view_is_not_a_slice() {
        let arr = Array1::from(vec![1.0f64, 2.0, 3.0, 4.0]);
        let every_other = arr.slice(s![..;2]);
        assert_eq!(
            every_other.read_slice().unwrap_err(),
            ConfigError::NonContiguous { arg: "array_view" }
        );
    }

    #[test]
    fn field_adapters_preserve_shape() {
        let mut field = Array2::<f64>::zeros((3, 5));
        field.write_view_mut()[[2, 4]] = 7.0;
        let view = field.read_view();
        assert_eq!(view.dim(), (3, 5));
        assert_eq!(view[[2, 4]], 7.0);

        let transposed = field.t();
        assert_eq!(transposed.read_view().dim(), (5, 3));
    }
}
