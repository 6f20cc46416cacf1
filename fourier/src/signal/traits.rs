//! Trait interfaces for signal-processing capabilities.
//!
//! These traits define the trait-first API shape shared by the transform
//! kernels and the demo signal generators.

use crate::kernel::{ExecInvariantViolation, Read1D, Read2D, Write1D, Write2D};
use ndarray::Array2;

/// 1D convolution capability.
pub trait Convolve1D<T> {
    /// Run convolution into a caller-provided output buffer.
    fn run_into<I1, I2, O>(
        &self,
        in1: &I1,
        in2: &I2,
        out: &mut O,
    ) -> Result<(), ExecInvariantViolation>
    where
        I1: Read1D<T> + ?Sized,
        I2: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Run convolution and allocate output.
    fn run_alloc<I1, I2>(&self, in1: &I1, in2: &I2) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I1: Read1D<T> + ?Sized,
        I2: Read1D<T> + ?Sized;
}

/// 1D derivative capability.
pub trait Derivative1D<T> {
    /// Differentiate into a caller-provided output buffer of the input's length.
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Differentiate and allocate output.
    fn run_alloc<I>(&self, input: &I) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}

/// 2D gradient capability, producing `(df/dx, df/dy)`.
pub trait Gradient2D<T> {
    /// Differentiate into caller-provided fields of the input's shape.
    fn run_into<I, OX, OY>(
        &self,
        input: &I,
        dfdx: &mut OX,
        dfdy: &mut OY,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: Read2D<T> + ?Sized,
        OX: Write2D<T> + ?Sized,
        OY: Write2D<T> + ?Sized;

    /// Differentiate and allocate both partial-derivative fields.
    fn run_alloc<I>(&self, input: &I) -> Result<(Array2<T>, Array2<T>), ExecInvariantViolation>
    where
        I: Read2D<T> + ?Sized;
}

/// Parametric planar curve generation capability.
pub trait CurveGenerate2D<T> {
    /// Evaluate `(x(θ), y(θ))` into caller-provided buffers.
    fn run_into<I, OX, OY>(
        &self,
        theta: &I,
        x: &mut OX,
        y: &mut OY,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
        OX: Write1D<T> + ?Sized,
        OY: Write1D<T> + ?Sized;

    /// Evaluate `(x(θ), y(θ))` and allocate output.
    fn run_alloc<I>(&self, theta: &I) -> Result<(Vec<T>, Vec<T>), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}

/// Fixed-length 1D pulse generation capability.
pub trait Pulse1D<T> {
    /// Generate the pulse into a caller-provided output buffer.
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<T> + ?Sized;

    /// Generate the pulse and allocate output.
    fn run_alloc(&self) -> Result<Vec<T>, ExecInvariantViolation>;
}
