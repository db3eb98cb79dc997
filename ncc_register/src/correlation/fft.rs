//! FFT-based 2D linear convolution.
//!
//! Transforms are built from 1D passes: FFT each row, transpose, FFT each
//! column, transpose back. Inputs are zero-padded to the full linear
//! convolution size before transforming, so arbitrary (non power-of-two)
//! shapes work directly.

use ndarray::{Array2, ArrayView2};
use rustfft::{num_complex::Complex, FftPlanner};

use super::CorrelationMode;

/// Convolve `image` with `kernel`, cropping the output per `mode`.
///
/// `Full` output has shape `(ir + kr - 1, ic + kc - 1)`; `Valid` keeps only
/// fully-overlapping positions, `(ir - kr + 1, ic - kc + 1)`, and requires
/// the kernel to fit inside the image.
pub(crate) fn fft_convolve(
    image: &ArrayView2<f64>,
    kernel: &ArrayView2<f64>,
    mode: CorrelationMode,
) -> Array2<f64> {
    let (ir, ic) = image.dim();
    let (kr, kc) = kernel.dim();
    debug_assert!(
        mode == CorrelationMode::Full || (kr <= ir && kc <= ic),
        "valid mode requires the kernel to fit inside the image"
    );

    let rows = ir + kr - 1;
    let cols = ic + kc - 1;

    let mut planner = FftPlanner::new();
    let mut image_freq = embed(image, rows, cols);
    let mut kernel_freq = embed(kernel, rows, cols);

    fft_2d(&mut image_freq, rows, cols, &mut planner, true);
    fft_2d(&mut kernel_freq, rows, cols, &mut planner, true);

    for (lhs, rhs) in image_freq.iter_mut().zip(kernel_freq.iter()) {
        *lhs *= *rhs;
    }

    fft_2d(&mut image_freq, rows, cols, &mut planner, false);

    let scale = 1.0 / (rows * cols) as f64;
    let (row0, col0, out_rows, out_cols) = match mode {
        CorrelationMode::Full => (0, 0, rows, cols),
        CorrelationMode::Valid => (kr - 1, kc - 1, ir - kr + 1, ic - kc + 1),
    };

    Array2::from_shape_fn((out_rows, out_cols), |(r, c)| {
        image_freq[(row0 + r) * cols + (col0 + c)].re * scale
    })
}

/// Copy a real array into the top-left corner of a zero complex buffer.
fn embed(data: &ArrayView2<f64>, rows: usize, cols: usize) -> Vec<Complex<f64>> {
    let mut buffer = vec![Complex::new(0.0, 0.0); rows * cols];
    for ((r, c), &value) in data.indexed_iter() {
        buffer[r * cols + c] = Complex::new(value, 0.0);
    }
    buffer
}

/// In-place 2D FFT over a row-major `rows x cols` complex buffer.
fn fft_2d(
    data: &mut [Complex<f64>],
    rows: usize,
    cols: usize,
    planner: &mut FftPlanner<f64>,
    forward: bool,
) {
    let row_fft = if forward {
        planner.plan_fft_forward(cols)
    } else {
        planner.plan_fft_inverse(cols)
    };
    for row in data.chunks_exact_mut(cols) {
        row_fft.process(row);
    }

    let mut transposed = vec![Complex::new(0.0, 0.0); rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            transposed[c * rows + r] = data[r * cols + c];
        }
    }

    let col_fft = if forward {
        planner.plan_fft_forward(rows)
    } else {
        planner.plan_fft_inverse(rows)
    };
    for col in transposed.chunks_exact_mut(rows) {
        col_fft.process(col);
    }

    for r in 0..rows {
        for c in 0..cols {
            data[r * cols + c] = transposed[c * rows + r];
        }
    }
}
