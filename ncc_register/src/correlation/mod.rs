//! Normalized cross-correlation between a template and a search image.
//!
//! The score is invariant to additive intensity offsets (both inputs are
//! mean-centered) and to the local brightness of the search image (the raw
//! correlation is divided by the local image energy under the template
//! footprint). All heavy lifting happens in a fixed number of FFT
//! convolutions, so the cost is O(N log N) in the search image size.

mod fft;

use ndarray::{s, Array2, ArrayView2, Zip};

use crate::error::{RegisterError, Result};

/// Additive term under the square root of the normalization denominator.
const DENOM_EPSILON: f64 = 1e-10;

/// Output extent of the correlation surface relative to its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrelationMode {
    /// Only positions where the template fully overlaps the image. Surface
    /// shape is `(ir - tr + 1, ic - tc + 1)`; `surface[[r, c]]` scores the
    /// template placed with its top-left corner at image pixel `(r, c)`.
    #[default]
    Valid,
    /// Every overlap including partial ones. Surface shape is
    /// `(ir + tr - 1, ic + tc - 1)`; `surface[[r, c]]` scores the template
    /// placed with its top-left corner at image pixel
    /// `(r - tr + 1, c - tc + 1)`, which may hang off the image.
    Full,
}

/// Correlation surface with its peak.
#[derive(Debug, Clone)]
pub struct NccSurface {
    /// Normalized scores, nominally within `[-1, 1]`.
    pub surface: Array2<f64>,
    /// Maximum score.
    pub peak: f64,
    /// Row of the first maximum in row-major order.
    pub peak_row: usize,
    /// Column of the first maximum in row-major order.
    pub peak_col: usize,
}

/// Compute the normalized cross-correlation of `template` against `image`.
///
/// Both inputs are mean-centered, the correlation is evaluated as an FFT
/// convolution with the 180°-flipped template, and each output position is
/// divided by `sqrt(local_image_energy * template_energy + epsilon)`.
/// Negative local energies from floating-point cancellation are clamped to
/// zero and any non-finite score is replaced by zero, so degenerate inputs
/// (all-background windows, constant images) yield scores of 0 rather than
/// errors.
///
/// # Errors
/// [`RegisterError::TemplateTooLarge`] in [`CorrelationMode::Valid`] when
/// the template exceeds the image in either dimension.
pub fn normalized_cross_correlation(
    template: &ArrayView2<f64>,
    image: &ArrayView2<f64>,
    mode: CorrelationMode,
) -> Result<NccSurface> {
    let (tr, tc) = template.dim();
    let (ir, ic) = image.dim();
    if mode == CorrelationMode::Valid && (tr > ir || tc > ic) {
        return Err(RegisterError::TemplateTooLarge {
            template_rows: tr,
            template_cols: tc,
            image_rows: ir,
            image_cols: ic,
        });
    }

    let template_mean = template.mean().unwrap_or(0.0);
    let image_mean = image.mean().unwrap_or(0.0);
    let template_centered = template.mapv(|v| v - template_mean);
    let image_centered = image.mapv(|v| v - image_mean);

    // Flipping both axes turns convolution into correlation.
    let flipped = template_centered.slice(s![..;-1, ..;-1]).to_owned();
    let mut surface = fft::fft_convolve(&image_centered.view(), &flipped.view(), mode);

    // Local energy of the image under a sliding template-sized window,
    // corrected for the window's own mean.
    let ones = Array2::from_elem((tr, tc), 1.0);
    let image_squared = image_centered.mapv(|v| v * v);
    let local_sum_sq = fft::fft_convolve(&image_squared.view(), &ones.view(), mode);
    let local_sum = fft::fft_convolve(&image_centered.view(), &ones.view(), mode);

    let window_len = (tr * tc) as f64;
    let template_energy: f64 = template_centered.iter().map(|v| v * v).sum();

    Zip::from(&mut surface)
        .and(&local_sum_sq)
        .and(&local_sum)
        .for_each(|score, &sum_sq, &sum| {
            let local_energy = (sum_sq - sum * sum / window_len).max(0.0);
            let value = *score / (local_energy * template_energy + DENOM_EPSILON).sqrt();
            *score = if value.is_finite() { value } else { 0.0 };
        });

    let mut peak = f64::NEG_INFINITY;
    let mut peak_row = 0;
    let mut peak_col = 0;
    for ((row, col), &value) in surface.indexed_iter() {
        if value > peak {
            peak = value;
            peak_row = row;
            peak_col = col;
        }
    }

    Ok(NccSurface {
        surface,
        peak,
        peak_row,
        peak_col,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::embed_template;
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_array(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-5.0..5.0))
    }

    fn gradient(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(r, c)| (r * cols + c) as f64)
    }

    #[test]
    fn test_scores_bounded_and_finite() {
        let template = random_array(6, 5, 7);
        let image = random_array(30, 24, 8);
        let ncc =
            normalized_cross_correlation(&template.view(), &image.view(), CorrelationMode::Valid)
                .unwrap();

        assert_eq!(ncc.surface.dim(), (25, 20));
        for &v in ncc.surface.iter() {
            assert!(v.is_finite());
            assert!(v.abs() <= 1.0 + 1e-6, "score {} out of range", v);
        }
    }

    #[test]
    fn test_self_correlation_peaks_at_embedding() {
        let template = gradient(8, 6);
        let image = embed_template(&template, (20, 20), 1.0, (5, 7));
        let ncc =
            normalized_cross_correlation(&template.view(), &image.view(), CorrelationMode::Valid)
                .unwrap();

        assert!(ncc.peak > 0.999, "peak {}", ncc.peak);
        assert_eq!((ncc.peak_row, ncc.peak_col), (5, 7));
    }

    #[test]
    fn test_offset_invariance() {
        let template = gradient(4, 4);
        let image = random_array(12, 12, 3);
        let shifted = image.mapv(|v| v + 40.0);

        let a = normalized_cross_correlation(&template.view(), &image.view(), CorrelationMode::Valid)
            .unwrap();
        let b =
            normalized_cross_correlation(&template.view(), &shifted.view(), CorrelationMode::Valid)
                .unwrap();

        for (x, y) in a.surface.iter().zip(b.surface.iter()) {
            approx::assert_abs_diff_eq!(*x, *y, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_constant_image_scores_zero() {
        let template = gradient(3, 3);
        let image = Array2::from_elem((10, 10), 4.0);
        let ncc =
            normalized_cross_correlation(&template.view(), &image.view(), CorrelationMode::Valid)
                .unwrap();

        for &v in ncc.surface.iter() {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn test_full_mode_shape() {
        let template = gradient(3, 4);
        let image = random_array(10, 11, 5);
        let ncc =
            normalized_cross_correlation(&template.view(), &image.view(), CorrelationMode::Full)
                .unwrap();
        assert_eq!(ncc.surface.dim(), (12, 14));
    }

    #[test]
    fn test_template_larger_than_image_rejected() {
        let template = gradient(8, 8);
        let image = gradient(5, 9);
        let err =
            normalized_cross_correlation(&template.view(), &image.view(), CorrelationMode::Valid)
                .unwrap_err();
        assert!(matches!(err, RegisterError::TemplateTooLarge { .. }));
    }
}
