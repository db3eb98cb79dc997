//! Candidate scoring: rotate, slice, correlate, negate.

use ndarray::{Array2, Array3, Axis};
use num_traits::Zero;

use crate::correlation::{normalized_cross_correlation, CorrelationMode};
use crate::error::{RegisterError, Result};
use crate::optimization::types::{SectionParams, PARAM_DIM};
use crate::volume::{rotate_volume, slice_volume, SliceAxis};

/// Read-only view of the fixed inputs of a registration search.
///
/// `evaluate` is pure: it never mutates the volume or template and holds no
/// interior state, so one problem instance can score candidates from any
/// number of worker threads concurrently.
pub struct RegistrationProblem<'a, T> {
    volume: &'a Array3<T>,
    template: &'a Array2<f64>,
    axis: SliceAxis,
}

impl<'a, T> RegistrationProblem<'a, T>
where
    T: Copy + Zero + Into<f64> + Send + Sync,
{
    /// # Errors
    /// [`RegisterError::TemplateTooLarge`] when the template cannot fit
    /// inside a section taken along `axis`; every later correlation would
    /// fail, so this is rejected up front.
    pub fn new(
        volume: &'a Array3<T>,
        template: &'a Array2<f64>,
        axis: SliceAxis,
    ) -> Result<Self> {
        let (d0, d1, d2) = volume.dim();
        let (section_rows, section_cols) = match axis {
            SliceAxis::Axis0 => (d1, d2),
            SliceAxis::Axis1 => (d0, d2),
            SliceAxis::Axis2 => (d0, d1),
        };
        let (template_rows, template_cols) = template.dim();
        if template_rows > section_rows || template_cols > section_cols {
            return Err(RegisterError::TemplateTooLarge {
                template_rows,
                template_cols,
                image_rows: section_rows,
                image_cols: section_cols,
            });
        }
        Ok(Self {
            volume,
            template,
            axis,
        })
    }

    pub fn axis(&self) -> SliceAxis {
        self.axis
    }

    /// Score a flat candidate vector; lower is better.
    ///
    /// The section coordinate is rounded half-to-even before use. A rounded
    /// index outside the volume is reported as an error, not substituted:
    /// it means the search bounds are misconfigured.
    pub fn evaluate(&self, params: &[f64; PARAM_DIM]) -> Result<f64> {
        self.evaluate_params(&SectionParams::from_vector(params))
    }

    /// Score an already-typed candidate; lower is better.
    pub fn evaluate_params(&self, params: &SectionParams) -> Result<f64> {
        let extent = self.volume.len_of(Axis(self.axis.as_index()));
        if params.section < 0 || params.section as usize >= extent {
            return Err(RegisterError::SectionOutOfRange {
                index: params.section,
                axis: self.axis.as_index(),
                extent,
            });
        }

        let rotated = rotate_volume(self.volume, &params.angles);
        let section =
            slice_volume(&rotated, params.section as usize, self.axis)?.mapv(|v| v.into());
        let ncc = normalized_cross_correlation(
            &self.template.view(),
            &section.view(),
            CorrelationMode::Valid,
        )?;

        // Maximizing correlation under a minimizing optimizer.
        Ok(-ncc.peak)
    }
}
