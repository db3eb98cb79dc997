//! 3D volume access: axis selection and section extraction.

mod rotate;

pub use rotate::{rotate_about_axis, rotate_volume, RotationAngles};

use ndarray::{Array2, Array3, Axis};

use crate::error::{RegisterError, Result};

/// Axis along which 2D sections are extracted from a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceAxis {
    Axis0,
    Axis1,
    Axis2,
}

impl SliceAxis {
    /// Numeric index of the axis (0, 1 or 2).
    pub fn as_index(self) -> usize {
        match self {
            SliceAxis::Axis0 => 0,
            SliceAxis::Axis1 => 1,
            SliceAxis::Axis2 => 2,
        }
    }
}

impl TryFrom<usize> for SliceAxis {
    type Error = RegisterError;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            0 => Ok(SliceAxis::Axis0),
            1 => Ok(SliceAxis::Axis1),
            2 => Ok(SliceAxis::Axis2),
            other => Err(RegisterError::InvalidAxis(other)),
        }
    }
}

/// Extract the 2D section of `volume` at `index` along `axis`.
///
/// The result has the volume's shape with the sliced axis removed; the two
/// remaining axes keep their relative order.
///
/// # Errors
/// [`RegisterError::SectionOutOfRange`] when `index` is not a valid
/// coordinate along `axis`.
pub fn slice_volume<T: Copy>(
    volume: &Array3<T>,
    index: usize,
    axis: SliceAxis,
) -> Result<Array2<T>> {
    let extent = volume.len_of(Axis(axis.as_index()));
    if index >= extent {
        return Err(RegisterError::SectionOutOfRange {
            index: index as i64,
            axis: axis.as_index(),
            extent,
        });
    }
    Ok(volume.index_axis(Axis(axis.as_index()), index).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_volume(shape: (usize, usize, usize)) -> Array3<f64> {
        let len = shape.0 * shape.1 * shape.2;
        Array3::from_shape_vec(shape, (0..len).map(|v| v as f64).collect()).unwrap()
    }

    #[test]
    fn test_axis_from_usize() {
        assert_eq!(SliceAxis::try_from(0).unwrap(), SliceAxis::Axis0);
        assert_eq!(SliceAxis::try_from(2).unwrap(), SliceAxis::Axis2);
        assert!(matches!(
            SliceAxis::try_from(3),
            Err(RegisterError::InvalidAxis(3))
        ));
    }

    #[test]
    fn test_slice_shape_drops_axis() {
        let vol = numbered_volume((4, 5, 6));
        assert_eq!(slice_volume(&vol, 2, SliceAxis::Axis0).unwrap().dim(), (5, 6));
        assert_eq!(slice_volume(&vol, 2, SliceAxis::Axis1).unwrap().dim(), (4, 6));
        assert_eq!(slice_volume(&vol, 2, SliceAxis::Axis2).unwrap().dim(), (4, 5));
    }

    #[test]
    fn test_slice_fixes_chosen_axis() {
        let vol = numbered_volume((3, 4, 5));
        let section = slice_volume(&vol, 1, SliceAxis::Axis1).unwrap();
        for i in 0..3 {
            for k in 0..5 {
                assert_eq!(section[[i, k]], vol[[i, 1, k]]);
            }
        }
    }

    #[test]
    fn test_slice_index_out_of_range() {
        let vol = numbered_volume((3, 4, 5));
        let err = slice_volume(&vol, 4, SliceAxis::Axis1).unwrap_err();
        assert!(matches!(
            err,
            RegisterError::SectionOutOfRange {
                index: 4,
                axis: 1,
                extent: 4
            }
        ));
    }
}
