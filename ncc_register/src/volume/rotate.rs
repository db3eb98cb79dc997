//! Shape-preserving 3D rotation built from sequential in-plane passes.
//!
//! A rotation is applied as three separate 2D rotations, one per pair of
//! axes, each with its own nearest-neighbor resampling pass. Binary or
//! segmented voxel labels therefore never acquire intermediate values, and
//! the composition order (plane (1,2), then (0,2), then (0,1)) is part of
//! the contract: later passes resample the output of earlier ones.

use nalgebra::{Rotation2, Vector2};
use ndarray::parallel::prelude::*;
use ndarray::{Array3, ArrayView2, ArrayViewMut2, Axis};
use num_traits::Zero;
use serde::Serialize;

/// Euler-style rotation angles in degrees, applied in field order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RotationAngles {
    /// Rotation within the plane spanned by axes (1, 2).
    pub theta_x: f64,
    /// Rotation within the plane spanned by axes (0, 2).
    pub theta_y: f64,
    /// Rotation within the plane spanned by axes (0, 1).
    pub theta_z: f64,
}

impl RotationAngles {
    pub fn new(theta_x: f64, theta_y: f64, theta_z: f64) -> Self {
        Self {
            theta_x,
            theta_y,
            theta_z,
        }
    }

    /// Angles that leave the volume untouched.
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Rotate `volume` by the three angles in sequence.
///
/// Each pass preserves the array shape and fills voxels that fall outside
/// the original extent with `T::zero()`. The three passes resample one
/// after another, matching reference data produced the same way.
pub fn rotate_volume<T>(volume: &Array3<T>, angles: &RotationAngles) -> Array3<T>
where
    T: Copy + Zero + Send + Sync,
{
    let rotated_x = rotate_about_axis(volume, angles.theta_x, 0);
    let rotated_y = rotate_about_axis(&rotated_x, angles.theta_y, 1);
    rotate_about_axis(&rotated_y, angles.theta_z, 2)
}

/// Rotate every 2D lane perpendicular to `fixed_axis` by `angle_deg`.
///
/// A positive angle rotates content from the lower of the two in-plane axes
/// toward the higher one, about the lane center `(n - 1) / 2`. Sampling is
/// nearest-neighbor; out-of-bounds samples become `T::zero()`.
pub fn rotate_about_axis<T>(volume: &Array3<T>, angle_deg: f64, fixed_axis: usize) -> Array3<T>
where
    T: Copy + Zero + Send + Sync,
{
    assert!(fixed_axis < 3, "fixed_axis must be 0, 1 or 2");
    if angle_deg == 0.0 {
        return volume.clone();
    }

    // Inverse mapping: each output pixel pulls from the source location
    // obtained by rotating backwards.
    let inverse = Rotation2::new(angle_deg.to_radians()).inverse();

    let mut out = Array3::from_elem(volume.raw_dim(), T::zero());
    out.axis_iter_mut(Axis(fixed_axis))
        .into_par_iter()
        .enumerate()
        .for_each(|(k, mut lane)| {
            let src = volume.index_axis(Axis(fixed_axis), k);
            rotate_lane(&src, &mut lane, &inverse);
        });
    out
}

fn rotate_lane<T>(src: &ArrayView2<T>, dst: &mut ArrayViewMut2<T>, inverse: &Rotation2<f64>)
where
    T: Copy + Zero,
{
    let (rows, cols) = src.dim();
    let center_r = (rows as f64 - 1.0) / 2.0;
    let center_c = (cols as f64 - 1.0) / 2.0;

    for r in 0..rows {
        for c in 0..cols {
            let offset = inverse * Vector2::new(r as f64 - center_r, c as f64 - center_c);
            let src_r = (offset.x + center_r).round();
            let src_c = (offset.y + center_c).round();
            if src_r >= 0.0 && src_c >= 0.0 && (src_r as usize) < rows && (src_c as usize) < cols
            {
                dst[[r, c]] = src[[src_r as usize, src_c as usize]];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_sphere_volume;

    #[test]
    fn test_identity_angles_copy_volume() {
        let vol = make_sphere_volume((9, 9, 9), [4.0, 4.0, 4.0], 3.0);
        let rotated = rotate_volume(&vol, &RotationAngles::identity());
        assert_eq!(rotated, vol);
    }

    #[test]
    fn test_shape_preserved() {
        let vol = make_sphere_volume((6, 8, 10), [3.0, 4.0, 5.0], 2.0);
        let rotated = rotate_volume(&vol, &RotationAngles::new(10.0, -4.0, 33.0));
        assert_eq!(rotated.dim(), vol.dim());
    }

    #[test]
    fn test_quarter_turn_moves_voxel() {
        // Single marked voxel at (1, 2) within each (axis1, axis2) lane of an
        // odd-sized volume; +90 degrees sends offset (-1, 0) to (0, -1).
        let mut vol = Array3::<u8>::zeros((1, 5, 5));
        vol[[0, 1, 2]] = 1;
        let rotated = rotate_about_axis(&vol, 90.0, 0);
        assert_eq!(rotated[[0, 2, 1]], 1);
        assert_eq!(rotated.iter().map(|&v| v as usize).sum::<usize>(), 1);
    }

    #[test]
    fn test_rotation_round_trip_majority_agreement() {
        let vol = make_sphere_volume((21, 21, 21), [10.0, 10.0, 10.0], 7.0);
        let angles = RotationAngles::new(11.0, -7.0, 5.0);

        let rotated = rotate_volume(&vol, &angles);
        // Undo in reverse order with negated angles.
        let back_z = rotate_about_axis(&rotated, -angles.theta_z, 2);
        let back_y = rotate_about_axis(&back_z, -angles.theta_y, 1);
        let back = rotate_about_axis(&back_y, -angles.theta_x, 0);

        let total = vol.len();
        let agree = vol
            .iter()
            .zip(back.iter())
            .filter(|(a, b)| a == b)
            .count();
        assert!(
            agree as f64 / total as f64 > 0.95,
            "round trip agreement {}/{}",
            agree,
            total
        );
    }

    #[test]
    fn test_background_fill_is_zero() {
        let vol = Array3::<f64>::from_elem((1, 7, 7), 1.0);
        let rotated = rotate_about_axis(&vol, 45.0, 0);
        // Corners rotate out of bounds and must be backfilled with zero.
        assert_eq!(rotated[[0, 0, 0]], 0.0);
        assert_eq!(rotated[[0, 6, 6]], 0.0);
        // Center stays put.
        assert_eq!(rotated[[0, 3, 3]], 1.0);
    }
}
