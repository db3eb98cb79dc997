//! Synthetic inputs with known ground truth for tests.

use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Binary volume containing a single filled sphere.
pub fn make_sphere_volume(
    shape: (usize, usize, usize),
    center: [f64; 3],
    radius: f64,
) -> Array3<u8> {
    let radius_sq = radius * radius;
    Array3::from_shape_fn(shape, |(i, j, k)| {
        let di = i as f64 - center[0];
        let dj = j as f64 - center[1];
        let dk = k as f64 - center[2];
        u8::from(di * di + dj * dj + dk * dk <= radius_sq)
    })
}

/// Binary volume packed with `count` spheres at seeded random positions.
///
/// The first sphere always sits at the volume center so the central section
/// carries structure regardless of the seed; the rest land anywhere that
/// keeps them fully inside the volume. Spheres may overlap.
pub fn make_sphere_pack(
    shape: (usize, usize, usize),
    count: usize,
    radius_range: (f64, f64),
    seed: u64,
) -> Array3<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut volume = Array3::zeros(shape);
    let dims = [shape.0 as f64, shape.1 as f64, shape.2 as f64];

    for sphere in 0..count {
        let radius = if radius_range.0 < radius_range.1 {
            rng.gen_range(radius_range.0..radius_range.1)
        } else {
            radius_range.0
        };
        let center = if sphere == 0 {
            [
                (dims[0] - 1.0) / 2.0,
                (dims[1] - 1.0) / 2.0,
                (dims[2] - 1.0) / 2.0,
            ]
        } else {
            [
                rng.gen_range(radius..dims[0] - radius),
                rng.gen_range(radius..dims[1] - radius),
                rng.gen_range(radius..dims[2] - radius),
            ]
        };

        stamp_sphere(&mut volume, center, radius);
    }
    volume
}

fn stamp_sphere(volume: &mut Array3<u8>, center: [f64; 3], radius: f64) {
    let radius_sq = radius * radius;
    let lo = |c: f64| ((c - radius).floor().max(0.0)) as usize;
    let hi = |c: f64, n: usize| ((c + radius).ceil() as usize + 1).min(n);
    let (n0, n1, n2) = volume.dim();

    for i in lo(center[0])..hi(center[0], n0) {
        for j in lo(center[1])..hi(center[1], n1) {
            for k in lo(center[2])..hi(center[2], n2) {
                let di = i as f64 - center[0];
                let dj = j as f64 - center[1];
                let dk = k as f64 - center[2];
                if di * di + dj * dj + dk * dk <= radius_sq {
                    volume[[i, j, k]] = 1;
                }
            }
        }
    }
}

/// Place `template` into a uniform background at `offset` (row, col).
///
/// Panics if the template does not fit; that is a test setup bug.
pub fn embed_template(
    template: &Array2<f64>,
    shape: (usize, usize),
    background: f64,
    offset: (usize, usize),
) -> Array2<f64> {
    let (tr, tc) = template.dim();
    assert!(offset.0 + tr <= shape.0 && offset.1 + tc <= shape.1);

    let mut image = Array2::from_elem(shape, background);
    for ((r, c), &value) in template.indexed_iter() {
        image[[offset.0 + r, offset.1 + c]] = value;
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_volume_center_filled() {
        let vol = make_sphere_volume((11, 11, 11), [5.0, 5.0, 5.0], 3.0);
        assert_eq!(vol[[5, 5, 5]], 1);
        assert_eq!(vol[[0, 0, 0]], 0);
        assert!(vol.iter().filter(|&&v| v == 1).count() > 50);
    }

    #[test]
    fn test_sphere_pack_reproducible() {
        let a = make_sphere_pack((20, 20, 20), 5, (2.0, 4.0), 99);
        let b = make_sphere_pack((20, 20, 20), 5, (2.0, 4.0), 99);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sphere_pack_central_section_nonempty() {
        let vol = make_sphere_pack((20, 20, 20), 3, (2.0, 4.0), 1);
        let filled = vol
            .index_axis(ndarray::Axis(0), 10)
            .iter()
            .filter(|&&v| v == 1)
            .count();
        assert!(filled > 0);
    }

    #[test]
    fn test_embed_template_copies_values() {
        let template = Array2::from_shape_fn((3, 4), |(r, c)| (r * 4 + c) as f64);
        let image = embed_template(&template, (10, 10), -1.0, (2, 5));
        assert_eq!(image[[2, 5]], 0.0);
        assert_eq!(image[[4, 8]], 11.0);
        assert_eq!(image[[0, 0]], -1.0);
    }
}
