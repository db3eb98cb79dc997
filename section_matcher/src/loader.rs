//! Input loaders and resampling.
//!
//! Raw binary files carry no header, so shapes come from the preset tables.
//! Resampling is nearest-neighbor throughout: the shipped datasets are
//! binary pore/matrix segmentations and must not acquire intermediate
//! values.

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use ndarray::{Array2, Array3};

/// Load a row-major raw u8 volume of known shape.
pub fn load_raw_volume(path: &Path, shape: (usize, usize, usize)) -> Result<Array3<u8>> {
    let bytes = fs::read(path).with_context(|| format!("reading volume {}", path.display()))?;
    let expected = shape.0 * shape.1 * shape.2;
    ensure!(
        bytes.len() == expected,
        "volume {} holds {} bytes, expected {} for shape {:?}",
        path.display(),
        bytes.len(),
        expected,
        shape
    );
    Ok(Array3::from_shape_vec(shape, bytes)?)
}

/// Load a row-major raw u8 image of known shape.
pub fn load_raw_image(path: &Path, shape: (usize, usize)) -> Result<Array2<u8>> {
    let bytes = fs::read(path).with_context(|| format!("reading image {}", path.display()))?;
    let expected = shape.0 * shape.1;
    ensure!(
        bytes.len() == expected,
        "image {} holds {} bytes, expected {} for shape {:?}",
        path.display(),
        bytes.len(),
        expected,
        shape
    );
    Ok(Array2::from_shape_vec(shape, bytes)?)
}

/// Load a template from any format the `image` crate understands
/// (TIFF, PNG, ...), converted to single-channel intensities.
pub fn load_template_image(path: &Path) -> Result<Array2<f64>> {
    let img = image::open(path)
        .with_context(|| format!("reading template {}", path.display()))?
        .to_luma8();
    let (width, height) = img.dimensions();
    Ok(Array2::from_shape_fn(
        (height as usize, width as usize),
        |(r, c)| f64::from(img.get_pixel(c as u32, r as u32).0[0]),
    ))
}

fn scaled_len(len: usize, factor: f64) -> usize {
    ((len as f64 * factor).round() as usize).max(1)
}

fn source_index(out: usize, out_len: usize, in_len: usize) -> usize {
    let pos = (out as f64 + 0.5) * in_len as f64 / out_len as f64 - 0.5;
    (pos.round().max(0.0) as usize).min(in_len - 1)
}

/// Nearest-neighbor rescale of a 2D array by `factor` in both dimensions.
pub fn zoom_2d(image: &Array2<u8>, factor: f64) -> Array2<u8> {
    let (rows, cols) = image.dim();
    let (out_rows, out_cols) = (scaled_len(rows, factor), scaled_len(cols, factor));
    Array2::from_shape_fn((out_rows, out_cols), |(r, c)| {
        image[[
            source_index(r, out_rows, rows),
            source_index(c, out_cols, cols),
        ]]
    })
}

/// Nearest-neighbor rescale of a 3D array by `factor` in all dimensions.
pub fn zoom_3d(volume: &Array3<u8>, factor: f64) -> Array3<u8> {
    let (d0, d1, d2) = volume.dim();
    let out = (
        scaled_len(d0, factor),
        scaled_len(d1, factor),
        scaled_len(d2, factor),
    );
    Array3::from_shape_fn(out, |(i, j, k)| {
        volume[[
            source_index(i, out.0, d0),
            source_index(j, out.1, d1),
            source_index(k, out.2, d2),
        ]]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_2d_shapes() {
        let image = Array2::from_shape_fn((10, 20), |(r, c)| (r * 20 + c) as u8);
        assert_eq!(zoom_2d(&image, 0.5).dim(), (5, 10));
        assert_eq!(zoom_2d(&image, 2.0).dim(), (20, 40));
        assert_eq!(zoom_2d(&image, 1.0), image);
    }

    #[test]
    fn test_zoom_3d_halves_each_dimension() {
        let volume = Array3::from_elem((8, 6, 4), 3u8);
        let scaled = zoom_3d(&volume, 0.5);
        assert_eq!(scaled.dim(), (4, 3, 2));
        assert!(scaled.iter().all(|&v| v == 3));
    }

    #[test]
    fn test_zoom_preserves_labels() {
        // Upscaling a binary pattern must yield only the original labels.
        let image = Array2::from_shape_fn((6, 6), |(r, c)| u8::from((r + c) % 2 == 0));
        let scaled = zoom_2d(&image, 1.7);
        assert!(scaled.iter().all(|&v| v == 0 || v == 1));
    }

    #[test]
    fn test_raw_loaders_reject_bad_sizes() {
        let dir = std::env::temp_dir();
        let path = dir.join("section_matcher_loader_test.raw");
        fs::write(&path, vec![0u8; 10]).unwrap();

        assert!(load_raw_image(&path, (2, 5)).is_ok());
        assert!(load_raw_image(&path, (3, 5)).is_err());
        assert!(load_raw_volume(&path, (2, 5, 1)).is_ok());
        assert!(load_raw_volume(&path, (2, 5, 2)).is_err());

        fs::remove_file(&path).ok();
    }
}
