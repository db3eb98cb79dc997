//! Comparison image of the matched section against the template.

use std::path::Path;

use anyhow::{Context, Result};
use image::{imageops, DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use ndarray::Array2;

const PANEL_GAP: u32 = 8;
const PEAK_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Render and save the three-panel comparison: matched section, template,
/// and the section again with the template-sized peak rectangle drawn in.
pub fn write_comparison(
    section: &Array2<f64>,
    template: &Array2<f64>,
    peak_row: usize,
    peak_col: usize,
    path: &Path,
) -> Result<()> {
    let canvas = render_comparison(section, template, peak_row, peak_col);
    canvas
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn render_comparison(
    section: &Array2<f64>,
    template: &Array2<f64>,
    peak_row: usize,
    peak_col: usize,
) -> RgbImage {
    let section_panel = to_rgb(&gray_panel(section));
    let template_panel = to_rgb(&gray_panel(template));

    let mut annotated = section_panel.clone();
    let (template_rows, template_cols) = template.dim();
    draw_hollow_rect_mut(
        &mut annotated,
        Rect::at(peak_col as i32, peak_row as i32)
            .of_size(template_cols as u32, template_rows as u32),
        PEAK_COLOR,
    );

    let panels = [&section_panel, &template_panel, &annotated];
    let width: u32 = panels.iter().map(|p| p.width()).sum::<u32>() + 2 * PANEL_GAP;
    let height = panels.iter().map(|p| p.height()).max().unwrap_or(1);

    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut x = 0i64;
    for panel in panels {
        imageops::replace(&mut canvas, panel, x, 0);
        x += i64::from(panel.width()) + i64::from(PANEL_GAP);
    }
    canvas
}

/// Min/max-normalize intensities into an 8-bit grayscale panel.
fn gray_panel(data: &Array2<f64>) -> GrayImage {
    let (rows, cols) = data.dim();
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in data.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    let span = if max > min { max - min } else { 1.0 };

    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let v = data[[y as usize, x as usize]];
        image::Luma([((v - min) / span * 255.0).round() as u8])
    })
}

fn to_rgb(gray: &GrayImage) -> RgbImage {
    DynamicImage::ImageLuma8(gray.clone()).to_rgb8()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_dimensions() {
        let section = Array2::from_shape_fn((20, 30), |(r, c)| (r + c) as f64);
        let template = Array2::from_shape_fn((8, 10), |(r, c)| (r * c) as f64);
        let canvas = render_comparison(&section, &template, 4, 6);

        assert_eq!(canvas.width(), 30 + 10 + 30 + 2 * PANEL_GAP);
        assert_eq!(canvas.height(), 20);
    }

    #[test]
    fn test_peak_rectangle_is_drawn() {
        let section = Array2::from_shape_fn((20, 30), |(r, c)| (r + c) as f64);
        let template = Array2::zeros((8, 10));
        let canvas = render_comparison(&section, &template, 4, 6);

        // Third panel starts after two panels and two gaps; the rectangle's
        // top-left corner sits at the peak location within it.
        let x = 30 + 10 + 2 * PANEL_GAP + 6;
        assert_eq!(*canvas.get_pixel(x, 4), PEAK_COLOR);
    }

    #[test]
    fn test_flat_panel_does_not_divide_by_zero() {
        let flat = Array2::from_elem((5, 5), 2.0);
        let panel = gray_panel(&flat);
        assert!(panel.pixels().all(|p| p.0[0] == 0));
    }
}
