//! Sampling: draws the viewport, shrinks it to one pixel per cell, and maps each
//! pixel's brightness onto the character ramp.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::debug;

use crate::bitmap::Bitmap;
use crate::grid::{Cell, CellStyle, CharacterGrid};
use crate::options::{RenderOptions, MAX_DENSITY};
use crate::ramp::CharacterRamp;
use crate::viewport::{compute_visible_region, Size, ViewportState};
use crate::{AsciiItError, Result};

/// Columns produced at maximum density.
pub const BASE_COLUMNS: u32 = 200;

/// Grid dimensions `(cols, rows)` for a sampling call.
///
/// An explicit target width wins. Its rows come from the target height when given,
/// else from the image's aspect, which only matches the sampled area when the
/// viewport shows the whole image (see [`ViewportState::for_bitmap`]); in any
/// other container the grid is stretched to that container. Without a target the
/// column count scales with density and the rows follow the container's aspect.
pub fn grid_size(image: Size, container: Size, options: &RenderOptions) -> (u32, u32) {
    let cell_aspect = options.effective_cell_aspect() as f64;

    if let Some(target) = options.target_char_width {
        let cols = target.max(1);
        let rows = match options.target_char_height {
            Some(rows) => rows.max(1),
            None => rows_for(cols, image, cell_aspect),
        };
        return (cols, rows);
    }

    let cols = (BASE_COLUMNS * options.clamped_density() / MAX_DENSITY).max(1);
    (cols, rows_for(cols, container, cell_aspect))
}

fn rows_for(cols: u32, frame: Size, cell_aspect: f64) -> u32 {
    let rows = (cols as f64 * (frame.height / frame.width) / cell_aspect).round();
    (rows as u32).max(1)
}

/// Plain channel average in `[0, 1]`, floored to a whole level first.
pub fn brightness([r, g, b]: [u8; 3]) -> f64 {
    let level = (r as u32 + g as u32 + b as u32) / 3;
    level as f64 / 255.0
}

/// Gamma curve: `brightness^(1/contrast)`, clamped to `[0, 1]`.
pub fn apply_contrast(brightness: f64, contrast: f64) -> f64 {
    brightness.powf(1.0 / contrast).clamp(0.0, 1.0)
}

/// Ramp index for one RGB value under `contrast`.
pub fn ramp_index(rgb: [u8; 3], ramp: &CharacterRamp, contrast: f64) -> usize {
    ramp.index_for(apply_contrast(brightness(rgb), contrast))
}

fn premultiply(image: &mut RgbaImage) {
    for Rgba([r, g, b, a]) in image.pixels_mut() {
        let alpha = *a as u32;
        for c in [r, g, b] {
            *c = ((*c as u32 * alpha + 127) / 255) as u8;
        }
    }
}

fn unpremultiply(image: &mut RgbaImage) {
    for Rgba([r, g, b, a]) in image.pixels_mut() {
        let alpha = *a as u32;
        for c in [r, g, b] {
            *c = if alpha == 0 { 0 } else { ((*c as u32 * 255 + alpha / 2) / alpha).min(255) as u8 };
        }
    }
}

/// Resizes in premultiplied space, as a canvas does, so transparent pixels do not
/// bleed black into their neighbours. Fully transparent output reads as (0,0,0,0).
fn resize_premultiplied(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut source = image.clone();
    premultiply(&mut source);
    let mut resized = imageops::resize(&source, width, height, FilterType::Triangle);
    unpremultiply(&mut resized);
    resized
}

/// Bilinear lookup at pixel-center coordinates `(x, y)`, clamped to the image edges.
fn bilinear(image: &RgbaImage, x: f64, y: f64) -> [f64; 4] {
    let (max_x, max_y) = (image.width() - 1, image.height() - 1);
    let x = x.clamp(0.0, max_x as f64);
    let y = y.clamp(0.0, max_y as f64);
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let (x1, y1) = ((x0 + 1).min(max_x), (y0 + 1).min(max_y));
    let (fx, fy) = (x - x0 as f64, y - y0 as f64);

    let mut out = [0.0; 4];
    for (channel, value) in out.iter_mut().enumerate() {
        let at = |px: u32, py: u32| image.get_pixel(px, py)[channel] as f64;
        let top = at(x0, y0) * (1.0 - fx) + at(x1, y0) * fx;
        let bottom = at(x0, y1) * (1.0 - fx) + at(x1, y1) * fx;
        *value = top * (1.0 - fy) + bottom * fy;
    }
    out
}

/// Magnifies `crop` into a `width × height` patch. Patch pixel `(i, j)` reads the crop
/// at `origin + (i, j) * step`, in premultiplied space like [`resize_premultiplied`].
fn magnify(crop: &RgbaImage, width: u32, height: u32, origin: (f64, f64), step: (f64, f64)) -> RgbaImage {
    let mut source = crop.clone();
    premultiply(&mut source);
    let mut patch = RgbaImage::from_fn(width, height, |i, j| {
        let texel = bilinear(&source, origin.0 + i as f64 * step.0, origin.1 + j as f64 * step.1);
        Rgba(texel.map(|v| v.round().clamp(0.0, 255.0) as u8))
    });
    unpremultiply(&mut patch);
    patch
}

/// Draws the visible part of `bitmap` onto a transparent canvas the size of the
/// viewport's container, scaled by `scale`. Only the on-canvas part of the image
/// is cropped and resampled, so no intermediate buffer outgrows the canvas.
pub(crate) fn draw_viewport(bitmap: &Bitmap, viewport: &ViewportState, scale: f64) -> RgbaImage {
    let canvas_w = (viewport.container.width * scale).round().max(1.0) as u32;
    let canvas_h = (viewport.container.height * scale).round().max(1.0) as u32;
    let mut canvas = RgbaImage::new(canvas_w, canvas_h);

    let region = compute_visible_region(bitmap.size(), viewport);
    let (left, top) = (region.left * scale, region.top * scale);
    let (width, height) = (region.width * scale, region.height * scale);
    debug!(
        "visible region {:.1},{:.1} {:.1}x{:.1} on {}x{} canvas",
        left, top, width, height, canvas_w, canvas_h
    );

    let x0 = left.max(0.0);
    let y0 = top.max(0.0);
    let x1 = (left + width).min(canvas_w as f64);
    let y1 = (top + height).min(canvas_h as f64);
    if x1 <= x0 || y1 <= y0 {
        return canvas;
    }

    // source pixels per canvas pixel
    let sx = bitmap.width() as f64 / width;
    let sy = bitmap.height() as f64 / height;
    let src_x0 = ((x0 - left) * sx).floor().max(0.0) as u32;
    let src_y0 = ((y0 - top) * sy).floor().max(0.0) as u32;
    let src_x1 = (((x1 - left) * sx).ceil() as u32).min(bitmap.width());
    let src_y1 = (((y1 - top) * sy).ceil() as u32).min(bitmap.height());
    if src_x1 <= src_x0 || src_y1 <= src_y0 {
        return canvas;
    }

    let crop = imageops::crop_imm(bitmap.pixels(), src_x0, src_y0, src_x1 - src_x0, src_y1 - src_y0)
        .to_image();

    if sx < 1.0 || sy < 1.0 {
        // Magnified: fill only the canvas pixels whose centers fall inside the region.
        let cx0 = (x0 - 0.5).ceil().max(0.0) as u32;
        let cy0 = (y0 - 0.5).ceil().max(0.0) as u32;
        let cx1 = ((x1 - 0.5).ceil().max(0.0) as u32).min(canvas_w);
        let cy1 = ((y1 - 0.5).ceil().max(0.0) as u32).min(canvas_h);
        if cx1 <= cx0 || cy1 <= cy0 {
            return canvas;
        }
        let origin = (
            (cx0 as f64 + 0.5 - left) * sx - src_x0 as f64 - 0.5,
            (cy0 as f64 + 0.5 - top) * sy - src_y0 as f64 - 0.5,
        );
        let patch = magnify(&crop, cx1 - cx0, cy1 - cy0, origin, (sx, sy));
        imageops::replace(&mut canvas, &patch, cx0 as i64, cy0 as i64);
        return canvas;
    }

    // Minified: the resized crop is at most a couple of pixels larger than the clip.
    let dest_w = (((src_x1 - src_x0) as f64 / sx).round() as u32).max(1);
    let dest_h = (((src_y1 - src_y0) as f64 / sy).round() as u32).max(1);
    let placed = resize_premultiplied(&crop, dest_w, dest_h);

    let dest_x = (left + src_x0 as f64 / sx).round() as i64;
    let dest_y = (top + src_y0 as f64 / sy).round() as i64;
    imageops::replace(&mut canvas, &placed, dest_x, dest_y);
    canvas
}

fn quantize(pixel: &Rgba<u8>, contrast: f64, options: &RenderOptions) -> Cell {
    let [r, g, b, a] = pixel.0;
    let index = ramp_index([r, g, b], &options.ramp, contrast);

    let color = options.color_enabled.then_some([r, g, b]);
    let opacity = options.alpha_as_opacity.then(|| a as f32 / 255.0);
    Cell { ch: options.ramp.char_at(index), style: CellStyle::new(color, opacity) }
}

/// Samples what the viewport shows into a character grid.
///
/// The visible region is drawn at its on-screen placement into a container-sized
/// buffer, which is then shrunk to `cols × rows` in one resize: one pixel per cell.
pub fn sample(bitmap: &Bitmap, viewport: &ViewportState, options: &RenderOptions) -> Result<CharacterGrid> {
    if viewport.container.is_empty() {
        return Err(AsciiItError::EmptyInput("viewport container has no area"));
    }

    let (cols, rows) = grid_size(bitmap.size(), viewport.container, options);
    debug!("sampling {}x{} bitmap into {}x{} grid", bitmap.width(), bitmap.height(), cols, rows);

    let canvas = draw_viewport(bitmap, viewport, 1.0);
    let cells = resize_premultiplied(&canvas, cols, rows);

    let contrast = options.clamped_contrast() as f64;
    let cells = cells.pixels().map(|pixel| quantize(pixel, contrast, options)).collect();
    Ok(CharacterGrid::new(cols as usize, rows as usize, cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn solid(width: u32, height: u32, pixel: [u8; 4]) -> Bitmap {
        Bitmap::from_image(RgbaImage::from_pixel(width, height, Rgba(pixel))).unwrap()
    }

    fn whole(bitmap: &Bitmap) -> ViewportState {
        ViewportState::for_bitmap(bitmap.size())
    }

    #[test]
    fn density_sets_columns_and_container_sets_rows() {
        let image = Size::new(1000.0, 1000.0);
        let container = Size::new(400.0, 300.0);

        let coarse = RenderOptions::default().with_density(1);
        assert_eq!(grid_size(image, container, &coarse), (20, 8));

        let fine = RenderOptions::default().with_density(10);
        assert_eq!(grid_size(image, container, &fine), (200, 75));

        let clamped = RenderOptions::default().with_density(40);
        assert_eq!(grid_size(image, container, &clamped), (200, 75));
    }

    #[test]
    fn target_width_rows_follow_image_aspect() {
        let image = Size::new(400.0, 200.0);
        let container = Size::new(100.0, 900.0);
        let options = RenderOptions::default().with_target_width(160);
        assert_eq!(grid_size(image, container, &options), (160, 40));

        let options = options.with_target_height(12);
        assert_eq!(grid_size(image, container, &options), (160, 12));

        let options = RenderOptions::default().with_target_width(160).with_cell_aspect(1.0);
        assert_eq!(grid_size(image, container, &options), (160, 80));
    }

    #[test]
    fn grids_never_collapse_to_zero() {
        let options = RenderOptions::default().with_target_width(0);
        assert_eq!(grid_size(Size::new(1000.0, 1.0), Size::new(1.0, 1.0), &options), (1, 1));
    }

    #[test]
    fn sampled_grid_matches_formula() {
        let bitmap = solid(64, 48, [90, 90, 90, 255]);
        let viewport = ViewportState::new(Size::new(320.0, 240.0));

        let grid = sample(&bitmap, &viewport, &RenderOptions::default().with_density(1)).unwrap();
        assert_eq!((grid.width(), grid.height()), (20, 8));
        assert!(grid.rows().all(|row| row.len() == 20));

        let grid = sample(&bitmap, &whole(&bitmap), &RenderOptions::default().with_target_width(160)).unwrap();
        assert_eq!((grid.width(), grid.height()), (160, 60));
    }

    #[test]
    fn black_is_space_and_white_is_at() {
        let options = RenderOptions::default().with_ramp(CharacterRamp::dots()).with_density(1);

        let black = solid(10, 10, [0, 0, 0, 255]);
        let grid = sample(&black, &whole(&black), &options).unwrap();
        assert!(grid.cells().iter().all(|cell| cell.ch == ' '));

        let white = solid(10, 10, [255, 255, 255, 255]);
        let grid = sample(&white, &whole(&white), &options).unwrap();
        assert!(grid.cells().iter().all(|cell| cell.ch == '@'));
    }

    #[test]
    fn sampling_is_deterministic() {
        let mut pixels = RgbaImage::new(37, 23);
        for (x, y, pixel) in pixels.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 7) as u8, (y * 11) as u8, ((x + y) * 3) as u8, 200 + (x % 50) as u8]);
        }
        let bitmap = Bitmap::from_image(pixels).unwrap();
        let viewport = ViewportState::new(Size::new(120.0, 90.0)).with_zoom(1.7).with_pan(-13.0, 4.5);
        let options = RenderOptions::default().with_color(true).with_contrast(2.5).with_density(4);

        let first = sample(&bitmap, &viewport, &options).unwrap();
        let second = sample(&bitmap, &viewport, &options).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.plain(), second.plain());
    }

    #[test]
    fn color_and_opacity_are_independent() {
        let bitmap = solid(4, 4, [200, 40, 10, 255]);
        let base = RenderOptions::default().with_color(false).with_target_width(2).with_target_height(2);

        let plain = sample(&bitmap, &whole(&bitmap), &base.clone().with_alpha_as_opacity(false)).unwrap();
        assert!(plain.cells().iter().all(|cell| cell.style.is_plain()));

        let colored =
            sample(&bitmap, &whole(&bitmap), &base.clone().with_color(true).with_alpha_as_opacity(false)).unwrap();
        assert!(colored.cells().iter().all(|cell| cell.style == CellStyle::Color { rgb: [200, 40, 10] }));

        let both = sample(&bitmap, &whole(&bitmap), &base.with_color(true)).unwrap();
        assert!(both
            .cells()
            .iter()
            .all(|cell| cell.style == CellStyle::ColorOpacity { rgb: [200, 40, 10], opacity: 1.0 }));
    }

    #[test]
    fn alpha_becomes_opacity_without_changing_glyphs() {
        let opaque = solid(4, 4, [255, 255, 255, 255]);
        let faded = solid(4, 4, [255, 255, 255, 128]);
        let options = RenderOptions::default().with_color(false).with_target_width(2).with_target_height(2);

        let a = sample(&opaque, &whole(&opaque), &options).unwrap();
        let b = sample(&faded, &whole(&faded), &options).unwrap();
        assert_eq!(a.plain(), b.plain());
        assert!(b.cells().iter().all(|cell| cell.style == CellStyle::Opacity { opacity: 128.0 / 255.0 }));
    }

    #[test]
    fn transparent_and_off_image_cells_are_blank() {
        let clear = solid(8, 8, [255, 255, 255, 0]);
        let options = RenderOptions::default().with_target_width(4).with_target_height(4);
        let grid = sample(&clear, &whole(&clear), &options).unwrap();
        assert!(grid.is_blank());

        // a wide white strip in a square container leaves empty bands above and below
        let strip = solid(40, 10, [255, 255, 255, 255]);
        let viewport = ViewportState::new(Size::new(40.0, 40.0));
        let grid = sample(&strip, &viewport, &RenderOptions::default().with_target_width(8).with_target_height(8))
            .unwrap();
        let rows: Vec<String> = grid.plain().lines().map(str::to_string).collect();
        assert_eq!(rows[0], "        ");
        assert_eq!(rows[7], "        ");
        assert_eq!(rows[4], "@@@@@@@@");
    }

    #[test]
    fn panning_the_image_away_leaves_a_blank_grid() {
        let white = solid(10, 10, [255, 255, 255, 255]);
        let viewport = whole(&white).with_pan(500.0, 0.0);
        let grid = sample(&white, &viewport, &RenderOptions::default().with_density(1)).unwrap();
        assert!(grid.is_blank());
    }

    #[test]
    fn zooming_into_a_quadrant_samples_only_that_quadrant() {
        // left half black, right half white
        let mut pixels = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        for (x, _, pixel) in pixels.enumerate_pixels_mut() {
            if x >= 10 {
                *pixel = Rgba([255, 255, 255, 255]);
            }
        }
        let bitmap = Bitmap::from_image(pixels).unwrap();
        let options = RenderOptions::default().with_target_width(4).with_target_height(4);

        // zoom 2 and pan left by half a container: the right half fills the view
        let viewport = whole(&bitmap).with_zoom(2.0).with_pan(-10.0, 0.0);
        let grid = sample(&bitmap, &viewport, &options).unwrap();
        assert!(grid.cells().iter().all(|cell| cell.ch == '@'), "{}", grid.plain());
    }

    #[test]
    fn extreme_zoom_stays_bounded_by_the_container() {
        let white = solid(2, 2, [255, 255, 255, 255]);
        let container = Size::new(800.0, 800.0);
        let options = RenderOptions::default().with_density(1);

        for zoom in [10.0, 1e7] {
            let viewport = ViewportState::new(container).with_zoom(zoom);
            assert_eq!(draw_viewport(&white, &viewport, 1.0).dimensions(), (800, 800));

            let grid = sample(&white, &viewport, &options).unwrap();
            assert_eq!((grid.width(), grid.height()), (20, 10));
            assert!(grid.cells().iter().all(|cell| cell.ch == '@'), "zoom {zoom}");
        }
    }

    #[test]
    fn magnified_pixels_land_where_the_viewport_puts_them() {
        // left column black, right column white; shown at 50..150 in a 200x100 canvas
        let mut pixels = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        pixels.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        pixels.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        let bitmap = Bitmap::from_image(pixels).unwrap();

        let canvas = draw_viewport(&bitmap, &ViewportState::new(Size::new(200.0, 100.0)), 1.0);
        assert_eq!(canvas.dimensions(), (200, 100));
        assert_eq!(canvas.get_pixel(49, 50), &Rgba([0, 0, 0, 0]));
        assert_eq!(canvas.get_pixel(50, 50), &Rgba([0, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(149, 50), &Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.get_pixel(150, 50), &Rgba([0, 0, 0, 0]));

        let middle = canvas.get_pixel(100, 50);
        assert_eq!(middle[3], 255);
        assert!(middle[0] > 100 && middle[0] < 160, "{middle:?}");
    }

    #[test]
    fn empty_container_is_rejected() {
        let bitmap = solid(2, 2, [0, 0, 0, 255]);
        let viewport = ViewportState::new(Size::new(0.0, 10.0));
        assert!(matches!(
            sample(&bitmap, &viewport, &RenderOptions::default()),
            Err(AsciiItError::EmptyInput(_))
        ));
    }

    #[test]
    fn contrast_never_lowers_the_index() {
        let ramp = CharacterRamp::dots();
        let contrasts = [1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0];
        for level in 0..=255u8 {
            let rgb = [level; 3];
            let indices: Vec<usize> = contrasts.iter().map(|&c| ramp_index(rgb, &ramp, c)).collect();
            assert!(indices.windows(2).all(|w| w[0] <= w[1]), "level {level}: {indices:?}");
        }
    }

    #[test]
    fn contrast_pushes_upper_midtones_toward_the_top() {
        let ramp = CharacterRamp::dots();
        let mid = [128, 128, 128];
        assert_eq!(ramp_index(mid, &ramp, 1.0), 4);
        assert!(ramp_index(mid, &ramp, 5.0) > 4);
        assert_eq!(ramp_index([0, 0, 0], &ramp, 5.0), 0);
        assert_eq!(ramp_index([255, 255, 255], &ramp, 1.0), 9);
    }

    #[test]
    fn brightness_is_a_floored_channel_average() {
        assert_eq!(brightness([0, 0, 0]), 0.0);
        assert_eq!(brightness([255, 255, 255]), 1.0);
        assert_eq!(brightness([255, 0, 1]), 85.0 / 255.0);
        assert_eq!(brightness([1, 1, 0]), 0.0);
    }
}
