//! Foreground segmentation from a depth frame and a depth background.
//!
//! The difference between a frame of the empty table and the live depth frame
//! is normalized with percentile clipping, optionally box blurred, and
//! thresholded into a binary mask.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::box_filter;
use livetable_shared::{DepthOptions, Size};

use crate::DetectorError;

/// Single channel depth buffer, any unit
pub type DepthImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Rescales `values` into 0..=1, mapping the `percentile`-th lowest sample to
/// 0 and the `percentile`-th highest to 1 and clipping everything beyond.
/// Constant input becomes all zeros.
pub fn normalize_percentile(values: &mut [f32], percentile: f32) {
    let n = values.len();
    if n == 0 {
        return;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let idx = ((percentile.max(0.0) / 100.0 * n as f32).ceil() as usize).min((n - 1) / 2);
    let low = sorted[idx];
    let high = sorted[n - 1 - idx];
    let range = high - low;

    for v in values.iter_mut() {
        *v = if range > 0.0 && range.is_finite() {
            ((*v - low) / range).clamp(0.0, 1.0)
        } else {
            0.0
        };
        if v.is_nan() {
            *v = 0.0;
        }
    }
}

/// Per-pixel `background - depth`, positive where something is closer to the
/// camera than the empty table
pub fn depth_difference(
    depth: &DepthImage,
    background: &DepthImage,
) -> Result<DepthImage, DetectorError> {
    if depth.dimensions() != background.dimensions() {
        return Err(DetectorError::SizeMismatch {
            what: "depth background",
            expected: Size::new(depth.width(), depth.height()),
            actual: Size::new(background.width(), background.height()),
        });
    }
    Ok(ImageBuffer::from_fn(depth.width(), depth.height(), |x, y| {
        Luma([background.get_pixel(x, y).0[0] - depth.get_pixel(x, y).0[0]])
    }))
}

/// Binary mask of everything that stands out from the depth background
pub fn depth_mask(
    depth: &DepthImage,
    background: &DepthImage,
    opts: &DepthOptions,
) -> Result<GrayImage, DetectorError> {
    let mut diff = depth_difference(depth, background)?;
    normalize_percentile(&mut diff, opts.depth_percentile);

    let mut scaled: GrayImage = ImageBuffer::from_fn(diff.width(), diff.height(), |x, y| {
        Luma([(diff.get_pixel(x, y).0[0] * 255.0).round() as u8])
    });
    if opts.depth_blur > 1 {
        let radius = opts.depth_blur / 2;
        scaled = box_filter(&scaled, radius, radius);
    }

    let level = (opts.depth_threshold.clamp(0.0, 1.0) * 255.0).round() as u8;
    for px in scaled.pixels_mut() {
        px.0[0] = if px.0[0] > level { 255 } else { 0 };
    }
    Ok(scaled)
}

/// Keeps only pixels set in both masks
pub fn intersect_masks(mask: &mut GrayImage, other: &GrayImage) -> Result<(), DetectorError> {
    if mask.dimensions() != other.dimensions() {
        return Err(DetectorError::SizeMismatch {
            what: "depth mask",
            expected: Size::new(mask.width(), mask.height()),
            actual: Size::new(other.width(), other.height()),
        });
    }
    for (px, o) in mask.pixels_mut().zip(other.pixels()) {
        if o.0[0] == 0 {
            px.0[0] = 0;
        }
    }
    Ok(())
}
