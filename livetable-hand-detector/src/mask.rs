//! Turning camera frames into binary foreground masks.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::distance_transform::Norm;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::filter::median_filter;
use imageproc::morphology::dilate;
use imageproc::rect::Rect;
use livetable_shared::{HandOptions, ThresholdType};

/// Applies a fixed-level threshold to every pixel
pub fn threshold(gray: &GrayImage, level: u8, max: u8, kind: ThresholdType) -> GrayImage {
    let level = match kind {
        ThresholdType::Otsu => otsu_level(gray),
        _ => level,
    };
    let mut out = gray.clone();
    for px in out.pixels_mut() {
        let v = px.0[0];
        px.0[0] = match kind {
            ThresholdType::Binary | ThresholdType::Otsu => {
                if v > level {
                    max
                } else {
                    0
                }
            }
            ThresholdType::BinaryInverted => {
                if v > level {
                    0
                } else {
                    max
                }
            }
            ThresholdType::Truncate => v.min(level),
            ThresholdType::ToZero => {
                if v > level {
                    v
                } else {
                    0
                }
            }
            ThresholdType::ToZeroInverted => {
                if v > level {
                    0
                } else {
                    v
                }
            }
        };
    }
    out
}

/// Median blur with an odd `kernel` size, 1 or less leaves the image as is
pub fn median_blur(gray: &GrayImage, kernel: u32) -> GrayImage {
    if kernel <= 1 {
        return gray.clone();
    }
    let radius = kernel / 2;
    median_filter(gray, radius, radius)
}

/// Blur then threshold, the shared first stage of both pipelines
pub fn blur_and_threshold(
    gray: &GrayImage,
    kernel: u32,
    level: u8,
    max: u8,
    kind: ThresholdType,
) -> GrayImage {
    threshold(&median_blur(gray, kernel), level, max, kind)
}

/// Sets every non-zero pixel to 255
pub fn binarize(mask: &mut GrayImage) {
    for px in mask.pixels_mut() {
        if px.0[0] != 0 {
            px.0[0] = 255;
        }
    }
}

/// Blacks out a band of `width` pixels along all four image edges
pub fn crop_border(mask: &mut GrayImage, width: u32) {
    let (w, h) = mask.dimensions();
    if width == 0 || w == 0 || h == 0 {
        return;
    }
    let bw = width.min(w);
    let bh = width.min(h);
    let black = Luma([0u8]);
    draw_filled_rect_mut(mask, Rect::at(0, 0).of_size(w, bh), black);
    draw_filled_rect_mut(mask, Rect::at(0, (h - bh) as i32).of_size(w, bh), black);
    draw_filled_rect_mut(mask, Rect::at(0, 0).of_size(bw, h), black);
    draw_filled_rect_mut(mask, Rect::at((w - bw) as i32, 0).of_size(bw, h), black);
}

/// Grayscale, median blur, threshold, dilate and crop a color frame into the
/// binary mask the hand contours are traced on
pub fn prepare_for_contour_detection(color: &RgbImage, opts: &HandOptions) -> GrayImage {
    let gray = image::imageops::grayscale(color);
    let thresholded = blur_and_threshold(
        &gray,
        opts.blur_intensity,
        opts.threshold_min,
        opts.threshold_max,
        opts.threshold_type,
    );

    let mut mask = if opts.dilate_iterations > 0 {
        // k passes of a 3x3 dilation reach exactly the pixels within
        // chessboard distance k
        dilate(&thresholded, Norm::LInf, opts.dilate_iterations)
    } else {
        thresholded
    };
    binarize(&mut mask);
    crop_border(&mut mask, opts.crop_width);
    mask
}
