//! Finding the projected screen (the largest bright quadrilateral) in a camera
//! image and the projection that rectifies it.

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use livetable_shared::{Corners, Point, ScreenOptions, Size};

use crate::contours::{extract_contours, Contour};
use crate::geometry::convex_hull;
use crate::homography::Homography;
use crate::lines::{detect_line_segments, LineSegment};
use crate::mask::blur_and_threshold;
use crate::projector::warp_perspective;
use crate::quad::{corner_transform, find_corners};
use crate::DetectorError;

/// Grayscale, blur and threshold a screen photo
pub fn prepare_screen_image(image: &DynamicImage, opts: &ScreenOptions) -> GrayImage {
    blur_and_threshold(
        &image.to_luma8(),
        opts.blur_intensity,
        opts.min_threshold,
        opts.max_threshold,
        opts.threshold_type,
    )
}

/// Contour enclosing the largest area, holes included
pub fn largest_contour(mask: &GrayImage) -> Option<Contour> {
    extract_contours(mask)
        .into_iter()
        .map(|c| (c.area(), c))
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, c)| c)
}

/// Closed outline through `points`, drawn with a square brush of
/// `thickness` pixels onto a black `size` image
pub fn draw_outline(points: &[Point], size: Size, thickness: u32) -> GrayImage {
    let mut canvas = GrayImage::new(size.width, size.height);
    let reach = (thickness / 2) as i32;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                draw_line_segment_mut(
                    &mut canvas,
                    ((a.x + dx) as f32, (a.y + dy) as f32),
                    ((b.x + dx) as f32, (b.y + dy) as f32),
                    Luma([255u8]),
                );
            }
        }
    }
    canvas
}

/// Line segments along the convex hull of the largest bright region
pub fn find_lines_of_largest_rect(image: &DynamicImage, opts: &ScreenOptions) -> Vec<LineSegment> {
    let mask = prepare_screen_image(image, opts);
    let Some(contour) = largest_contour(&mask) else {
        log::debug!("no bright region in screen image");
        return Vec::new();
    };
    let hull = convex_hull(&contour.points);
    let outline = draw_outline(
        &hull,
        Size::new(mask.width(), mask.height()),
        opts.hull_line_thickness,
    );
    detect_line_segments(&outline, opts)
}

/// Corners of the largest quadrilateral, `None` when fewer than four were found
pub fn corners_of_largest_rect(
    image: &DynamicImage,
    opts: &ScreenOptions,
) -> Result<Option<Corners>, DetectorError> {
    opts.validate()?;
    let lines = find_lines_of_largest_rect(image, opts);
    let size = Size::new(image.width(), image.height());
    let corners = find_corners(&lines, size, &opts.quad_options);
    match &corners {
        Some(c) => log::debug!("screen corners {:?}", c.to_array()),
        None => log::debug!("no screen quadrilateral among {} segments", lines.len()),
    }
    Ok(corners)
}

/// Homography from the camera image onto a `size` screen. Falls back to the
/// identity when no quadrilateral is found.
pub fn screen_projection(
    image: &DynamicImage,
    size: Size,
    opts: &ScreenOptions,
) -> Result<Homography, DetectorError> {
    let corners = corners_of_largest_rect(image, opts)?;
    Ok(corners
        .and_then(|c| corner_transform(&c, size))
        .unwrap_or_else(|| {
            log::warn!("screen not found, projecting with the identity");
            Homography::identity()
        }))
}

/// The screen area of `image`, rectified into a `size` image
pub fn extract_largest_rectangle(
    image: &DynamicImage,
    size: Size,
    opts: &ScreenOptions,
) -> Result<RgbImage, DetectorError> {
    let projection = screen_projection(image, size, opts)?;
    warp_perspective(&image.to_rgb8(), &projection, size)
}
