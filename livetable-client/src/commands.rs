//! One-shot detections behind the CLI subcommands.

use std::path::Path;

use anyhow::{bail, Context, Result};
use livetable_hand_detector::{
    corner_transform, corners_of_largest_rect, screen_projection, warp_perspective,
    HandDetector, Homography,
};
use livetable_shared::{
    Corners, FrameWithHands, ProjectionResponse, ScreenCornersResponse, Size,
};

use crate::config::Config;
use crate::source::{load_color, load_frame};

/// Nine row-major values into a homography
pub fn parse_projection(values: &[f32]) -> Result<Homography> {
    let Ok(m) = <[f32; 9]>::try_from(values) else {
        bail!("A projection needs 9 values, got {}", values.len());
    };
    Ok(Homography::from_row_major(m))
}

/// `tlX,tlY,trX,trY,brX,brY,blX,blY` into corners
pub fn parse_corners(values: &[f32]) -> Result<Corners> {
    let Ok(v) = <[f32; 8]>::try_from(values) else {
        bail!("Corners need 8 values, got {}", values.len());
    };
    Ok(Corners::from_flat(v))
}

pub fn hands(
    config: &Config,
    image: &Path,
    depth: Option<&Path>,
    depth_background: Option<&Path>,
    projection: Homography,
) -> Result<FrameWithHands> {
    let detector = HandDetector::new()
        .with_options(config.hand.clone())?
        .with_projection(projection);
    let frame = load_frame(image, depth, depth_background)?;
    detector
        .process_frame(frame)
        .with_context(|| format!("Hand detection failed on {}", image.display()))
}

/// Screen corners in `image`, `None` when no quadrilateral was found
pub fn corners(config: &Config, image: &Path) -> Result<Option<ScreenCornersResponse>> {
    let photo = image::open(image)
        .with_context(|| format!("Failed to read image {}", image.display()))?;
    let size = Size::new(photo.width(), photo.height());
    let corners = corners_of_largest_rect(&photo, &config.screen)?;
    Ok(corners.map(|corners| ScreenCornersResponse { corners, size }))
}

/// Projection rectifying the screen in `image` onto `size`
pub fn projection(config: &Config, image: &Path, size: Size) -> Result<ProjectionResponse> {
    let photo = image::open(image)
        .with_context(|| format!("Failed to read image {}", image.display()))?;
    Ok(screen_projection(&photo, size, &config.screen)?.into())
}

/// Projection taking user supplied corners onto `size`
pub fn transform(corners: &Corners, size: Size) -> Result<ProjectionResponse> {
    match corner_transform(corners, size) {
        Some(h) => Ok(h.into()),
        None => bail!("Corners {:?} don't span a quadrilateral", corners.to_array()),
    }
}

pub fn warp(image: &Path, projection: &Homography, size: Size, output: &Path) -> Result<()> {
    let color = load_color(image)?;
    let warped = warp_perspective(&color, projection, size)?;
    warped
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("wrote {}", output.display());
    Ok(())
}
