use std::time::{SystemTime, UNIX_EPOCH};

use image::GrayImage;
use livetable_shared::{FrameWithHands, HandData, HandOptions, Size};

use crate::contours::{find_candidates, Candidate};
use crate::depth::{depth_mask, intersect_masks};
use crate::fingertips::{analyze_hull, find_finger_tips};
use crate::frame::Frame;
use crate::hand_contour::find_hand_contour;
use crate::homography::Homography;
use crate::mask::prepare_for_contour_detection;
use crate::projector::warp_perspective;
use crate::DetectorError;

/// Current unix time in seconds
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Full hand analysis of one candidate contour
pub fn hand_data_for(candidate: &Candidate, image: Size, opts: &HandOptions) -> Option<HandData> {
    let hand = find_hand_contour(&candidate.points, &candidate.bounds, image, opts)?;
    let hull = analyze_hull(&hand);
    let finger_tips = find_finger_tips(&hull.defects, opts);
    log::trace!(
        "hand at {:?}: {} defects, {} fingers",
        hand.palm_center,
        hull.defects.len(),
        finger_tips.len()
    );
    Some(HandData {
        palm_radius: hand.finger_radius,
        palm_center: hand.palm_center,
        contour_bounds: hand.bounds,
        convexity_defect_area: hand.window,
        finger_tips,
    })
}

/// Hands on a binary mask, in contour order
pub fn detect_hands(mask: &GrayImage, opts: &HandOptions) -> Vec<HandData> {
    let size = Size::new(mask.width(), mask.height());
    find_candidates(mask, opts)
        .iter()
        .filter_map(|c| hand_data_for(c, size, opts))
        .collect()
}

/// Hand detector over camera frames
///
/// Frames are scaled down to the configured maximum size, projected with the
/// screen projection, segmented and searched for hands.
#[derive(Debug, Clone, Default)]
pub struct HandDetector {
    options: HandOptions,
    projection: Homography,
}

impl HandDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options are checked here, once, instead of on every frame
    pub fn with_options(mut self, options: HandOptions) -> Result<Self, DetectorError> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    pub fn with_projection(mut self, projection: Homography) -> Self {
        self.projection = projection;
        self
    }

    pub fn options(&self) -> &HandOptions {
        &self.options
    }

    pub fn projection(&self) -> &Homography {
        &self.projection
    }

    /// Hands in a prepared binary mask, stamped with the current time
    pub fn find_hands(&self, mask: &GrayImage) -> FrameWithHands {
        FrameWithHands::new(
            unix_now(),
            Size::new(mask.width(), mask.height()),
            detect_hands(mask, &self.options),
        )
    }

    /// Foreground mask of a frame, after resizing and projection
    pub fn frame_mask(&self, frame: Frame) -> Result<GrayImage, DetectorError> {
        frame.check_sizes()?;
        let opts = &self.options;
        let frame = frame.resized_to_fit(opts.max_image_width, opts.max_image_height);
        let frame = if self.projection.is_identity() {
            frame
        } else {
            project(frame, &self.projection)?
        };

        let mut mask = prepare_for_contour_detection(&frame.color, opts);
        if let (Some(depth), Some(background)) = (&frame.depth, &frame.depth_background) {
            let foreground = depth_mask(depth, background, &opts.depth)?;
            intersect_masks(&mut mask, &foreground)?;
        }
        Ok(mask)
    }

    pub fn process_frame(&self, frame: Frame) -> Result<FrameWithHands, DetectorError> {
        let mask = self.frame_mask(frame)?;
        let result = self.find_hands(&mask);
        log::debug!(
            "{} hands, {} fingers in {}x{} frame",
            result.hands.len(),
            result.finger_count(),
            result.image_size.width,
            result.image_size.height
        );
        Ok(result)
    }
}

fn project(frame: Frame, projection: &Homography) -> Result<Frame, DetectorError> {
    let size = frame.size();
    Ok(Frame {
        color: warp_perspective(&frame.color, projection, size)?,
        depth: frame
            .depth
            .map(|d| warp_perspective(&d, projection, size))
            .transpose()?,
        depth_background: frame
            .depth_background
            .map(|d| warp_perspective(&d, projection, size))
            .transpose()?,
    })
}

/// One-shot hand detection on a frame with explicit options and projection
pub fn process_frame(
    frame: Frame,
    projection: &Homography,
    opts: &HandOptions,
) -> Result<FrameWithHands, DetectorError> {
    HandDetector::new()
        .with_options(opts.clone())?
        .with_projection(*projection)
        .process_frame(frame)
}
