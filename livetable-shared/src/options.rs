//! Tunable parameters of the detection pipelines.
//!
//! All constants here were tuned empirically against the table's cameras.
//! Every bundle deserializes from a partial document (missing keys keep their
//! defaults) and must pass `validate()` before it is handed to a pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionsError {
    #[error("{name} must be an odd kernel size, got {value}")]
    EvenKernel { name: &'static str, value: u32 },

    #[error("{name} must be at least 1")]
    Zero { name: &'static str },

    #[error("{name} = {value} is outside {min}..={max}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("angle window is empty: min {min} >= max {max}")]
    EmptyAngleWindow { min: f32, max: f32 },
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), OptionsError> {
    // written this way round so NaN is rejected too
    if !(value >= min && value <= max) {
        return Err(OptionsError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn check_odd_kernel(name: &'static str, value: u32) -> Result<(), OptionsError> {
    if value % 2 == 0 {
        return Err(OptionsError::EvenKernel { name, value });
    }
    Ok(())
}

fn check_nonzero(name: &'static str, value: u32) -> Result<(), OptionsError> {
    if value == 0 {
        return Err(OptionsError::Zero { name });
    }
    Ok(())
}

/// How a gray level is mapped by the threshold step. The original OpenCV
/// constant names are accepted as aliases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdType {
    /// `v > level ? max : 0`
    #[default]
    #[serde(alias = "CV_THRESH_BINARY")]
    Binary,
    /// `v > level ? 0 : max`
    #[serde(alias = "CV_THRESH_BINARY_INV")]
    BinaryInverted,
    /// `v > level ? level : v`
    #[serde(alias = "CV_THRESH_TRUNC")]
    Truncate,
    /// `v > level ? v : 0`
    #[serde(alias = "CV_THRESH_TOZERO")]
    ToZero,
    /// `v > level ? 0 : v`
    #[serde(alias = "CV_THRESH_TOZERO_INV")]
    ToZeroInverted,
    /// Binary, with the level picked by Otsu's method
    #[serde(alias = "CV_THRESH_OTSU")]
    Otsu,
}

/// Depth-difference segmentation, used when a frame carries depth data and a
/// depth background
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DepthOptions {
    /// Percentage of samples clipped at each end when normalizing
    pub depth_percentile: f32,
    /// Box blur kernel applied to the normalized difference, 0 disables it
    pub depth_blur: u32,
    /// Normalized difference a pixel needs to count as foreground, 0 means any
    pub depth_threshold: f32,
}

impl Default for DepthOptions {
    fn default() -> Self {
        Self {
            depth_percentile: 5.0,
            depth_blur: 0,
            depth_threshold: 0.0,
        }
    }
}

impl DepthOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        check_range("depthPercentile", self.depth_percentile, 0.0, 49.0)?;
        check_range("depthThreshold", self.depth_threshold, 0.0, 1.0)?;
        Ok(())
    }
}

/// Parameters of the hand pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HandOptions {
    /// Median blur kernel size (odd)
    pub blur_intensity: u32,
    pub threshold_min: u8,
    pub threshold_max: u8,
    pub threshold_type: ThresholdType,
    /// Passes of a 3x3 dilation
    pub dilate_iterations: u8,
    /// Width of the band blacked out along every image edge
    pub crop_width: u32,
    /// Contours enclosing less than this share of the image are noise...
    pub min_hand_area_in_percent: f32,
    /// ...unless they have at least this many points (thin, outstretched shapes)
    pub large_contour_points: usize,
    /// Distance from the image edges inside which a contour is "in frame";
    /// contour points outside it mark where the arm enters
    pub edge_offset: u32,
    /// Short/long side ratio of the contour bounds above which the blob is
    /// considered wide enough to use its long side as palm window length
    pub palm_ratio_cutoff: f32,
    /// Scale applied to the short side of narrow blobs instead
    pub narrow_palm_scale: f32,
    /// How far the palm center is moved from the palm window center towards
    /// the pointing direction
    pub palm_center_bias: f32,
    /// How far apart two hull points may lie and still be one fingertip
    pub finger_tip_width: f32,
    /// Convexity defects shallower than this are contour noise, not finger gaps
    pub min_defect_depth: f32,
    /// Fingers with a wider tip angle (degrees) are rejected
    pub max_finger_angle: f32,
    /// Frames larger than this are scaled down before analysis, 0 disables
    pub max_image_width: u32,
    pub max_image_height: u32,
    pub depth: DepthOptions,
}

impl Default for HandOptions {
    fn default() -> Self {
        Self {
            blur_intensity: 11,
            threshold_min: 120,
            threshold_max: 255,
            threshold_type: ThresholdType::BinaryInverted,
            dilate_iterations: 5,
            crop_width: 12,
            min_hand_area_in_percent: 2.0,
            large_contour_points: 500,
            edge_offset: 35,
            palm_ratio_cutoff: 0.3,
            narrow_palm_scale: 1.6,
            palm_center_bias: 0.5,
            finger_tip_width: 50.0,
            min_defect_depth: 10.0,
            max_finger_angle: 89.0,
            max_image_width: 1000,
            max_image_height: 1000,
            depth: DepthOptions::default(),
        }
    }
}

impl HandOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        check_odd_kernel("blurIntensity", self.blur_intensity)?;
        check_range("minHandAreaInPercent", self.min_hand_area_in_percent, 0.0, 100.0)?;
        check_range("palmRatioCutoff", self.palm_ratio_cutoff, 0.0, 1.0)?;
        check_range("narrowPalmScale", self.narrow_palm_scale, 0.01, 100.0)?;
        // 1.0 would put the palm center onto the window border
        check_range("palmCenterBias", self.palm_center_bias, 0.0, 0.95)?;
        check_range("fingerTipWidth", self.finger_tip_width, 0.0, f32::MAX)?;
        check_range("minDefectDepth", self.min_defect_depth, 0.0, f32::MAX)?;
        check_range("maxFingerAngle", self.max_finger_angle, 0.0, 180.0)?;
        self.depth.validate()
    }
}

/// Line intersection filter of the quad detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuadOptions {
    pub min_angle_of_intersecting_lines: f32,
    pub max_angle_of_intersecting_lines: f32,
}

impl Default for QuadOptions {
    fn default() -> Self {
        Self {
            min_angle_of_intersecting_lines: 70.0,
            max_angle_of_intersecting_lines: 130.0,
        }
    }
}

impl QuadOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        let (min, max) = (
            self.min_angle_of_intersecting_lines,
            self.max_angle_of_intersecting_lines,
        );
        check_range("minAngleOfIntersectingLines", min, 0.0, 180.0)?;
        check_range("maxAngleOfIntersectingLines", max, 0.0, 180.0)?;
        if min >= max {
            return Err(OptionsError::EmptyAngleWindow { min, max });
        }
        Ok(())
    }
}

/// Parameters of the screen (largest quadrilateral) detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScreenOptions {
    pub blur_intensity: u32,
    pub min_threshold: u8,
    pub max_threshold: u8,
    pub threshold_type: ThresholdType,
    /// Votes a Hough line needs
    pub hough_threshold: u32,
    /// Radius of the non-maximum suppression in Hough space
    pub hough_suppression_radius: u32,
    /// Absolute minimum segment length in pixels, 0 disables it
    pub hough_min_line_length: u32,
    /// Largest run of missing pixels bridged inside one segment
    pub hough_max_line_gap: u32,
    /// Minimum segment length relative to the smaller image side
    pub min_line_length_ratio: f32,
    /// Stroke width the screen outline is drawn with before line detection
    pub hull_line_thickness: u32,
    pub quad_options: QuadOptions,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self {
            blur_intensity: 21,
            min_threshold: 100,
            max_threshold: 245,
            threshold_type: ThresholdType::Binary,
            hough_threshold: 170,
            hough_suppression_radius: 8,
            hough_min_line_length: 0,
            hough_max_line_gap: 3,
            min_line_length_ratio: 0.2,
            hull_line_thickness: 3,
            quad_options: QuadOptions::default(),
        }
    }
}

impl ScreenOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        check_odd_kernel("blurIntensity", self.blur_intensity)?;
        check_nonzero("houghThreshold", self.hough_threshold)?;
        check_nonzero("hullLineThickness", self.hull_line_thickness)?;
        check_range("minLineLengthRatio", self.min_line_length_ratio, 0.0, 1.0)?;
        self.quad_options.validate()
    }
}
