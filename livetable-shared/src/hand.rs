use serde::{Deserialize, Serialize};

use crate::geometry::{angle_between, Point, Point2f, RotatedRect, Size};

/// A single detected finger: the two convexity defect points at its root
/// and the tip between them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Finger {
    pub base1: Point2f,
    pub base2: Point2f,
    pub tip: Point2f,
}

impl Finger {
    pub fn new(base1: Point2f, base2: Point2f, tip: Point2f) -> Self {
        Self { base1, base2, tip }
    }

    /// Interior angle at the tip, in radians
    pub fn angle(&self) -> f32 {
        angle_between(self.base1, self.base2, self.tip)
    }

    pub fn angle_degrees(&self) -> f32 {
        self.angle().to_degrees()
    }

    /// Distance from the farther base to the tip
    pub fn length(&self) -> f32 {
        self.base1
            .distance_to(&self.tip)
            .max(self.base2.distance_to(&self.tip))
    }
}

/// One recognized hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandData {
    pub palm_radius: i32,
    pub palm_center: Point,
    /// Ellipse fitted to the whole contour, arm included
    pub contour_bounds: RotatedRect,
    /// The part of the contour considered for convexity defects
    pub convexity_defect_area: RotatedRect,
    pub finger_tips: Vec<Finger>,
}

/// Result of analyzing one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameWithHands {
    /// Capture time, unix seconds
    pub time: i64,
    pub image_size: Size,
    pub hands: Vec<HandData>,
}

impl FrameWithHands {
    pub fn new(time: i64, image_size: Size, hands: Vec<HandData>) -> Self {
        Self {
            time,
            image_size,
            hands,
        }
    }

    pub fn finger_count(&self) -> usize {
        self.hands.iter().map(|h| h.finger_tips.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finger_angle_and_length() {
        let finger = Finger::new(
            Point2f::new(0.0, 100.0),
            Point2f::new(20.0, 100.0),
            Point2f::new(10.0, 0.0),
        );
        assert!(finger.angle_degrees() < 15.0);
        assert!((finger.length() - (100.0f32 * 100.0 + 10.0 * 10.0).sqrt()).abs() < 1e-3);
    }

    #[test]
    fn test_finger_equality_is_structural() {
        let a = Finger::new(
            Point2f::new(1.0, 2.0),
            Point2f::new(3.0, 4.0),
            Point2f::new(5.0, 6.0),
        );
        let b = Finger::new(
            Point2f::new(1.0, 2.0),
            Point2f::new(3.0, 4.0),
            Point2f::new(5.0, 6.0),
        );
        let swapped = Finger::new(b.base2, b.base1, b.tip);
        assert_eq!(a, b);
        assert_ne!(a, swapped);
    }

    #[test]
    fn test_frame_serializes_camel_case() {
        let frame = FrameWithHands::new(
            1_400_000_000,
            Size::new(640, 480),
            vec![HandData {
                palm_radius: 40,
                palm_center: Point::new(100, 120),
                contour_bounds: RotatedRect::default(),
                convexity_defect_area: RotatedRect::default(),
                finger_tips: vec![],
            }],
        );
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["imageSize"]["width"], 640);
        assert_eq!(json["hands"][0]["palmRadius"], 40);
        assert_eq!(json["hands"][0]["palmCenter"]["y"], 120);
        assert!(json["hands"][0]["fingerTips"].as_array().unwrap().is_empty());
    }
}
