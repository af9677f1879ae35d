use serde::{Deserialize, Serialize};

use crate::geometry::{Point2f, Size};

/// The four corners of a detected screen quadrilateral
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Corners {
    pub top_left: Point2f,
    pub top_right: Point2f,
    pub bottom_right: Point2f,
    pub bottom_left: Point2f,
}

impl Corners {
    pub fn new(
        top_left: Point2f,
        top_right: Point2f,
        bottom_right: Point2f,
        bottom_left: Point2f,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// Builds corners from `[tlX, tlY, trX, trY, brX, brY, blX, blY]`
    pub fn from_flat(v: [f32; 8]) -> Self {
        Self::new(
            Point2f::new(v[0], v[1]),
            Point2f::new(v[2], v[3]),
            Point2f::new(v[4], v[5]),
            Point2f::new(v[6], v[7]),
        )
    }

    /// Clockwise starting at the top left
    pub fn to_array(&self) -> [Point2f; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }
}

/// Answer of a screen corner recognition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenCornersResponse {
    pub corners: Corners,
    pub size: Size,
}

/// A 3x3 projection matrix, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResponse {
    pub projection: [f32; 9],
}
