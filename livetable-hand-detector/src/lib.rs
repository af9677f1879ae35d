//! Hand and screen detection for the Live Table
//!
//! Two pipelines share the image plumbing in here:
//! - hands: segment a camera frame into a foreground mask, find hand shaped
//!   contours and derive palm and fingertips from their convexity defects
//! - screen: find the projected screen as the largest bright quadrilateral and
//!   compute the homography that rectifies it
//!
//! Everything is pure Rust on top of `image`/`imageproc`, no native vision
//! library is needed.

pub mod contours;
pub mod depth;
pub mod fingertips;
pub mod frame;
pub mod geometry;
pub mod hand_contour;
pub mod hands;
pub mod homography;
pub mod lines;
pub mod mask;
pub mod projector;
pub mod quad;
pub mod screen;

use livetable_shared::{OptionsError, Size};
use thiserror::Error;

pub use depth::DepthImage;
pub use frame::Frame;
pub use hands::{detect_hands, process_frame, HandDetector};
pub use homography::Homography;
pub use projector::warp_perspective;
pub use quad::corner_transform;
pub use screen::{
    corners_of_largest_rect, extract_largest_rectangle, find_lines_of_largest_rect,
    screen_projection,
};

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("invalid options: {0}")]
    InvalidOptions(#[from] OptionsError),

    #[error(
        "{what} is {}x{} but the frame is {}x{}",
        .actual.width,
        .actual.height,
        .expected.width,
        .expected.height
    )]
    SizeMismatch {
        what: &'static str,
        expected: Size,
        actual: Size,
    },

    #[error("projection matrix is not invertible")]
    SingularHomography,
}
