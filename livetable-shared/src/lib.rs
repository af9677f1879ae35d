//! Data model shared between the Live Table detector and its hosts.
//!
//! Everything in here is a plain value type that serializes to the JSON records
//! the table frontend consumes (camelCase field names).

pub mod geometry;
pub mod hand;
pub mod options;
pub mod screen;

pub use geometry::{angle_between, Point, Point2f, RotatedRect, Size, Size2f};
pub use hand::{Finger, FrameWithHands, HandData};
pub use options::{
    DepthOptions, HandOptions, OptionsError, QuadOptions, ScreenOptions, ThresholdType,
};
pub use screen::{Corners, ProjectionResponse, ScreenCornersResponse};
