//! Locating the arm, the pointing direction and the palm on a hand contour.
//!
//! A hand on the table always enters the camera view from one of the image
//! edges. The contour points within `edge_offset` of the edges mark where the
//! arm comes in; the contour point farthest from there is where the hand
//! points to. The palm lies along that direction, so only the contour points
//! within one palm length of the pointing end are kept.

use livetable_shared::{HandOptions, Point, RotatedRect, Size};

use crate::geometry::min_area_rect;

/// Hand region of a contour
#[derive(Debug, Clone, PartialEq)]
pub struct HandContour {
    /// Fitted ellipse of the whole contour
    pub bounds: RotatedRect,
    /// Contour points belonging to the hand, in contour order
    pub points: Vec<Point>,
    pub arm_start: Point,
    pub pointing_to: Point,
    /// Minimum-area rectangle around `points`
    pub window: RotatedRect,
    pub finger_radius: i32,
    pub palm_center: Point,
}

fn near_edge(p: Point, image: Size, offset: u32) -> bool {
    let offset = offset as i64;
    let (x, y) = (p.x as i64, p.y as i64);
    x < offset || y < offset || x >= image.width as i64 - offset || y >= image.height as i64 - offset
}

/// Runs the arm/palm heuristic on one contour. Contours that never come close
/// to an image edge, and degenerate shapes whose palm collapses to a line,
/// yield `None`.
pub fn find_hand_contour(
    contour: &[Point],
    bounds: &RotatedRect,
    image: Size,
    opts: &HandOptions,
) -> Option<HandContour> {
    let edge_points: Vec<Point> = contour
        .iter()
        .copied()
        .filter(|p| near_edge(*p, image, opts.edge_offset))
        .collect();
    if edge_points.is_empty() {
        return None;
    }
    let arm_start = min_area_rect(&edge_points).center.round();

    let mut pointing_to = contour[0];
    let mut max_dist = -1.0f32;
    for p in contour {
        let dist = p.distance_to(&arm_start);
        if dist > max_dist {
            max_dist = dist;
            pointing_to = *p;
        }
    }

    let long = bounds.size.long_side();
    let short = bounds.size.short_side();
    let ratio = if long > 0.0 { short / long } else { 0.0 };
    let palm_length = if ratio > opts.palm_ratio_cutoff {
        long
    } else {
        short * opts.narrow_palm_scale
    };

    let points: Vec<Point> = contour
        .iter()
        .copied()
        .filter(|p| p.distance_to(&pointing_to) <= palm_length)
        .collect();
    let window = min_area_rect(&points);
    let finger_radius = ((window.size.long_side() / 2.0) as i32).max(1);

    let palm_center = window
        .center
        .lerp(pointing_to.to_f32(), opts.palm_center_bias)
        .round();
    if !window.contains(palm_center.to_f32()) {
        log::trace!(
            "palm center {:?} falls outside the palm window {:?}",
            palm_center,
            window
        );
        return None;
    }

    Some(HandContour {
        bounds: *bounds,
        points,
        arm_start,
        pointing_to,
        window,
        finger_radius,
        palm_center,
    })
}
