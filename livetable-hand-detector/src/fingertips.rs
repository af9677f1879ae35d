//! Fingers from the convexity defects of a hand contour.
//!
//! The gaps between fingers show up as deep convexity defects. Walking the
//! deep defects in hull order, a fingertip is where the hull leaves one gap and
//! reaches the next one within a fingertip's width. The finger is spanned by
//! the bottoms of those two gaps and the tip between them.

use livetable_shared::{Finger, HandOptions, Point, Point2f};

use crate::geometry::{self, convex_hull_indices};
use crate::hand_contour::HandContour;

/// A stretch of the hand contour that leaves its convex hull
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvexityDefect {
    pub on_hull_start: Point,
    pub on_hull_end: Point,
    /// Deepest contour point of the stretch
    pub defect: Point,
    pub dist_from_hull: f32,
    pub dist_from_center: f32,
}

/// Hull of a hand contour and its defects
#[derive(Debug, Clone, PartialEq)]
pub struct HullAnalysis {
    pub hull_indices: Vec<usize>,
    pub hull_points: Vec<Point>,
    pub defects: Vec<ConvexityDefect>,
}

impl HullAnalysis {
    /// Total depth of all defects
    pub fn defect_area(&self) -> f32 {
        self.defects.iter().map(|d| d.dist_from_hull).sum()
    }
}

pub fn analyze_hull(hand: &HandContour) -> HullAnalysis {
    let hull_indices = convex_hull_indices(&hand.points);
    let hull_points = hull_indices.iter().map(|&i| hand.points[i]).collect();
    let defects = convexity_defects(hand, &hull_indices);
    HullAnalysis {
        hull_indices,
        hull_points,
        defects,
    }
}

/// Defects of the hand contour against the given hull, in contour order
pub fn convexity_defects(hand: &HandContour, hull_indices: &[usize]) -> Vec<ConvexityDefect> {
    geometry::convexity_defects(&hand.points, hull_indices)
        .into_iter()
        .map(|d| {
            let defect = hand.points[d.farthest];
            ConvexityDefect {
                on_hull_start: hand.points[d.start],
                on_hull_end: hand.points[d.end],
                defect,
                dist_from_hull: d.depth,
                dist_from_center: defect.distance_to(&hand.palm_center),
            }
        })
        .collect()
}

/// Fingers found between consecutive deep defects. `defects` must be in hull
/// (contour) order, as returned by [`convexity_defects`].
pub fn find_finger_tips(defects: &[ConvexityDefect], opts: &HandOptions) -> Vec<Finger> {
    let deep: Vec<&ConvexityDefect> = defects
        .iter()
        .filter(|d| d.dist_from_hull >= opts.min_defect_depth)
        .collect();
    if deep.len() < 2 {
        return Vec::new();
    }

    let mut fingers: Vec<Finger> = Vec::new();
    for i in 0..deep.len() {
        let (a, b) = (deep[i], deep[(i + 1) % deep.len()]);
        if a.on_hull_end.distance_to(&b.on_hull_start) >= opts.finger_tip_width {
            continue;
        }
        let tip = a.on_hull_end.to_f32().lerp(b.on_hull_start.to_f32(), 0.5);
        let finger = Finger::new(a.defect.to_f32(), b.defect.to_f32(), tip);
        if finger.angle_degrees() < opts.max_finger_angle && !fingers.contains(&finger) {
            fingers.push(finger);
        }
    }
    fingers
}

/// Fingertip positions only
pub fn tip_points(fingers: &[Finger]) -> Vec<Point2f> {
    fingers.iter().map(|f| f.tip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defect(
        start: (i32, i32),
        end: (i32, i32),
        deepest: (i32, i32),
        depth: f32,
    ) -> ConvexityDefect {
        ConvexityDefect {
            on_hull_start: Point::new(start.0, start.1),
            on_hull_end: Point::new(end.0, end.1),
            defect: Point::new(deepest.0, deepest.1),
            dist_from_hull: depth,
            dist_from_center: 0.0,
        }
    }

    #[test]
    fn test_finger_between_two_gaps() {
        let defects = [
            defect((20, 40), (100, 50), (60, 100), 50.0),
            defect((104, 50), (180, 40), (140, 100), 50.0),
        ];
        let fingers = find_finger_tips(&defects, &HandOptions::default());
        assert_eq!(fingers.len(), 1);
        assert_eq!(fingers[0].tip, Point2f::new(102.0, 50.0));
        assert_eq!(fingers[0].base1, Point2f::new(60.0, 100.0));
        assert_eq!(fingers[0].base2, Point2f::new(140.0, 100.0));
    }

    #[test]
    fn test_wide_angle_finger_rejected() {
        // same tip, but the gap bottoms are far apart and barely below it
        let defects = [
            defect((0, 40), (98, 50), (20, 60), 20.0),
            defect((102, 50), (200, 40), (180, 60), 20.0),
        ];
        assert!(find_finger_tips(&defects, &HandOptions::default()).is_empty());
    }

    #[test]
    fn test_shallow_defects_ignored() {
        let defects = [
            defect((20, 40), (100, 50), (60, 100), 5.0),
            defect((104, 50), (180, 40), (140, 100), 50.0),
        ];
        assert!(find_finger_tips(&defects, &HandOptions::default()).is_empty());
    }

    #[test]
    fn test_far_apart_hull_points_are_not_a_tip() {
        // the nearest-defect pairing would still report a finger here
        let defects = [
            defect((20, 40), (60, 50), (60, 100), 50.0),
            defect((160, 50), (180, 40), (140, 100), 50.0),
        ];
        let opts = HandOptions::default();
        assert!(find_finger_tips(&defects, &opts).is_empty());
    }

    #[test]
    fn test_no_duplicate_fingers() {
        let defects = [
            defect((100, 50), (100, 50), (60, 100), 50.0),
            defect((100, 50), (100, 50), (60, 100), 50.0),
        ];
        assert_eq!(find_finger_tips(&defects, &HandOptions::default()).len(), 1);
    }
}
