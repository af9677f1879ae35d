//! Corners of a quadrilateral from the line segments along its sides.

use livetable_shared::{angle_between, Corners, Point2f, QuadOptions, Size};

use crate::homography::{homography_from_4pt, Homography};
use crate::lines::{intersection, LineSegment};

/// Intersections of all segment pairs that meet inside `bounds` at an angle
/// within the configured window. The angle is measured at the intersection,
/// towards the far end of each segment.
pub fn find_corner_candidates(
    lines: &[LineSegment],
    bounds: Size,
    opts: &QuadOptions,
) -> Vec<Point2f> {
    let mut corners = Vec::new();
    for (i, a) in lines.iter().enumerate() {
        for b in &lines[i + 1..] {
            let Some(pt) = intersection(a, b) else {
                continue;
            };
            if pt.x < 0.0
                || pt.y < 0.0
                || pt.x > bounds.width as f32
                || pt.y > bounds.height as f32
            {
                continue;
            }
            let angle = angle_between(a.far_end(pt), b.far_end(pt), pt).to_degrees();
            if angle >= opts.min_angle_of_intersecting_lines
                && angle <= opts.max_angle_of_intersecting_lines
            {
                corners.push(pt);
            }
        }
    }
    corners
}

fn nearest(points: &[Point2f], target: Point2f) -> Option<Point2f> {
    points.iter().copied().min_by(|a, b| {
        a.distance_to(&target)
            .partial_cmp(&b.distance_to(&target))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

/// Groups candidates into quadrants around their centroid and picks, per
/// quadrant, the candidate nearest to the matching corner of `from`. `None`
/// unless every quadrant has a candidate.
pub fn sort_corners(candidates: &[Point2f], from: Size) -> Option<Corners> {
    if candidates.is_empty() {
        return None;
    }
    let n = candidates.len() as f32;
    let center = Point2f::new(
        candidates.iter().map(|p| p.x).sum::<f32>() / n,
        candidates.iter().map(|p| p.y).sum::<f32>() / n,
    );

    let (mut tl, mut tr, mut br, mut bl) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
    for &p in candidates {
        match (p.x < center.x, p.y < center.y) {
            (true, true) => tl.push(p),
            (false, true) => tr.push(p),
            (false, false) => br.push(p),
            (true, false) => bl.push(p),
        }
    }

    let (w, h) = (from.width as f32, from.height as f32);
    Some(Corners::new(
        nearest(&tl, Point2f::new(0.0, 0.0))?,
        nearest(&tr, Point2f::new(w, 0.0))?,
        nearest(&br, Point2f::new(w, h))?,
        nearest(&bl, Point2f::new(0.0, h))?,
    ))
}

/// The quadrilateral's corners, or `None` when fewer than four corners could
/// be identified
pub fn find_corners(lines: &[LineSegment], bounds: Size, opts: &QuadOptions) -> Option<Corners> {
    let candidates = find_corner_candidates(lines, bounds, opts);
    log::trace!(
        "{} corner candidates from {} segments",
        candidates.len(),
        lines.len()
    );
    sort_corners(&candidates, bounds)
}

/// Homography taking `corners` onto the full `size` rectangle, `None` for a
/// degenerate quadrilateral
pub fn corner_transform(corners: &Corners, size: Size) -> Option<Homography> {
    let (w, h) = (size.width as f32, size.height as f32);
    let dst = [
        Point2f::new(0.0, 0.0),
        Point2f::new(w, 0.0),
        Point2f::new(w, h),
        Point2f::new(0.0, h),
    ];
    homography_from_4pt(&corners.to_array(), &dst)
}
