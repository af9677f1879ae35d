//! Straight segments on a binary edge image.
//!
//! Lines come from a Hough transform. Each line is then walked pixel by pixel
//! to split it into the segments actually present in the image, and every
//! segment is refitted to the pixels along it to undo the angle quantization
//! of the accumulator.

use std::collections::HashSet;

use image::GrayImage;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use livetable_shared::{Point2f, ScreenOptions};

/// Pixels farther than this from a line don't count towards its refit
const REFIT_BAND: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Point2f,
    pub end: Point2f,
}

impl LineSegment {
    pub fn new(start: Point2f, end: Point2f) -> Self {
        Self { start, end }
    }

    pub fn from_coords(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(Point2f::new(x1, y1), Point2f::new(x2, y2))
    }

    pub fn length(&self) -> f32 {
        self.start.distance_to(&self.end)
    }

    /// The endpoint farther away from `p`
    pub fn far_end(&self, p: Point2f) -> Point2f {
        if self.start.distance_to(&p) >= self.end.distance_to(&p) {
            self.start
        } else {
            self.end
        }
    }
}

/// Intersection of the infinite lines through two segments, `None` when they
/// are parallel
pub fn intersection(a: &LineSegment, b: &LineSegment) -> Option<Point2f> {
    let (x1, y1) = (a.start.x as f64, a.start.y as f64);
    let (x2, y2) = (a.end.x as f64, a.end.y as f64);
    let (x3, y3) = (b.start.x as f64, b.start.y as f64);
    let (x4, y4) = (b.end.x as f64, b.end.y as f64);

    let d = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if d == 0.0 {
        return None;
    }
    let p = x1 * y2 - y1 * x2;
    let q = x3 * y4 - y3 * x4;
    let x = (p * (x3 - x4) - (x1 - x2) * q) / d;
    let y = (p * (y3 - y4) - (y1 - y2) * q) / d;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(Point2f::new(x as f32, y as f32))
}

fn lit(edges: &GrayImage, x: i32, y: i32) -> bool {
    x >= 0
        && y >= 0
        && (x as u32) < edges.width()
        && (y as u32) < edges.height()
        && edges.get_pixel(x as u32, y as u32).0[0] != 0
}

/// Lit within one pixel, so lines rasterized slightly off the Hough line
/// still count
fn lit_near(edges: &GrayImage, x: i32, y: i32) -> bool {
    (-1..=1).any(|dy| (-1..=1).any(|dx| lit(edges, x + dx, y + dy)))
}

/// Parametrization `base + dir * t` of a polar line, plus its normal
struct Walk {
    base: (f64, f64),
    dir: (f64, f64),
    normal: (f64, f64),
}

impl Walk {
    fn new(line: &PolarLine) -> Self {
        let theta = (line.angle_in_degrees as f64).to_radians();
        let (sin, cos) = theta.sin_cos();
        let r = line.r as f64;
        Self {
            base: (r * cos, r * sin),
            dir: (-sin, cos),
            normal: (cos, sin),
        }
    }

    fn at(&self, t: f64) -> (f64, f64) {
        (
            self.base.0 + self.dir.0 * t,
            self.base.1 + self.dir.1 * t,
        )
    }
}

/// Splits one Hough line into segments, bridging gaps of up to `max_gap`
/// pixels and dropping segments shorter than `min_length`
fn segments_along(
    edges: &GrayImage,
    line: &PolarLine,
    max_gap: u32,
    min_length: f32,
) -> Vec<LineSegment> {
    let walk = Walk::new(line);
    let reach = (edges.width() + edges.height()) as i64;

    let mut segments = Vec::new();
    let mut run: Option<(i64, i64)> = None;
    let mut gap = 0u32;

    let close = |run: (i64, i64), segments: &mut Vec<LineSegment>| {
        if (run.1 - run.0) as f32 >= min_length {
            if let Some(segment) = refit(edges, &walk, run) {
                segments.push(segment);
            }
        }
    };

    for t in -reach..=reach {
        let (x, y) = walk.at(t as f64);
        if lit_near(edges, x.round() as i32, y.round() as i32) {
            run = Some(match run {
                Some((start, _)) => (start, t),
                None => (t, t),
            });
            gap = 0;
        } else if let Some(current) = run {
            gap += 1;
            if gap > max_gap {
                close(current, &mut segments);
                run = None;
                gap = 0;
            }
        }
    }
    if let Some(current) = run {
        close(current, &mut segments);
    }
    segments
}

/// Total least squares fit of the lit pixels along a run, with the run's ends
/// projected onto the fitted line
fn refit(edges: &GrayImage, walk: &Walk, run: (i64, i64)) -> Option<LineSegment> {
    let mut pixels: HashSet<(i32, i32)> = HashSet::new();
    for t in run.0..=run.1 {
        let (x, y) = walk.at(t as f64);
        for o in -REFIT_BAND..=REFIT_BAND {
            let px = (x + walk.normal.0 * o as f64).round() as i32;
            let py = (y + walk.normal.1 * o as f64).round() as i32;
            if lit(edges, px, py) {
                pixels.insert((px, py));
            }
        }
    }
    if pixels.len() < 2 {
        return None;
    }

    let n = pixels.len() as f64;
    let mx = pixels.iter().map(|p| p.0 as f64).sum::<f64>() / n;
    let my = pixels.iter().map(|p| p.1 as f64).sum::<f64>() / n;
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in &pixels {
        let (dx, dy) = (x as f64 - mx, y as f64 - my);
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    let angle = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let dir = (angle.cos(), angle.sin());

    let project = |(x, y): (f64, f64)| {
        let s = (x - mx) * dir.0 + (y - my) * dir.1;
        Point2f::new((mx + dir.0 * s) as f32, (my + dir.1 * s) as f32)
    };
    Some(LineSegment::new(
        project(walk.at(run.0 as f64)),
        project(walk.at(run.1 as f64)),
    ))
}

/// Segments of the Hough lines of `edges`, at least
/// `max(min_line_length_ratio * min(w, h), hough_min_line_length)` long
pub fn detect_line_segments(edges: &GrayImage, opts: &ScreenOptions) -> Vec<LineSegment> {
    let min_side = edges.width().min(edges.height()) as f32;
    let min_length = (opts.min_line_length_ratio * min_side).max(opts.hough_min_line_length as f32);

    let lines = detect_lines(
        edges,
        LineDetectionOptions {
            vote_threshold: opts.hough_threshold,
            suppression_radius: opts.hough_suppression_radius,
        },
    );
    log::trace!("{} hough lines", lines.len());

    lines
        .iter()
        .flat_map(|line| segments_along(edges, line, opts.hough_max_line_gap, min_length))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_line_segment_mut;

    fn opts() -> ScreenOptions {
        ScreenOptions {
            hough_threshold: 60,
            ..ScreenOptions::default()
        }
    }

    #[test]
    fn test_intersection_of_crossing_lines() {
        let a = LineSegment::from_coords(0.0, 0.0, 10.0, 10.0);
        let b = LineSegment::from_coords(0.0, 10.0, 10.0, 0.0);
        assert_eq!(intersection(&a, &b), Some(Point2f::new(5.0, 5.0)));
    }

    #[test]
    fn test_intersection_outside_segments() {
        let a = LineSegment::from_coords(0.0, 0.0, 10.0, 0.0);
        let b = LineSegment::from_coords(20.0, 5.0, 20.0, 10.0);
        assert_eq!(intersection(&a, &b), Some(Point2f::new(20.0, 0.0)));
    }

    #[test]
    fn test_parallel_lines_do_not_intersect() {
        let a = LineSegment::from_coords(0.0, 0.0, 100.0, 0.0);
        let b = LineSegment::from_coords(0.0, 20.0, 100.0, 20.0);
        assert_eq!(intersection(&a, &b), None);
        let c = LineSegment::from_coords(0.0, 0.0, 50.0, 50.0);
        let d = LineSegment::from_coords(10.0, 0.0, 60.0, 50.0);
        assert_eq!(intersection(&c, &d), None);
    }

    #[test]
    fn test_far_end() {
        let s = LineSegment::from_coords(0.0, 0.0, 100.0, 0.0);
        assert_eq!(s.far_end(Point2f::new(90.0, 0.0)), Point2f::new(0.0, 0.0));
        assert_eq!(s.far_end(Point2f::new(-5.0, 0.0)), Point2f::new(100.0, 0.0));
    }

    #[test]
    fn test_detects_horizontal_segment() {
        let mut edges = GrayImage::new(200, 100);
        draw_line_segment_mut(&mut edges, (30.0, 50.0), (170.0, 50.0), Luma([255u8]));
        let segments = detect_line_segments(&edges, &opts());
        assert!(!segments.is_empty());
        for s in &segments {
            assert!((s.start.y - 50.0).abs() < 1.0 && (s.end.y - 50.0).abs() < 1.0);
            let (lo, hi) = if s.start.x < s.end.x {
                (s.start.x, s.end.x)
            } else {
                (s.end.x, s.start.x)
            };
            assert!((lo - 30.0).abs() <= 3.0, "segment starts at {}", lo);
            assert!((hi - 170.0).abs() <= 3.0, "segment ends at {}", hi);
        }
    }

    #[test]
    fn test_gap_splits_segment() {
        let mut edges = GrayImage::new(300, 100);
        draw_line_segment_mut(&mut edges, (10.0, 50.0), (120.0, 50.0), Luma([255u8]));
        draw_line_segment_mut(&mut edges, (170.0, 50.0), (290.0, 50.0), Luma([255u8]));
        let segments = detect_line_segments(&edges, &opts());
        assert!(segments.len() >= 2);
        assert!(segments.iter().all(|s| s.length() < 150.0));
    }

    #[test]
    fn test_short_segments_dropped() {
        let mut edges = GrayImage::new(200, 200);
        // long enough for the votes, shorter than 20% of 200
        draw_line_segment_mut(&mut edges, (10.0, 50.0), (35.0, 50.0), Luma([255u8]));
        let o = ScreenOptions {
            hough_threshold: 20,
            ..ScreenOptions::default()
        };
        assert!(detect_line_segments(&edges, &o).is_empty());
    }
}
