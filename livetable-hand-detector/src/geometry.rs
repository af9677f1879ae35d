//! Planar geometry on contour point lists: area, moments, ellipse fitting,
//! convex hull, minimum-area rectangles and convexity defects.

use livetable_shared::{Point, Point2f, RotatedRect, Size2f};

/// Enclosed area of a closed polygon (shoelace formula), always >= 0
pub fn contour_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: i64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
        })
        .sum();
    (twice as f64 / 2.0).abs()
}

/// Spatial moments of the region enclosed by a polygon, up to second order
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m20: f64,
    pub m11: f64,
    pub m02: f64,
}

impl Moments {
    /// Region moments via Green's theorem over the polygon edges
    pub fn of_polygon(points: &[Point]) -> Self {
        let n = points.len();
        let mut m = Moments::default();
        if n < 3 {
            return m;
        }
        for i in 0..n {
            let (xi, yi) = (points[i].x as f64, points[i].y as f64);
            let next = points[(i + 1) % n];
            let (xj, yj) = (next.x as f64, next.y as f64);
            let a = xi * yj - xj * yi;
            m.m00 += a;
            m.m10 += a * (xi + xj);
            m.m01 += a * (yi + yj);
            m.m20 += a * (xi * xi + xi * xj + xj * xj);
            m.m11 += a * (xi * (2.0 * yi + yj) + xj * (yi + 2.0 * yj));
            m.m02 += a * (yi * yi + yi * yj + yj * yj);
        }
        let sign = if m.m00 < 0.0 { -1.0 } else { 1.0 };
        Moments {
            m00: sign * m.m00 / 2.0,
            m10: sign * m.m10 / 6.0,
            m01: sign * m.m01 / 6.0,
            m20: sign * m.m20 / 12.0,
            m11: sign * m.m11 / 24.0,
            m02: sign * m.m02 / 12.0,
        }
    }

    pub fn centroid(&self) -> Option<Point2f> {
        if self.m00 <= 0.0 {
            return None;
        }
        Some(Point2f::new(
            (self.m10 / self.m00) as f32,
            (self.m01 / self.m00) as f32,
        ))
    }
}

/// Axes (major, minor) and major-axis angle in radians of a 2x2 covariance
fn principal_axes(sxx: f64, sxy: f64, syy: f64) -> (f64, f64, f64) {
    let mean = (sxx + syy) / 2.0;
    let diff = ((sxx - syy) / 2.0).hypot(sxy);
    let angle = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    ((mean + diff).max(0.0), (mean - diff).max(0.0), angle)
}

/// Ellipse approximating the shape of a contour, as a rotated rectangle whose
/// `width` is the major axis.
///
/// Uses the second-order region moments (an ellipse with the same inertia as
/// the enclosed region). Contours enclosing no area, e.g. one pixel wide
/// lines, fall back to the spread of the points themselves.
pub fn fit_ellipse(points: &[Point]) -> RotatedRect {
    if points.is_empty() {
        return RotatedRect::default();
    }
    let moments = Moments::of_polygon(points);
    if moments.m00 >= 1.0 {
        if let Some(c) = moments.centroid() {
            let (cx, cy) = (c.x as f64, c.y as f64);
            let mu20 = moments.m20 / moments.m00 - cx * cx;
            let mu02 = moments.m02 / moments.m00 - cy * cy;
            let mu11 = moments.m11 / moments.m00 - cx * cy;
            let (major, minor, angle) = principal_axes(mu20, mu11, mu02);
            // a filled ellipse with semi axis a has variance a^2 / 4
            return RotatedRect::new(
                c,
                Size2f::new((4.0 * major.sqrt()) as f32, (4.0 * minor.sqrt()) as f32),
                angle.to_degrees() as f32,
            );
        }
    }

    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x as f64).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y as f64).sum::<f64>() / n;
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for p in points {
        let dx = p.x as f64 - cx;
        let dy = p.y as f64 - cy;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    let (major, minor, angle) = principal_axes(sxx / n, sxy / n, syy / n);
    // points spread evenly along a segment of length L have variance L^2 / 12
    RotatedRect::new(
        Point2f::new(cx as f32, cy as f32),
        Size2f::new(
            (12.0 * major).sqrt() as f32,
            (12.0 * minor).sqrt() as f32,
        ),
        angle.to_degrees() as f32,
    )
}

fn cross(o: Point, a: Point, b: Point) -> i64 {
    (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
}

/// Convex hull as indices into `points` (monotone chain). Collinear and
/// duplicate points are not part of the hull.
pub fn convex_hull_indices(points: &[Point]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| (points[i].x, points[i].y));
    order.dedup_by_key(|i| points[*i]);
    if order.len() < 3 {
        return order;
    }

    let mut lower: Vec<usize> = Vec::with_capacity(order.len());
    for &i in &order {
        while lower.len() >= 2
            && cross(
                points[lower[lower.len() - 2]],
                points[lower[lower.len() - 1]],
                points[i],
            ) <= 0
        {
            lower.pop();
        }
        lower.push(i);
    }

    let mut upper: Vec<usize> = Vec::with_capacity(order.len());
    for &i in order.iter().rev() {
        while upper.len() >= 2
            && cross(
                points[upper[upper.len() - 2]],
                points[upper[upper.len() - 1]],
                points[i],
            ) <= 0
        {
            upper.pop();
        }
        upper.push(i);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    convex_hull_indices(points)
        .into_iter()
        .map(|i| points[i])
        .collect()
}

/// Smallest rotated rectangle enclosing all points (rotating calipers over
/// the hull edges)
pub fn min_area_rect(points: &[Point]) -> RotatedRect {
    let hull: Vec<(f64, f64)> = convex_hull(points)
        .into_iter()
        .map(|p| (p.x as f64, p.y as f64))
        .collect();

    match hull.len() {
        0 => RotatedRect::default(),
        1 => RotatedRect::new(
            Point2f::new(hull[0].0 as f32, hull[0].1 as f32),
            Size2f::default(),
            0.0,
        ),
        2 => {
            let (a, b) = (hull[0], hull[1]);
            let (dx, dy) = (b.0 - a.0, b.1 - a.1);
            RotatedRect::new(
                Point2f::new(((a.0 + b.0) / 2.0) as f32, ((a.1 + b.1) / 2.0) as f32),
                Size2f::new(dx.hypot(dy) as f32, 0.0),
                dy.atan2(dx).to_degrees() as f32,
            )
        }
        n => {
            let mut best: Option<(f64, RotatedRect)> = None;
            for i in 0..n {
                let (a, b) = (hull[i], hull[(i + 1) % n]);
                let len = (b.0 - a.0).hypot(b.1 - a.1);
                if len == 0.0 {
                    continue;
                }
                let u = ((b.0 - a.0) / len, (b.1 - a.1) / len);
                let v = (-u.1, u.0);

                let (mut min_u, mut max_u) = (f64::MAX, f64::MIN);
                let (mut min_v, mut max_v) = (f64::MAX, f64::MIN);
                for p in &hull {
                    let pu = p.0 * u.0 + p.1 * u.1;
                    let pv = p.0 * v.0 + p.1 * v.1;
                    min_u = min_u.min(pu);
                    max_u = max_u.max(pu);
                    min_v = min_v.min(pv);
                    max_v = max_v.max(pv);
                }

                let area = (max_u - min_u) * (max_v - min_v);
                if best.as_ref().map_or(true, |(a, _)| area < *a) {
                    let cu = (min_u + max_u) / 2.0;
                    let cv = (min_v + max_v) / 2.0;
                    let center = (u.0 * cu + v.0 * cv, u.1 * cu + v.1 * cv);
                    best = Some((
                        area,
                        RotatedRect::new(
                            Point2f::new(center.0 as f32, center.1 as f32),
                            Size2f::new((max_u - min_u) as f32, (max_v - min_v) as f32),
                            u.1.atan2(u.0).to_degrees() as f32,
                        ),
                    ));
                }
            }
            best.map(|(_, rect)| rect).unwrap_or_default()
        }
    }
}

/// A stretch of contour between two consecutive hull vertices, given as
/// indices into the contour, with the distance of its deepest point to the
/// hull edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefectIndices {
    pub start: usize,
    pub end: usize,
    pub farthest: usize,
    pub depth: f32,
}

fn distance_to_line(p: Point, a: Point, b: Point) -> f64 {
    let len = a.distance_to(&b) as f64;
    if len == 0.0 {
        return p.distance_to(&a) as f64;
    }
    (cross(a, b, p) as f64).abs() / len
}

/// Convexity defects of `points` against its hull. Hull indices may come in
/// any order; defects are returned in contour order and only where the
/// contour actually leaves the hull (depth > 0).
pub fn convexity_defects(points: &[Point], hull: &[usize]) -> Vec<DefectIndices> {
    let n = points.len();
    if hull.len() < 3 {
        return Vec::new();
    }
    let mut hull = hull.to_vec();
    hull.sort_unstable();

    let mut defects = Vec::new();
    for k in 0..hull.len() {
        let start = hull[k];
        let end = hull[(k + 1) % hull.len()];
        let (a, b) = (points[start], points[end]);

        let mut deepest: Option<(usize, f64)> = None;
        let mut j = (start + 1) % n;
        while j != end {
            let depth = distance_to_line(points[j], a, b);
            if depth > deepest.map_or(0.0, |(_, d)| d) {
                deepest = Some((j, depth));
            }
            j = (j + 1) % n;
        }

        if let Some((farthest, depth)) = deepest {
            defects.push(DefectIndices {
                start,
                end,
                farthest,
                depth: depth as f32,
            });
        }
    }
    defects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: i32, y0: i32, side: i32) -> Vec<Point> {
        vec![
            Point::new(x0, y0),
            Point::new(x0 + side, y0),
            Point::new(x0 + side, y0 + side),
            Point::new(x0, y0 + side),
        ]
    }

    #[test]
    fn test_contour_area_square() {
        assert_eq!(contour_area(&square(10, 10, 20)), 400.0);
        assert_eq!(contour_area(&[Point::new(0, 0), Point::new(5, 5)]), 0.0);
    }

    #[test]
    fn test_moments_centroid() {
        let m = Moments::of_polygon(&square(10, 10, 20));
        assert_eq!(m.m00, 400.0);
        let c = m.centroid().unwrap();
        assert!((c.x - 20.0).abs() < 1e-4 && (c.y - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_fit_ellipse_elongated_rectangle() {
        let rect = vec![
            Point::new(0, 0),
            Point::new(120, 0),
            Point::new(120, 30),
            Point::new(0, 30),
        ];
        let ellipse = fit_ellipse(&rect);
        assert!((ellipse.center.x - 60.0).abs() < 1e-3);
        assert!((ellipse.center.y - 15.0).abs() < 1e-3);
        assert!(ellipse.size.width > ellipse.size.height * 3.0);
        assert!(ellipse.angle.abs() < 1e-3);
    }

    #[test]
    fn test_fit_ellipse_line_falls_back_to_spread() {
        let line: Vec<Point> = (0..=100).map(|x| Point::new(x, 7)).collect();
        let ellipse = fit_ellipse(&line);
        assert!((ellipse.center.x - 50.0).abs() < 1e-3);
        assert!((ellipse.size.width - 101.0).abs() < 2.0);
        assert!(ellipse.size.height < 1e-3);
    }

    #[test]
    fn test_convex_hull_drops_interior_and_collinear() {
        let mut points = square(0, 0, 10);
        points.push(Point::new(5, 5));
        points.push(Point::new(5, 0));
        points.push(Point::new(0, 0));
        let mut hull = convex_hull(&points);
        hull.sort_by_key(|p| (p.x, p.y));
        assert_eq!(
            hull,
            vec![
                Point::new(0, 0),
                Point::new(0, 10),
                Point::new(10, 0),
                Point::new(10, 10)
            ]
        );
    }

    #[test]
    fn test_min_area_rect_of_rotated_square() {
        // diamond: a square rotated by 45 degrees
        let diamond = vec![
            Point::new(50, 0),
            Point::new(100, 50),
            Point::new(50, 100),
            Point::new(0, 50),
        ];
        let rect = min_area_rect(&diamond);
        let side = 50.0f32 * 2.0f32.sqrt();
        assert!((rect.center.x - 50.0).abs() < 1e-3);
        assert!((rect.center.y - 50.0).abs() < 1e-3);
        assert!((rect.size.width - side).abs() < 1e-2);
        assert!((rect.size.height - side).abs() < 1e-2);
        assert!((rect.angle.abs() % 90.0 - 45.0).abs() < 1e-2);
    }

    #[test]
    fn test_min_area_rect_degenerate_inputs() {
        assert_eq!(min_area_rect(&[]), RotatedRect::default());
        let single = min_area_rect(&[Point::new(3, 4)]);
        assert_eq!(single.center, Point2f::new(3.0, 4.0));
        let pair = min_area_rect(&[Point::new(0, 0), Point::new(10, 0)]);
        assert_eq!(pair.center, Point2f::new(5.0, 0.0));
        assert_eq!(pair.size.width, 10.0);
    }

    #[test]
    fn test_convexity_defect_of_notch() {
        // a "U": the notch between the two prongs is the only defect
        let u = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 30),
            Point::new(20, 30),
            Point::new(20, 0),
            Point::new(30, 0),
            Point::new(30, 40),
            Point::new(0, 40),
        ];
        let hull = convex_hull_indices(&u);
        let defects = convexity_defects(&u, &hull);
        assert_eq!(defects.len(), 1);
        let d = defects[0];
        assert_eq!(d.start, 1);
        assert_eq!(d.end, 4);
        assert!(d.farthest == 2 || d.farthest == 3);
        assert!((d.depth - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_convexity_defects_need_three_hull_points() {
        let line = vec![Point::new(0, 0), Point::new(5, 0), Point::new(10, 0)];
        let hull = convex_hull_indices(&line);
        assert!(convexity_defects(&line, &hull).is_empty());
    }
}
