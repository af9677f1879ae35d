use core::ops::{Add, Mul, Sub};
use serde::{Deserialize, Serialize};

/// Integer pixel position, as produced by contour tracing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn to_f32(self) -> Point2f {
        Point2f::new(self.x as f32, self.y as f32)
    }
}

/// Sub-pixel position in image coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2f {
    pub x: f32,
    pub y: f32,
}

impl Point2f {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2f) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Nearest integer pixel
    pub fn round(self) -> Point {
        Point::new(self.x.round() as i32, self.y.round() as i32)
    }

    /// Moves `t` of the way from `self` towards `other`
    pub fn lerp(self, other: Point2f, t: f32) -> Point2f {
        self + (other - self) * t
    }

    pub fn dot(self, other: Point2f) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn norm(self) -> f32 {
        self.dot(self).sqrt()
    }
}

impl From<Point> for Point2f {
    fn from(p: Point) -> Self {
        p.to_f32()
    }
}

impl Add for Point2f {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point2f {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Point2f {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

/// Angle in radians at `center` between the rays towards `p1` and `p2`.
///
/// A degenerate ray (one of the points sits on `center`) counts as fully
/// open, i.e. `PI`.
pub fn angle_between(p1: Point2f, p2: Point2f, center: Point2f) -> f32 {
    let q1 = p1 - center;
    let q2 = p2 - center;
    let n1 = q1.norm();
    let n2 = q2.norm();
    if n1 == 0.0 || n2 == 0.0 {
        return core::f32::consts::PI;
    }
    (q1.dot(q2) / (n1 * n2)).clamp(-1.0, 1.0).acos()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size2f {
    pub width: f32,
    pub height: f32,
}

impl Size2f {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn long_side(&self) -> f32 {
        self.width.max(self.height)
    }

    pub fn short_side(&self) -> f32 {
        self.width.min(self.height)
    }
}

/// Rectangle rotated around its center. `angle` is in degrees and gives the
/// direction of the `width` side, measured clockwise from the x axis
/// (image y grows downwards).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    pub center: Point2f,
    pub size: Size2f,
    pub angle: f32,
}

impl RotatedRect {
    pub fn new(center: Point2f, size: Size2f, angle: f32) -> Self {
        Self {
            center,
            size,
            angle,
        }
    }

    fn axes(&self) -> (Point2f, Point2f) {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        (Point2f::new(cos, sin), Point2f::new(-sin, cos))
    }

    /// Corner points, walking around the rectangle
    pub fn points(&self) -> [Point2f; 4] {
        let (u, v) = self.axes();
        let hu = u * (self.size.width / 2.0);
        let hv = v * (self.size.height / 2.0);
        [
            self.center - hu + hv,
            self.center - hu - hv,
            self.center + hu - hv,
            self.center + hu + hv,
        ]
    }

    /// True if `p` lies strictly inside the rectangle (not on its border)
    pub fn contains(&self, p: Point2f) -> bool {
        let (u, v) = self.axes();
        let d = p - self.center;
        d.dot(u).abs() < self.size.width / 2.0 && d.dot(v).abs() < self.size.height / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let p1 = Point::new(0, 0);
        let p2 = Point::new(3, 4);
        assert!((p1.distance_to(&p2) - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_lerp_halfway() {
        let a = Point2f::new(10.0, 10.0);
        let b = Point2f::new(30.0, 50.0);
        assert_eq!(a.lerp(b, 0.5), Point2f::new(20.0, 30.0));
    }

    #[test]
    fn test_angle_between_right_angle() {
        let angle = angle_between(
            Point2f::new(10.0, 0.0),
            Point2f::new(0.0, 10.0),
            Point2f::new(0.0, 0.0),
        );
        assert!((angle.to_degrees() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_angle_between_degenerate_ray() {
        let c = Point2f::new(5.0, 5.0);
        let angle = angle_between(c, Point2f::new(0.0, 0.0), c);
        assert_eq!(angle, core::f32::consts::PI);
    }

    #[test]
    fn test_rotated_rect_contains_is_strict() {
        let rect = RotatedRect::new(Point2f::new(50.0, 50.0), Size2f::new(20.0, 10.0), 0.0);
        assert!(rect.contains(Point2f::new(50.0, 50.0)));
        assert!(rect.contains(Point2f::new(59.0, 54.0)));
        assert!(!rect.contains(Point2f::new(60.0, 50.0)));
        assert!(!rect.contains(Point2f::new(50.0, 56.0)));
    }

    #[test]
    fn test_rotated_rect_points_follow_angle() {
        let rect = RotatedRect::new(Point2f::new(0.0, 0.0), Size2f::new(20.0, 10.0), 90.0);
        let pts = rect.points();
        // width now runs along y
        let max_y = pts.iter().map(|p| p.y).fold(f32::MIN, f32::max);
        let max_x = pts.iter().map(|p| p.x).fold(f32::MIN, f32::max);
        assert!((max_y - 10.0).abs() < 1e-4);
        assert!((max_x - 5.0).abs() < 1e-4);
    }
}
