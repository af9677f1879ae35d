use livetable_shared::{Point2f, ProjectionResponse};
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

/// Projective transform of the image plane, `dst ~ h * src`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn is_identity(&self) -> bool {
        self.h == Matrix3::identity()
    }

    /// From nine row-major entries
    pub fn from_row_major(m: [f32; 9]) -> Self {
        Self::new(Matrix3::from_row_slice(&m.map(|v| v as f64)))
    }

    pub fn to_row_major(&self) -> [f32; 9] {
        let mut out = [0.0f32; 9];
        for r in 0..3 {
            for c in 0..3 {
                out[r * 3 + c] = self.h[(r, c)] as f32;
            }
        }
        out
    }

    pub fn is_finite(&self) -> bool {
        self.h.iter().all(|v| v.is_finite())
    }

    #[inline]
    pub fn apply(&self, p: Point2f) -> Point2f {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2f::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        if !self.is_finite() {
            return None;
        }
        self.h.try_inverse().map(Self::new)
    }
}

impl From<Homography> for ProjectionResponse {
    fn from(h: Homography) -> Self {
        ProjectionResponse {
            projection: h.to_row_major(),
        }
    }
}

impl From<&ProjectionResponse> for Homography {
    fn from(p: &ProjectionResponse) -> Self {
        Homography::from_row_major(p.projection)
    }
}

fn hartley_normalization(pts: &[Point2f; 4]) -> ([(f64, f64); 4], Matrix3<f64>) {
    let cx = pts.iter().map(|p| p.x as f64).sum::<f64>() / 4.0;
    let cy = pts.iter().map(|p| p.y as f64).sum::<f64>() / 4.0;
    let mean_dist = pts
        .iter()
        .map(|p| (p.x as f64 - cx).hypot(p.y as f64 - cy))
        .sum::<f64>()
        / 4.0;
    let s = if mean_dist > 1e-12 {
        2.0_f64.sqrt() / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);

    let mut out = [(0.0, 0.0); 4];
    for (o, p) in out.iter_mut().zip(pts) {
        let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
        *o = (v[0], v[1]);
    }
    (out, t)
}

/// Exact homography taking the four `src` points onto the four `dst` points.
/// `None` when three of the points are collinear.
pub fn homography_from_4pt(src: &[Point2f; 4], dst: &[Point2f; 4]) -> Option<Homography> {
    // h33 = 1, for each (x, y) -> (u, v):
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let (src_n, t_src) = hartley_normalization(src);
    let (dst_n, t_dst) = hartley_normalization(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for k in 0..4 {
        let (x, y) = src_n[k];
        let (u, v) = dst_n[k];

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;
    let hn = Matrix3::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    let h = t_dst.try_inverse()? * hn * t_src;
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    let h = Homography::new(h / s);
    if !h.is_finite() || h.h.determinant().abs() < 1e-12 {
        return None;
    }
    Some(h)
}
