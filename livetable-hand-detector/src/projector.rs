use image::{ImageBuffer, Pixel};
use livetable_shared::{Point2f, Size};

use crate::homography::Homography;
use crate::DetectorError;

/// Warps `src` into a `size` image, sampling every destination pixel from
/// `homography⁻¹ · (x, y)` with nearest-neighbor lookup. Destination pixels
/// that map outside the source stay zero.
pub fn warp_perspective<P>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    homography: &Homography,
    size: Size,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, DetectorError>
where
    P: Pixel,
{
    let inverse = homography
        .inverse()
        .ok_or(DetectorError::SingularHomography)?;
    let mut out = ImageBuffer::new(size.width, size.height);
    let (sw, sh) = (src.width() as i64, src.height() as i64);

    for (x, y, px) in out.enumerate_pixels_mut() {
        let s = inverse.apply(Point2f::new(x as f32, y as f32));
        if !s.x.is_finite() || !s.y.is_finite() {
            continue;
        }
        let (sx, sy) = (s.x.round() as i64, s.y.round() as i64);
        if sx >= 0 && sy >= 0 && sx < sw && sy < sh {
            *px = *src.get_pixel(sx as u32, sy as u32);
        }
    }
    Ok(out)
}
