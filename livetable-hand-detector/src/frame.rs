use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel, RgbImage};
use livetable_shared::Size;

use crate::depth::DepthImage;
use crate::DetectorError;

/// One capture of the table: the color image plus optional depth data
#[derive(Debug, Clone)]
pub struct Frame {
    pub color: RgbImage,
    pub depth: Option<DepthImage>,
    /// Depth of the empty table, to diff `depth` against
    pub depth_background: Option<DepthImage>,
}

impl Frame {
    pub fn new(color: RgbImage) -> Self {
        Self {
            color,
            depth: None,
            depth_background: None,
        }
    }

    pub fn with_depth(mut self, depth: DepthImage, background: Option<DepthImage>) -> Self {
        self.depth = Some(depth);
        self.depth_background = background;
        self
    }

    pub fn size(&self) -> Size {
        Size::new(self.color.width(), self.color.height())
    }

    /// Depth buffers must match the color image
    pub fn check_sizes(&self) -> Result<(), DetectorError> {
        let expected = self.size();
        let buffers = [
            ("depth", self.depth.as_ref()),
            ("depth background", self.depth_background.as_ref()),
        ];
        for (what, buffer) in buffers {
            if let Some(buffer) = buffer {
                let actual = Size::new(buffer.width(), buffer.height());
                if actual != expected {
                    return Err(DetectorError::SizeMismatch {
                        what,
                        expected,
                        actual,
                    });
                }
            }
        }
        Ok(())
    }

    /// Scales every buffer of the frame down to fit `max_width` x `max_height`
    pub fn resized_to_fit(self, max_width: u32, max_height: u32) -> Self {
        let target = fit_size(self.size(), max_width, max_height);
        if target == self.size() {
            return self;
        }
        log::debug!(
            "resizing frame {}x{} -> {}x{}",
            self.color.width(),
            self.color.height(),
            target.width,
            target.height
        );
        Self {
            color: resize_exact(&self.color, target),
            depth: self.depth.map(|d| resize_exact(&d, target)),
            depth_background: self.depth_background.map(|d| resize_exact(&d, target)),
        }
    }
}

/// Size after shrinking `size` (aspect preserving) first to fit `max_height`,
/// then to fit `max_width`. A limit of 0 means unlimited; images are never
/// enlarged.
pub fn fit_size(size: Size, max_width: u32, max_height: u32) -> Size {
    let (mut w, mut h) = (size.width as f64, size.height as f64);
    if max_height > 0 && h > max_height as f64 {
        w *= max_height as f64 / h;
        h = max_height as f64;
    }
    if max_width > 0 && w > max_width as f64 {
        h *= max_width as f64 / w;
        w = max_width as f64;
    }
    Size::new(
        (w.round() as u32).clamp(1, size.width.max(1)),
        (h.round() as u32).clamp(1, size.height.max(1)),
    )
}

fn resize_exact<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    size: Size,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    imageops::resize(image, size.width, size.height, FilterType::Triangle)
}

/// Aspect-preserving downscale of any image buffer, see [`fit_size`]
pub fn resize_to_fit<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    max_width: u32,
    max_height: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    let size = Size::new(image.width(), image.height());
    let target = fit_size(size, max_width, max_height);
    if target == size {
        return image.clone();
    }
    resize_exact(image, target)
}
