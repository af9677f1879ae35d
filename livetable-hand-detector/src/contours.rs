use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use livetable_shared::{HandOptions, Point, RotatedRect, Size};

use crate::geometry::{contour_area, fit_ellipse};

/// Contours with fewer points can't be fitted
const MIN_CONTOUR_POINTS: usize = 5;

/// A traced region border
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point>,
    /// Inner border of a hole in a region
    pub is_hole: bool,
    pub parent: Option<usize>,
}

impl Contour {
    pub fn area(&self) -> f64 {
        contour_area(&self.points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Traces the borders of all foreground (non-zero) regions of a mask
pub fn extract_contours(mask: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .map(|c| Contour {
            points: c.points.into_iter().map(|p| Point::new(p.x, p.y)).collect(),
            is_hole: c.border_type == BorderType::Hole,
            parent: c.parent,
        })
        .collect()
}

/// A contour that passed the size filters, with its fitted ellipse
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub points: Vec<Point>,
    pub bounds: RotatedRect,
}

/// Drops contours that can't be a hand: too few points to fit, too small
/// unless very long, or with a fitted center beyond the image on both axes
pub fn filter_candidates(contours: Vec<Contour>, image: Size, opts: &HandOptions) -> Vec<Candidate> {
    let min_area = image.area() as f64 * opts.min_hand_area_in_percent as f64 / 100.0;

    contours
        .into_iter()
        .filter_map(|contour| {
            if contour.len() < MIN_CONTOUR_POINTS {
                return None;
            }
            if contour.area() < min_area && contour.len() < opts.large_contour_points {
                return None;
            }
            let bounds = fit_ellipse(&contour.points);
            if bounds.center.x > image.width as f32 && bounds.center.y > image.height as f32 {
                log::trace!("contour fitted outside the image at {:?}", bounds.center);
                return None;
            }
            Some(Candidate {
                points: contour.points,
                bounds,
            })
        })
        .collect()
}

/// All hand-sized contours of a binary mask
pub fn find_candidates(mask: &GrayImage, opts: &HandOptions) -> Vec<Candidate> {
    let size = Size::new(mask.width(), mask.height());
    let contours = extract_contours(mask);
    let total = contours.len();
    let candidates = filter_candidates(contours, size, opts);
    log::trace!("{} of {} contours are hand candidates", candidates.len(), total);
    candidates
}
