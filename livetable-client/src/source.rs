use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{Luma, RgbImage};
use livetable_hand_detector::{DepthImage, Frame};

/// Where a stream session gets its frames from
pub trait FrameSource {
    /// The next frame, `None` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

const DEPTH_SUFFIX: &str = ".depth";

pub fn load_color(path: &Path) -> Result<RgbImage> {
    let image = image::open(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    Ok(image.to_rgb8())
}

/// Reads a depth map; 16-bit grayscale keeps its raw sample values
pub fn load_depth(path: &Path) -> Result<DepthImage> {
    let image = image::open(path)
        .with_context(|| format!("Failed to read depth image {}", path.display()))?
        .into_luma16();
    Ok(DepthImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([image.get_pixel(x, y).0[0] as f32])
    }))
}

/// Color frame plus the optional depth data next to it
pub fn load_frame(
    color: &Path,
    depth: Option<&Path>,
    depth_background: Option<&Path>,
) -> Result<Frame> {
    let mut frame = Frame::new(load_color(color)?);
    if let Some(depth) = depth {
        let background = depth_background.map(load_depth).transpose()?;
        frame = frame.with_depth(load_depth(depth)?, background);
    }
    Ok(frame)
}

fn is_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("png" | "jpg" | "jpeg")
    )
}

fn is_depth_map(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.ends_with(DEPTH_SUFFIX))
}

/// Color images of a directory in file name order. A `<name>.depth.png` next
/// to `<name>.png` is used as that frame's depth map.
pub struct DirectorySource {
    pending: VecDeque<PathBuf>,
    background: Option<DepthImage>,
}

impl DirectorySource {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut frames = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to list frames in {}", dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && is_image(&path) && !is_depth_map(&path) {
                frames.push(path);
            }
        }
        frames.sort();
        log::info!("{} frames in {}", frames.len(), dir.display());
        Ok(Self {
            pending: frames.into(),
            background: None,
        })
    }

    /// Depth of the empty table, diffed against every frame's depth map
    pub fn with_background(mut self, background: DepthImage) -> Self {
        self.background = Some(background);
        self
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn depth_path(color: &Path) -> Option<PathBuf> {
        let stem = color.file_stem()?.to_str()?;
        let path = color.with_file_name(format!("{stem}{DEPTH_SUFFIX}.png"));
        path.is_file().then_some(path)
    }
}

impl FrameSource for DirectorySource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        log::debug!("reading frame {}", path.display());
        let mut frame = Frame::new(load_color(&path)?);
        if let Some(depth_path) = Self::depth_path(&path) {
            frame = frame.with_depth(load_depth(&depth_path)?, self.background.clone());
        }
        Ok(Some(frame))
    }
}
