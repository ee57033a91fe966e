use std::path::PathBuf;

use image::GrayImage;
use tracing::warn;

/// Drawing target for rendered slices
pub trait Surface {
    fn present(&mut self, frame: &GrayImage);

    fn clear(&mut self);
}

/// Keeps the last presented frame in memory
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frame: Option<GrayImage>,
    presented: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> Option<&GrayImage> {
        self.frame.as_ref()
    }

    /// Number of frames presented since creation
    pub fn presented(&self) -> usize {
        self.presented
    }
}

impl Surface for FrameBuffer {
    fn present(&mut self, frame: &GrayImage) {
        self.frame = Some(frame.clone());
        self.presented += 1;
    }

    fn clear(&mut self) {
        self.frame = None;
    }
}

/// Writes every presented frame to the same image file
#[derive(Debug, Clone)]
pub struct PngSurface {
    path: PathBuf,
}

impl PngSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Surface for PngSurface {
    fn present(&mut self, frame: &GrayImage) {
        if let Err(err) = frame.save(&self.path) {
            warn!("Could not write {}: {err}", self.path.display());
        }
    }

    fn clear(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_buffer_keeps_last_frame() {
        let mut surface = FrameBuffer::new();
        surface.present(&GrayImage::new(2, 2));
        surface.present(&GrayImage::new(3, 1));
        assert_eq!(surface.frame().unwrap().dimensions(), (3, 1));
        assert_eq!(surface.presented(), 2);

        surface.clear();
        assert!(surface.frame().is_none());
    }

    #[test]
    fn png_surface_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.png");
        let mut surface = PngSurface::new(&path);
        surface.present(&GrayImage::new(4, 4));
        assert_eq!(image::open(&path).unwrap().width(), 4);
    }
}
