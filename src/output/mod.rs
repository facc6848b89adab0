mod preview;
mod video_writer;

pub use preview::{HighGuiViewer, QUIT_KEY};
pub use video_writer::{FourCc, VideoFileSink, DEFAULT_FPS};

use crate::error::{Result, SegError};
use image::RgbImage;

/// Trait for output destinations
pub trait FrameSink {
    /// Append a frame; every frame must match the size of the first
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Resolution fixed by the first frame, if one has been written
    fn resolution(&self) -> Option<(u32, u32)>;

    /// Flush and release the destination
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// What the user asked for while a frame was on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    Continue,
    Quit,
}

/// Trait for live preview of composited frames
pub trait Viewer {
    /// Display a frame and poll the keyboard briefly
    fn show(&mut self, frame: &RgbImage) -> Result<ViewerAction>;
}

/// Holds the output size once the first frame arrives and rejects any other size afterwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameSizeLock {
    size: Option<(u32, u32)>,
}

impl FrameSizeLock {
    pub fn get(&self) -> Option<(u32, u32)> {
        self.size
    }

    /// Returns `true` when this call established the size.
    pub fn check(&mut self, size: (u32, u32)) -> Result<bool> {
        match self.size {
            None => {
                self.size = Some(size);
                Ok(true)
            }
            Some(expected) if expected == size => Ok(false),
            Some(expected) => Err(SegError::FrameSizeMismatch {
                expected,
                actual: size,
            }),
        }
    }
}
