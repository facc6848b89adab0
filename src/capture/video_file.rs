use super::{FrameCount, FrameSource};
use crate::convert::mat_to_rgb;
use crate::error::{Result, SegError};
use image::RgbImage;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY, CAP_PROP_FRAME_COUNT},
};
use std::path::{Path, PathBuf};

/// Frames decoded sequentially from a video file.
pub struct VideoFileSource {
    capture: VideoCapture,
    path: PathBuf,
    frames_read: u64,
}

impl VideoFileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Opening video {}", path.display());

        let capture = VideoCapture::from_file(&path.to_string_lossy(), CAP_ANY)
            .map_err(|e| SegError::video(format!("open {}", path.display()), e))?;
        let opened = capture
            .is_opened()
            .map_err(|e| SegError::video(format!("open {}", path.display()), e))?;
        if !opened {
            return Err(SegError::config(format!(
                "could not open video {}",
                path.display()
            )));
        }

        Ok(Self {
            capture,
            path: path.to_path_buf(),
            frames_read: 0,
        })
    }
}

impl FrameSource for VideoFileSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let mut mat = Mat::default();
        let grabbed = self
            .capture
            .read(&mut mat)
            .map_err(|e| SegError::video("frame decode", e))?;
        if !grabbed || mat.empty() {
            tracing::debug!("{}: end of stream after {} frames", self.path.display(), self.frames_read);
            return Ok(None);
        }

        self.frames_read += 1;
        mat_to_rgb(&mat).map(Some)
    }

    fn frame_count(&self) -> FrameCount {
        match self.capture.get(CAP_PROP_FRAME_COUNT) {
            Ok(value) => FrameCount::from_property(value),
            Err(e) => {
                tracing::debug!("frame count query failed: {}", e);
                FrameCount::Unknown
            }
        }
    }
}

impl Drop for VideoFileSource {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            tracing::warn!("Failed to release {}: {}", self.path.display(), e);
        }
    }
}
