use super::{FrameSink, FrameSizeLock};
use crate::convert::rgb_to_mat;
use crate::error::{Result, SegError};
use image::RgbImage;
use opencv::{
    core::Size,
    prelude::*,
    videoio::VideoWriter,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_FPS: f64 = 30.0;

/// Four-character codec tag, e.g. `MJPG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourCc([char; 4]);

impl Default for FourCc {
    fn default() -> Self {
        Self(['M', 'J', 'P', 'G'])
    }
}

impl FourCc {
    fn code(&self) -> Result<i32> {
        let [a, b, c, d] = self.0;
        VideoWriter::fourcc(a, b, c, d).map_err(|e| SegError::video("codec tag", e))
    }
}

impl FromStr for FourCc {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        match chars.as_slice() {
            &[a, b, c, d] if chars.iter().all(char::is_ascii_graphic) => {
                Ok(Self([a, b, c, d]))
            }
            _ => Err(format!("{s:?} is not a four-character ASCII codec tag")),
        }
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

/// Video file written with OpenCV's `VideoWriter`.
///
/// The encoder is opened on the first frame, sized to that frame. Later frames of a different
/// size are rejected with `FrameSizeMismatch`.
pub struct VideoFileSink {
    path: PathBuf,
    fps: f64,
    fourcc: FourCc,
    writer: Option<VideoWriter>,
    size: FrameSizeLock,
    frames_written: u64,
}

impl VideoFileSink {
    pub fn new<P: AsRef<Path>>(path: P, fps: f64, fourcc: FourCc) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            fps,
            fourcc,
            writer: None,
            size: FrameSizeLock::default(),
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn open(&self, (width, height): (u32, u32)) -> Result<VideoWriter> {
        let operation = || format!("open encoder for {}", self.path.display());
        let writer = VideoWriter::new(
            &self.path.to_string_lossy(),
            self.fourcc.code()?,
            self.fps,
            Size::new(width as i32, height as i32),
            true,
        )
        .map_err(|e| SegError::video(operation(), e))?;

        if !writer.is_opened().map_err(|e| SegError::video(operation(), e))? {
            return Err(SegError::config(format!(
                "could not open {} for writing with codec {}",
                self.path.display(),
                self.fourcc
            )));
        }

        tracing::info!(
            "Writing {} at {}x{}, {} fps, codec {}",
            self.path.display(),
            width,
            height,
            self.fps,
            self.fourcc
        );
        Ok(writer)
    }
}

impl FrameSink for VideoFileSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if self.size.check(frame.dimensions())? {
            self.writer = Some(self.open(frame.dimensions())?);
        }
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| SegError::config("video encoder is not open"))?;

        let mat = rgb_to_mat(frame)?;
        writer
            .write(&mat)
            .map_err(|e| SegError::video("frame encode", e))?;
        self.frames_written += 1;
        Ok(())
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        self.size.get()
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .release()
                .map_err(|e| SegError::video("encoder release", e))?;
            tracing::debug!("{}: {} frames written", self.path.display(), self.frames_written);
        }
        Ok(())
    }
}

impl Drop for VideoFileSink {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::warn!("Failed to release {}: {}", self.path.display(), e);
        }
    }
}
