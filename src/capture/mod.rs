mod video_file;

pub use video_file::VideoFileSource;

use crate::error::Result;
use image::RgbImage;

/// Total frame count as reported by the container, when it reports one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCount {
    Known(u64),
    Unknown,
}

impl FrameCount {
    /// Interpret a raw container property; zero, negative and non-finite values are unknown.
    pub fn from_property(value: f64) -> Self {
        if value.is_finite() && value >= 1.0 {
            FrameCount::Known(value as u64)
        } else {
            FrameCount::Unknown
        }
    }

    pub fn known(self) -> Option<u64> {
        match self {
            FrameCount::Known(n) => Some(n),
            FrameCount::Unknown => None,
        }
    }
}

/// Trait for sequential frame sources
pub trait FrameSource {
    /// Decode the next frame, or `None` once the stream is exhausted
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Best-effort total frame count; advisory only
    fn frame_count(&self) -> FrameCount {
        FrameCount::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_count_from_property() {
        assert_eq!(FrameCount::from_property(120.0), FrameCount::Known(120));
        assert_eq!(FrameCount::from_property(0.0), FrameCount::Unknown);
        assert_eq!(FrameCount::from_property(-1.0), FrameCount::Unknown);
        assert_eq!(FrameCount::from_property(f64::NAN), FrameCount::Unknown);
        assert_eq!(FrameCount::Known(3).known(), Some(3));
    }
}
