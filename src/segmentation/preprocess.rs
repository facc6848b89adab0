use crate::convert::{mat_to_packed, packed_to_mat};
use crate::error::{Result, SegError};
use image::{imageops, RgbImage};
use ndarray::Array4;
use opencv::{
    core::{Mat, Size},
    imgproc,
};

/// Fixed network input resolution (width, height).
pub const NETWORK_INPUT_SIZE: (u32, u32) = (1024, 512);

/// Preprocessor for converting RGB frames to model input tensors
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(NETWORK_INPUT_SIZE.0, NETWORK_INPUT_SIZE.1)
    }
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Preprocess an RGB image into a normalized NCHW tensor
    ///
    /// Steps:
    /// 1. Bilinear resize to the network input size (aspect ratio not preserved)
    /// 2. Scale to [0, 1]
    /// 3. Lay out as RGB planes
    ///
    /// Returns: Array4<f32> with shape [1, 3, height, width]
    pub fn preprocess(&self, image: &RgbImage) -> Result<Array4<f32>> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized = if image.dimensions() != (self.target_width, self.target_height) {
            imageops::resize(
                image,
                self.target_width,
                self.target_height,
                imageops::FilterType::Triangle,
            )
        } else {
            image.clone()
        };

        let (width, height) = resized.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            tensor[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
            tensor[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
            tensor[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
        }

        Ok(tensor)
    }
}

/// Resize a frame to `width`, keeping its aspect ratio.
///
/// The new height is truncated, never below one row. Pixels are area-averaged (`INTER_AREA`).
/// Frames already at `width` are returned as-is.
pub fn resize_to_width(frame: &RgbImage, width: u32) -> Result<RgbImage> {
    let (w, h) = frame.dimensions();
    if w == width || w == 0 {
        return Ok(frame.clone());
    }
    let height = ((u64::from(h) * u64::from(width)) / u64::from(w)).max(1) as u32;

    let src = packed_to_mat(frame)?;
    let mut dst = Mat::default();
    imgproc::resize(
        &src,
        &mut dst,
        Size::new(width as i32, height as i32),
        0.0,
        0.0,
        imgproc::INTER_AREA,
    )
    .map_err(|e| SegError::video("working-width resize", e))?;
    mat_to_packed(&dst)
}
