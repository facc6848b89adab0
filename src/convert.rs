//! Conversions between OpenCV's BGR `Mat` and `image::RgbImage`.

use crate::error::{Result, SegError};
use image::RgbImage;
use opencv::{
    core::{Mat, Scalar, CV_8UC3},
    imgproc,
    prelude::*,
};

/// Convert a decoded 8-bit BGR frame into an RGB image.
pub fn mat_to_rgb(mat: &Mat) -> Result<RgbImage> {
    if mat.typ() != CV_8UC3 {
        return Err(SegError::Image {
            message: format!("expected an 8-bit 3-channel frame, got Mat type {}", mat.typ()),
        });
    }
    let mut rgb = Mat::default();
    imgproc::cvt_color(mat, &mut rgb, imgproc::COLOR_BGR2RGB, 0)
        .map_err(|e| SegError::video("BGR to RGB conversion", e))?;
    mat_to_packed(&rgb)
}

/// Convert an RGB image into an 8-bit BGR `Mat` for encoding or display.
pub fn rgb_to_mat(image: &RgbImage) -> Result<Mat> {
    let rgb = packed_to_mat(image)?;
    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0)
        .map_err(|e| SegError::video("RGB to BGR conversion", e))?;
    Ok(bgr)
}

/// Copy an image into a 3-channel `Mat` without touching channel order.
pub(crate) fn packed_to_mat(image: &RgbImage) -> Result<Mat> {
    let (width, height) = image.dimensions();
    let mut mat = Mat::new_rows_cols_with_default(
        height as i32,
        width as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )
    .map_err(|e| SegError::video("frame allocation", e))?;
    mat.data_bytes_mut()
        .map_err(|e| SegError::video("frame data access", e))?
        .copy_from_slice(image.as_raw());
    Ok(mat)
}

/// Inverse of [`packed_to_mat`].
pub(crate) fn mat_to_packed(mat: &Mat) -> Result<RgbImage> {
    let (width, height) = (mat.cols() as u32, mat.rows() as u32);
    let data = if mat.is_continuous() {
        mat.data_bytes()
            .map_err(|e| SegError::video("frame data access", e))?
            .to_vec()
    } else {
        mat.try_clone()
            .map_err(|e| SegError::video("frame copy", e))?
            .data_bytes()
            .map_err(|e| SegError::video("frame data access", e))?
            .to_vec()
    };

    RgbImage::from_raw(width, height, data).ok_or_else(|| SegError::Image {
        message: format!("frame buffer does not hold {width}x{height} RGB pixels"),
    })
}
