use crate::error::{Result, SegError};
use crate::labels::Palette;
use image::Rgb;
use opencv::{
    core::{Mat, Point, Scalar, CV_8UC3},
    imgproc,
};

pub const LEGEND_WIDTH: i32 = 300;
pub const LEGEND_ROW_HEIGHT: i32 = 25;
const SWATCH_LEFT: i32 = 100;
const TEXT_LEFT: i32 = 5;
const TEXT_BASELINE: i32 = 17;

/// Render class names with their color swatches, one 25px row per class plus a 25px margin.
pub fn render_legend(palette: &Palette) -> Result<Mat> {
    let rows = palette.len() as i32 * LEGEND_ROW_HEIGHT + LEGEND_ROW_HEIGHT;
    let mut legend = Mat::new_rows_cols_with_default(rows, LEGEND_WIDTH, CV_8UC3, Scalar::all(0.0))
        .map_err(|e| SegError::video("legend allocation", e))?;

    for (i, (name, color)) in palette.entries().enumerate() {
        let top = i as i32 * LEGEND_ROW_HEIGHT;
        imgproc::put_text(
            &mut legend,
            name,
            Point::new(TEXT_LEFT, top + TEXT_BASELINE),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.5,
            Scalar::new(0.0, 0.0, 255.0, 0.0),
            2,
            imgproc::LINE_8,
            false,
        )
        .map_err(|e| SegError::video("legend text", e))?;
        imgproc::rectangle_points(
            &mut legend,
            Point::new(SWATCH_LEFT, top),
            Point::new(LEGEND_WIDTH, top + LEGEND_ROW_HEIGHT),
            bgr_scalar(color),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )
        .map_err(|e| SegError::video("legend swatch", e))?;
    }

    Ok(legend)
}

fn bgr_scalar(color: Rgb<u8>) -> Scalar {
    let [r, g, b] = color.0;
    Scalar::new(f64::from(b), f64::from(g), f64::from(r), 0.0)
}
