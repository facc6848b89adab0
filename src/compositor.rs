//! Turns network scores into a colored class mask blended over the frame.

use crate::error::{Result, SegError};
use crate::labels::Palette;
use crate::segmentation::ScoreVolume;
use image::{Rgb, RgbImage};
use ndarray::{Array2, ArrayView3, Axis};

/// Weight of the source frame in the blend, in tenths; the mask gets the rest.
const FRAME_WEIGHT: u16 = 3;
const MASK_WEIGHT: u16 = 10 - FRAME_WEIGHT;

/// Predicted class index per pixel, indexed `[row, col]` at the network's output resolution.
pub type ClassMap = Array2<usize>;

/// Applies a palette to score volumes for frames of any size.
pub struct Compositor<'a> {
    palette: &'a Palette,
}

impl<'a> Compositor<'a> {
    pub fn new(palette: &'a Palette) -> Self {
        Self { palette }
    }

    /// Fail unless `scores` is a single-batch volume with one plane per palette class.
    pub fn validate(&self, scores: &ScoreVolume) -> Result<()> {
        let shape = scores.shape();
        if shape[0] != 1 {
            return Err(SegError::model(
                "output batch",
                format!("expected batch size 1, got {}", shape[0]),
            ));
        }
        if shape[1] != self.palette.len() {
            return Err(SegError::ClassCountMismatch {
                source_name: "model output".to_string(),
                expected: self.palette.len(),
                actual: shape[1],
            });
        }
        Ok(())
    }

    /// Produce the blended frame for one inference result.
    pub fn composite(&self, frame: &RgbImage, scores: &ScoreVolume) -> Result<RgbImage> {
        let _span = tracing::debug_span!("composite").entered();

        self.validate(scores)?;
        let class_map = argmax_classes(scores.index_axis(Axis(0), 0));
        let mask = colorize(&class_map, self.palette)?;
        let (width, height) = frame.dimensions();
        let mask = resize_nearest(&mask, width, height);
        blend(frame, &mask)
    }
}

/// Index of the highest-scoring class at every pixel of a `[classes, height, width]` volume.
///
/// Ties go to the lowest class index.
pub fn argmax_classes(scores: ArrayView3<f32>) -> ClassMap {
    let (_, height, width) = scores.dim();
    let mut best = Array2::<f32>::from_elem((height, width), f32::NEG_INFINITY);
    let mut map = ClassMap::zeros((height, width));

    for (class, plane) in scores.axis_iter(Axis(0)).enumerate() {
        ndarray::Zip::from(&mut map)
            .and(&mut best)
            .and(plane)
            .for_each(|index, top, &score| {
                if score > *top {
                    *top = score;
                    *index = class;
                }
            });
    }
    map
}

/// Look up each class index in the palette.
pub fn colorize(class_map: &ClassMap, palette: &Palette) -> Result<RgbImage> {
    let (height, width) = class_map.dim();
    let mut mask = RgbImage::new(width as u32, height as u32);

    for ((row, col), &class) in class_map.indexed_iter() {
        let color = palette
            .color(class)
            .ok_or_else(|| SegError::ClassCountMismatch {
                source_name: "class map".to_string(),
                expected: palette.len(),
                actual: class + 1,
            })?;
        mask.put_pixel(col as u32, row as u32, color);
    }
    Ok(mask)
}

/// Nearest-neighbor resize; only colors present in `image` appear in the result.
///
/// Destination pixel `x` samples source pixel `floor(x * src_width / width)`, likewise for rows.
pub fn resize_nearest(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (src_width, src_height) = image.dimensions();
    if (src_width, src_height) == (width, height) {
        return image.clone();
    }

    let src_x = |x: u32| ((u64::from(x) * u64::from(src_width)) / u64::from(width)) as u32;
    let src_y = |y: u32| ((u64::from(y) * u64::from(src_height)) / u64::from(height)) as u32;

    RgbImage::from_fn(width, height, |x, y| *image.get_pixel(src_x(x), src_y(y)))
}

/// `round(0.3 * frame + 0.7 * mask)` per channel.
pub fn blend(frame: &RgbImage, mask: &RgbImage) -> Result<RgbImage> {
    if frame.dimensions() != mask.dimensions() {
        return Err(SegError::FrameSizeMismatch {
            expected: frame.dimensions(),
            actual: mask.dimensions(),
        });
    }

    let (width, height) = frame.dimensions();
    Ok(RgbImage::from_fn(width, height, |x, y| {
        blend_pixel(*frame.get_pixel(x, y), *mask.get_pixel(x, y))
    }))
}

pub fn blend_pixel(frame: Rgb<u8>, mask: Rgb<u8>) -> Rgb<u8> {
    let mix = |f: u8, m: u8| {
        let sum = FRAME_WEIGHT * u16::from(f) + MASK_WEIGHT * u16::from(m);
        ((sum + 5) / 10).min(255) as u8
    };
    Rgb([
        mix(frame[0], mask[0]),
        mix(frame[1], mask[1]),
        mix(frame[2], mask[2]),
    ])
}
