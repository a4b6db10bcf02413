//! Image normalization for model input.

use crate::error::{Error, Result};
use image::{DynamicImage, GrayImage};
use ndarray::Array4;

/// Model input resolution (square).
pub const MODEL_INPUT_SIZE: u32 = 256;

const MEAN: f32 = 0.5;
const STD: f32 = 0.5;

/// Convert a decoded upload into the model's input tensor.
///
/// Grayscale conversion (standard luminance weighting for color sources),
/// bilinear resize to 256x256, then per-sample `(v/255 - 0.5) / 0.5`, shaped
/// `[batch=1, channel=1, 256, 256]`.
///
/// Bilinear (`FilterType::Triangle`) matches the interpolation the model was
/// trained with; sample values are not bit-exact across resampling
/// implementations.
pub fn preprocess_image(img: &DynamicImage) -> Result<Array4<f32>> {
    let gray = to_grayscale(img)?;
    let resized = image::imageops::resize(
        &gray,
        MODEL_INPUT_SIZE,
        MODEL_INPUT_SIZE,
        image::imageops::FilterType::Triangle,
    );

    let side = MODEL_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 1, side, side));
    for (x, y, pixel) in resized.enumerate_pixels() {
        tensor[[0, 0, y as usize, x as usize]] = (pixel[0] as f32 / 255.0 - MEAN) / STD;
    }

    Ok(tensor)
}

/// Reduce an image to a single grayscale channel.
fn to_grayscale(img: &DynamicImage) -> Result<GrayImage> {
    let channels = img.color().channel_count();
    if channels == 0 || channels > 4 {
        return Err(Error::InvalidChannelCount(channels));
    }
    Ok(img.to_luma8())
}
