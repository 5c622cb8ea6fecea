//! Tensor to pixel buffer decoding.

use image::{GrayImage, Luma, Rgb, RgbImage};
use ndarray::ArrayView4;

use crate::error::Result;

use super::{TensorShape, PROBABILITY_PLANES};

/// Scale applied to single-channel network outputs.
const MASK_SCALE: f32 = 256.0;

/// Scale applied to class probabilities.
const PROBABILITY_SCALE: f32 = 255.0;

/// Convert a `(1, 1, H, W)` tensor into an `H x W` grayscale image.
///
/// Each pixel is `value * 256`, clamped to `[0, 255]`.
///
/// # Errors
///
/// Returns [`crate::Error::ShapeMismatch`] if the tensor does not have exactly
/// one batch item and one channel.
pub fn decode_single_channel(tensor: ArrayView4<'_, f32>) -> Result<GrayImage> {
    let shape = TensorShape::from(tensor.dim());
    shape.expect_single_batch()?;
    shape.expect_channels(1)?;
    let (width, height) = shape.spatial()?;

    Ok(GrayImage::from_fn(width, height, |x, y| {
        Luma([to_byte(tensor[[0, 0, y as usize, x as usize]], MASK_SCALE)])
    }))
}

/// Convert a 4-plane class probability tensor into a 3-channel image.
///
/// Output channel `c` holds plane `c` scaled by 255 and clamped; the fourth
/// plane is not rendered. `background_threshold` is accepted for interface
/// compatibility and currently has no effect on the output.
///
/// # Errors
///
/// Returns [`crate::Error::ShapeMismatch`] if the tensor does not have
/// exactly four channels and one batch item.
pub fn decode_probability_map(
    tensor: ArrayView4<'_, f32>,
    _background_threshold: f32,
) -> Result<RgbImage> {
    let shape = TensorShape::from(tensor.dim());
    shape.expect_single_batch()?;
    shape.expect_channels(PROBABILITY_PLANES)?;
    let (width, height) = shape.spatial()?;

    Ok(RgbImage::from_fn(width, height, |x, y| {
        let (h, w) = (y as usize, x as usize);
        Rgb([
            to_byte(tensor[[0, 0, h, w]], PROBABILITY_SCALE),
            to_byte(tensor[[0, 1, h, w]], PROBABILITY_SCALE),
            to_byte(tensor[[0, 2, h, w]], PROBABILITY_SCALE),
        ])
    }))
}

/// Scale and clamp a tensor value into a byte. NaN maps to 0.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(value: f32, scale: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    (value * scale).clamp(0.0, 255.0) as u8
}
