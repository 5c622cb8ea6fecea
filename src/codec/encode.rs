//! Pixel buffer to tensor encoding.

use std::borrow::Cow;

use image::{imageops, imageops::FilterType, GrayImage, ImageBuffer, Pixel};
use ndarray::ArrayViewMut4;

use crate::error::{Error, Result};

use super::{Normalization, TensorShape};

/// Write a single-channel image into a `(1, 1, H, W)` tensor.
///
/// The image is resized to the tensor's spatial size first when needed.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the tensor does not have exactly one
/// batch item and one channel, or if either side has empty dimensions.
pub fn encode_grayscale(
    image: &GrayImage,
    tensor: ArrayViewMut4<'_, f32>,
    normalization: Normalization,
) -> Result<()> {
    let shape = TensorShape::from(tensor.dim());
    shape.expect_single_batch()?;
    shape.expect_channels(1)?;

    fill_planes(image, tensor, shape, normalization)
}

/// Write an interleaved multi-channel image into a `(1, C, H, W)` tensor.
///
/// Channel `c` of pixel `(h, w)` lands at planar offset `c*H*W + h*W + w`.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the tensor's channel count differs
/// from the pixel type's, or its batch dimension is not 1.
pub fn encode_multi_channel<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    tensor: ArrayViewMut4<'_, f32>,
    normalization: Normalization,
) -> Result<()>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let shape = TensorShape::from(tensor.dim());
    shape.expect_single_batch()?;
    shape.expect_channels(usize::from(P::CHANNEL_COUNT))?;

    fill_planes(image, tensor, shape, normalization)
}

/// Resize `image` to exactly `width` x `height` with bilinear filtering.
///
/// Returns the input untouched when it already has the requested size.
#[must_use]
pub fn fit_to<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    width: u32,
    height: u32,
) -> Cow<'_, ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    if image.dimensions() == (width, height) {
        return Cow::Borrowed(image);
    }

    tracing::debug!(
        "Resizing {}x{} -> {width}x{height}",
        image.width(),
        image.height()
    );
    Cow::Owned(imageops::resize(image, width, height, FilterType::Triangle))
}

fn fill_planes<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    mut tensor: ArrayViewMut4<'_, f32>,
    shape: TensorShape,
    normalization: Normalization,
) -> Result<()>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (width, height) = shape.spatial()?;

    if image.width() == 0 || image.height() == 0 {
        return Err(Error::ShapeMismatch {
            expected: "non-empty image".to_string(),
            actual: format!("{}x{}", image.width(), image.height()),
        });
    }

    let resized = fit_to(image, width, height);

    for (x, y, pixel) in resized.enumerate_pixels() {
        let (h, w) = (y as usize, x as usize);
        for (c, &value) in pixel.channels().iter().enumerate() {
            tensor[[0, c, h, w]] = normalization.apply(value);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};
    use ndarray::Array4;

    #[test]
    fn test_grayscale_normalization_values() {
        let mut img = GrayImage::from_pixel(224, 224, Luma([128]));
        img.put_pixel(0, 0, Luma([0]));

        let mut tensor = Array4::<f32>::zeros((1, 1, 224, 224));
        encode_grayscale(&img, tensor.view_mut(), Normalization::CENTERED).unwrap();

        assert_eq!(tensor.shape(), &[1, 1, 224, 224]);
        assert!((tensor[[0, 0, 0, 0]] + 0.5).abs() < f32::EPSILON);
        assert!(tensor[[0, 0, 100, 100]].abs() < f32::EPSILON);
    }

    #[test]
    fn test_grayscale_symmetric_normalization() {
        let img = GrayImage::from_pixel(8, 8, Luma([255]));
        let mut tensor = Array4::<f32>::zeros((1, 1, 8, 8));
        encode_grayscale(&img, tensor.view_mut(), Normalization::SYMMETRIC).unwrap();

        assert!(tensor.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_grayscale_rejects_multi_channel_tensor() {
        let img = GrayImage::new(4, 4);
        let mut tensor = Array4::<f32>::zeros((1, 3, 4, 4));
        let err = encode_grayscale(&img, tensor.view_mut(), Normalization::CENTERED);

        assert!(matches!(err, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_grayscale_rejects_batched_tensor() {
        let img = GrayImage::new(4, 4);
        let mut tensor = Array4::<f32>::zeros((2, 1, 4, 4));
        let err = encode_grayscale(&img, tensor.view_mut(), Normalization::CENTERED);

        assert!(matches!(err, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_grayscale_rejects_empty_image() {
        let img = GrayImage::new(0, 0);
        let mut tensor = Array4::<f32>::zeros((1, 1, 4, 4));
        let err = encode_grayscale(&img, tensor.view_mut(), Normalization::CENTERED);

        assert!(matches!(err, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_resize_to_tensor_shape() {
        let img = GrayImage::from_pixel(100, 100, Luma([64]));
        let mut tensor = Array4::<f32>::from_elem((1, 1, 224, 224), f32::NAN);
        encode_grayscale(&img, tensor.view_mut(), Normalization::CENTERED).unwrap();

        assert_eq!(tensor.shape(), &[1, 1, 224, 224]);
        // A flat image stays flat through bilinear resampling.
        let expected = Normalization::CENTERED.apply(64);
        assert!(tensor.iter().all(|&v| (v - expected).abs() < 1e-6));
    }

    #[test]
    fn test_fit_to_is_noop_for_matching_size() {
        let img = GrayImage::from_fn(6, 4, |x, y| Luma([(x * 10 + y) as u8]));

        let fitted = fit_to(&img, 6, 4);
        assert!(matches!(fitted, Cow::Borrowed(_)));
        assert_eq!(fitted.as_raw(), img.as_raw());

        let resized = fit_to(&img, 3, 2);
        assert_eq!(resized.dimensions(), (3, 2));
    }

    #[test]
    fn test_multi_channel_is_planar() {
        let img = RgbImage::from_fn(5, 3, |x, y| Rgb([x as u8, y as u8, 200]));
        let mut tensor = Array4::<f32>::zeros((1, 3, 3, 5));
        let norm = Normalization {
            divisor: 1.0,
            offset: 0.0,
        };
        encode_multi_channel(&img, tensor.view_mut(), norm).unwrap();

        let shape = TensorShape::from(tensor.dim());
        let flat = tensor.as_slice().unwrap();
        for c in 0..3 {
            for h in 0..3 {
                for w in 0..5 {
                    let expected = f32::from(img.get_pixel(w as u32, h as u32)[c]);
                    assert_eq!(flat[shape.planar_offset(c, h, w)], expected);
                }
            }
        }
    }

    #[test]
    fn test_multi_channel_rejects_channel_mismatch() {
        let img = RgbImage::new(4, 4);
        let mut tensor = Array4::<f32>::zeros((1, 1, 4, 4));
        let err = encode_multi_channel(&img, tensor.view_mut(), Normalization::CENTERED);

        assert!(matches!(err, Err(Error::ShapeMismatch { .. })));
    }
}
