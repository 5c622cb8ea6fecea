//! Conversion between 8-bit pixel buffers and channel-planar `f32` tensors.
//!
//! Tensors are `ndarray` 4-D arrays shaped `(batch, channels, height, width)`.
//! The codec never owns them: encoders fill a caller-supplied mutable view and
//! decoders read from a borrowed view, so the same buffers can be reused
//! across images.

mod decode;
mod encode;

pub use decode::{decode_probability_map, decode_single_channel};
pub use encode::{encode_grayscale, encode_multi_channel, fit_to};

use std::fmt;

use crate::error::{Error, Result};

/// Number of planes in the segmentation probability output (background plus
/// three foreground classes).
pub const PROBABILITY_PLANES: usize = 4;

/// Affine map from an 8-bit pixel to the float range a network expects.
///
/// Encoding computes `pixel / divisor + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub divisor: f32,
    pub offset: f32,
}

impl Normalization {
    /// `pixel / 256 - 0.5`, roughly `[-0.5, 0.5)`.
    pub const CENTERED: Self = Self {
        divisor: 256.0,
        offset: -0.5,
    };

    /// `pixel / 127.5 - 1`, exactly `[-1, 1]`.
    pub const SYMMETRIC: Self = Self {
        divisor: 127.5,
        offset: -1.0,
    };

    #[inline]
    #[must_use]
    pub fn apply(self, value: u8) -> f32 {
        f32::from(value) / self.divisor + self.offset
    }
}

impl Default for Normalization {
    fn default() -> Self {
        Self::CENTERED
    }
}

/// Declared shape of an NCHW tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorShape {
    pub batch: usize,
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl TensorShape {
    #[must_use]
    pub const fn new(batch: usize, channels: usize, height: usize, width: usize) -> Self {
        Self {
            batch,
            channels,
            height,
            width,
        }
    }

    /// Offset of `(c, h, w)` inside the first batch item of a contiguous
    /// channel-planar buffer.
    #[must_use]
    pub const fn planar_offset(&self, c: usize, h: usize, w: usize) -> usize {
        c * self.height * self.width + h * self.width + w
    }

    /// Total number of elements.
    #[must_use]
    pub const fn element_count(&self) -> usize {
        self.batch * self.channels * self.height * self.width
    }

    /// Shape as an `ndarray` pattern.
    #[must_use]
    pub const fn dim(&self) -> (usize, usize, usize, usize) {
        (self.batch, self.channels, self.height, self.width)
    }

    pub(crate) fn expect_single_batch(&self) -> Result<()> {
        if self.batch == 1 {
            Ok(())
        } else {
            Err(Error::ShapeMismatch {
                expected: "batch of 1".to_string(),
                actual: format!("batch of {}", self.batch),
            })
        }
    }

    pub(crate) fn expect_channels(&self, expected: usize) -> Result<()> {
        if self.channels == expected {
            Ok(())
        } else {
            Err(Error::channels(expected, self.channels))
        }
    }

    /// Spatial size as image dimensions `(width, height)`.
    pub(crate) fn spatial(&self) -> Result<(u32, u32)> {
        let invalid = || Error::ShapeMismatch {
            expected: "non-empty spatial dimensions within u32".to_string(),
            actual: format!("{}x{}", self.width, self.height),
        };

        if self.width == 0 || self.height == 0 {
            return Err(invalid());
        }

        let width = u32::try_from(self.width).map_err(|_| invalid())?;
        let height = u32::try_from(self.height).map_err(|_| invalid())?;
        Ok((width, height))
    }
}

impl From<(usize, usize, usize, usize)> for TensorShape {
    fn from((batch, channels, height, width): (usize, usize, usize, usize)) -> Self {
        Self::new(batch, channels, height, width)
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{}x{}",
            self.batch, self.channels, self.height, self.width
        )
    }
}
