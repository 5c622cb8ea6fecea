//! Image saving utilities.

use std::path::Path;

use image::{GrayImage, RgbImage};

use crate::error::{Error, Result};

use super::ChannelOrder;

/// An image the drivers can write to disk.
pub enum OutputImage {
    Gray(GrayImage),
    Color(RgbImage),
}

impl From<GrayImage> for OutputImage {
    fn from(img: GrayImage) -> Self {
        Self::Gray(img)
    }
}

impl From<RgbImage> for OutputImage {
    fn from(img: RgbImage) -> Self {
        Self::Color(img)
    }
}

/// Save a decoded image to `path`, format inferred from the extension.
///
/// Color images are assumed to be in `order` and are written as RGB.
///
/// # Errors
///
/// Returns an error if the image cannot be encoded or written.
pub fn save_image<I, P>(image: I, path: P, order: ChannelOrder) -> Result<()>
where
    I: Into<OutputImage>,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let result = match image.into() {
        OutputImage::Gray(img) => img.save(path),
        OutputImage::Color(mut img) => {
            order.apply(&mut img);
            img.save(path)
        }
    };

    result.map_err(|source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Saved {}", path.display());
    Ok(())
}
