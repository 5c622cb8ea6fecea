//! Image loading utilities.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, RgbImage};

use crate::error::{Error, Result};

use super::ChannelOrder;

/// Load an image from disk as 8-bit grayscale.
///
/// Color images are converted with the usual luma weights.
///
/// # Errors
///
/// Returns an error if the image cannot be opened or decoded.
pub fn load_gray<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    Ok(open(path.as_ref())?.into_luma8())
}

/// Load an image from disk as 8-bit 3-channel color in the given channel
/// order.
///
/// # Errors
///
/// Returns an error if the image cannot be opened or decoded.
pub fn load_color<P: AsRef<Path>>(path: P, order: ChannelOrder) -> Result<RgbImage> {
    let mut rgb = open(path.as_ref())?.into_rgb8();
    order.apply(&mut rgb);
    Ok(rgb)
}

/// List the regular files of `dir`, sorted by file name.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn list_images<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let read_dir_error = |source| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_error)? {
        let path = entry.map_err(read_dir_error)?.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn open(path: &Path) -> Result<DynamicImage> {
    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        "Loaded {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );

    Ok(img)
}
