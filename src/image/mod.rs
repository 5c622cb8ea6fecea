//! Image loading, saving, and folder listing utilities.

mod load;
mod save;

pub use load::{list_images, load_color, load_gray};
pub use save::{save_image, OutputImage};

use image::RgbImage;

/// Order of the color channels a network was trained on.
///
/// Images decode as RGB; networks trained through OpenCV expect BGR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ChannelOrder {
    #[default]
    Bgr,
    Rgb,
}

impl ChannelOrder {
    /// Reorder an RGB image into this channel order, or back. The swap is its
    /// own inverse.
    pub fn apply(self, image: &mut RgbImage) {
        if self == Self::Bgr {
            swap_red_blue(image);
        }
    }
}

/// Swap the first and third channel of every pixel in place.
pub fn swap_red_blue(image: &mut RgbImage) {
    for pixel in image.pixels_mut() {
        pixel.0.swap(0, 2);
    }
}
