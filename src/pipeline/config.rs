//! Driver configuration.

use std::path::PathBuf;

use crate::codec::Normalization;
use crate::error::{Error, Result};
use crate::image::ChannelOrder;
use crate::model::ModelFiles;

/// Which of the three demo programs to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Variant {
    /// One grayscale image in, one grayscale mask out.
    Gray,
    /// A folder of grayscale images in, 3-class probability maps out.
    Batch,
    /// One color image in, one grayscale mask out.
    Color,
}

/// Configuration for a driver run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Program to run.
    pub variant: Variant,

    /// Directory holding the model files.
    pub model_dir: PathBuf,

    /// Model base name, resolved to `<name>.onnx` inside `model_dir`.
    pub model_name: String,

    /// Input image, or input folder for [`Variant::Batch`].
    pub input: PathBuf,

    /// Output image, or output folder for [`Variant::Batch`].
    pub output: PathBuf,

    /// Intra-op thread count handed to the runtime.
    pub threads: usize,

    /// Pixel normalization applied while encoding.
    pub normalization: Normalization,

    /// Channel order the network expects for color data.
    pub channel_order: ChannelOrder,

    /// Passed to probability-map decoding. Currently has no effect.
    pub background_threshold: f32,

    /// `(width, height)` used when the model input has dynamic spatial dims.
    pub fallback_input_size: (u32, u32),
}

impl Config {
    /// Single grayscale image through `zf_unet_224_one_channel`.
    #[must_use]
    pub fn gray() -> Self {
        Self {
            variant: Variant::Gray,
            model_name: "zf_unet_224_one_channel".to_string(),
            ..Self::base()
        }
    }

    /// Folder of grayscale images through `final_combined_alpha0.5_weights`.
    #[must_use]
    pub fn batch() -> Self {
        Self {
            variant: Variant::Batch,
            model_name: "final_combined_alpha0.5_weights".to_string(),
            input: PathBuf::from("input_folder"),
            output: PathBuf::from("output_folder"),
            normalization: Normalization::SYMMETRIC,
            ..Self::base()
        }
    }

    /// Single color image through `zf_unet_224`.
    #[must_use]
    pub fn color() -> Self {
        Self {
            variant: Variant::Color,
            model_name: "zf_unet_224".to_string(),
            ..Self::base()
        }
    }

    /// Defaults for `variant`.
    #[must_use]
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Gray => Self::gray(),
            Variant::Batch => Self::batch(),
            Variant::Color => Self::color(),
        }
    }

    fn base() -> Self {
        Self {
            variant: Variant::Gray,
            model_dir: PathBuf::from("."),
            model_name: String::new(),
            input: PathBuf::from("input.png"),
            output: PathBuf::from("output_image.png"),
            threads: 1,
            normalization: Normalization::CENTERED,
            channel_order: ChannelOrder::Bgr,
            background_threshold: 0.5,
            fallback_input_size: (224, 224),
        }
    }

    /// Model files named by this configuration.
    #[must_use]
    pub fn model_files(&self) -> ModelFiles {
        ModelFiles::new(&self.model_dir, &self.model_name)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.model_name.is_empty() {
            return Err(Error::InvalidParameter {
                name: "model_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.threads == 0 {
            return Err(Error::InvalidParameter {
                name: "threads".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        let divisor = self.normalization.divisor;
        if !divisor.is_finite() || divisor == 0.0 || !self.normalization.offset.is_finite() {
            return Err(Error::InvalidParameter {
                name: "normalization".to_string(),
                reason: "divisor must be finite and non-zero, offset finite".to_string(),
            });
        }

        let (width, height) = self.fallback_input_size;
        if width == 0 || height == 0 {
            return Err(Error::InvalidParameter {
                name: "fallback_input_size".to_string(),
                reason: "must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::gray()
    }
}
