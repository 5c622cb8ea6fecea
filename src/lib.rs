//! # opvnn
//!
//! Conversion between 8-bit images and channel-planar network tensors, plus
//! three small segmentation drivers built on ONNX Runtime:
//!
//! - `gray`: one grayscale image in, one grayscale mask out
//! - `batch`: a folder of grayscale images in, 3-class probability maps out,
//!   with a timing report
//! - `color`: one color image in, one grayscale mask out
//!
//! ## Example
//!
//! ```no_run
//! use opvnn::{Config, Pipeline};
//!
//! # fn main() -> opvnn::Result<()> {
//! let mut pipeline = Pipeline::new(Config::gray())?;
//!
//! pipeline.process_gray("input.png", "output_image.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! The codec can be used on its own with any `ndarray` buffer:
//!
//! ```
//! use image::{GrayImage, Luma};
//! use ndarray::Array4;
//! use opvnn::codec::{encode_grayscale, Normalization};
//!
//! let img = GrayImage::from_pixel(100, 100, Luma([128]));
//! let mut tensor = Array4::<f32>::zeros((1, 1, 224, 224));
//! encode_grayscale(&img, tensor.view_mut(), Normalization::CENTERED).unwrap();
//! assert!(tensor.iter().all(|v| v.abs() < 1e-6));
//! ```

pub mod codec;
pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;

pub use error::{Error, Result};
pub use pipeline::{BatchReport, Config, Outcome, Pipeline, Variant};
