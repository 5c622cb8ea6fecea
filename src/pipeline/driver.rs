//! Sequential drivers: read, encode, infer, decode, write.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use crate::codec;
use crate::error::{Error, Result};
use crate::image::{self, OutputImage};
use crate::model::{InferRequest, OrtRequest};

use super::config::{Config, Variant};
use super::report::BatchReport;

/// Result of a driver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A single image was written to this path.
    Single(PathBuf),
    /// A folder was processed.
    Batch(BatchReport),
}

/// Owns the inference request and runs the configured program.
pub struct Pipeline<R = OrtRequest> {
    config: Config,
    request: R,
}

impl Pipeline<OrtRequest> {
    /// Load the configured model and create its inference request.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the model cannot
    /// be loaded.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing pipeline with config: {config:?}");

        let request = OrtRequest::new(
            &config.model_files(),
            config.threads,
            config.fallback_input_size,
        )?;

        tracing::info!(
            "Pipeline initialized: input {}, output {}",
            request.input_shape(),
            request.output_shape()
        );

        Ok(Self { config, request })
    }
}

impl<R: InferRequest> Pipeline<R> {
    /// Build a pipeline around an existing request.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_request(config: Config, request: R) -> Result<Self> {
        config.validate()?;

        tracing::debug!(
            "Request tensors: input {}, output {}",
            request.input_shape(),
            request.output_shape()
        );

        Ok(Self { config, request })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn request(&self) -> &R {
        &self.request
    }

    /// Run the configured variant on the configured paths.
    ///
    /// # Errors
    ///
    /// Returns the first error hit; a batch stops at the failing image.
    pub fn run(&mut self) -> Result<Outcome> {
        let input = self.config.input.clone();
        let output = self.config.output.clone();

        match self.config.variant {
            Variant::Gray => {
                self.process_gray(&input, &output)?;
                Ok(Outcome::Single(output))
            }
            Variant::Color => {
                self.process_color(&input, &output)?;
                Ok(Outcome::Single(output))
            }
            Variant::Batch => self.process_batch(&input, &output).map(Outcome::Batch),
        }
    }

    /// Grayscale image in, grayscale mask out.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails.
    pub fn process_gray<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input_path: P,
        output_path: Q,
    ) -> Result<()> {
        let input_path = input_path.as_ref();
        tracing::info!("Processing image: {}", input_path.display());

        let frame = image::load_gray(input_path)?;
        codec::encode_grayscale(&frame, self.request.input_mut(), self.config.normalization)?;
        self.request.infer()?;
        let mask = codec::decode_single_channel(self.request.output())?;

        self.save(mask, output_path.as_ref())
    }

    /// Color image in, grayscale mask out.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails.
    pub fn process_color<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input_path: P,
        output_path: Q,
    ) -> Result<()> {
        let input_path = input_path.as_ref();
        tracing::info!("Processing image: {}", input_path.display());

        let frame = image::load_color(input_path, self.config.channel_order)?;
        codec::encode_multi_channel(&frame, self.request.input_mut(), self.config.normalization)?;
        self.request.infer()?;
        let mask = codec::decode_single_channel(self.request.output())?;

        self.save(mask, output_path.as_ref())
    }

    /// Every file of `input_dir` in, one probability map per file out,
    /// written under the same name in `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns the first error hit; remaining images are not processed.
    pub fn process_batch<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input_dir: P,
        output_dir: Q,
    ) -> Result<BatchReport> {
        let (input_dir, output_dir) = (input_dir.as_ref(), output_dir.as_ref());

        let files = image::list_images(input_dir)?;
        std::fs::create_dir_all(output_dir).map_err(|source| Error::CreateDir {
            path: output_dir.to_path_buf(),
            source,
        })?;
        tracing::info!(
            "Found {} image(s) in {}",
            files.len(),
            input_dir.display()
        );

        let mut report = BatchReport {
            output_dir: output_dir.to_path_buf(),
            images: files.len(),
            ..BatchReport::default()
        };

        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Inferring [{bar:40.cyan/blue}] {pos}/{len}")
                .expect("valid template")
                .progress_chars("#>-"),
        );

        let started = Instant::now();
        for (index, path) in files.iter().enumerate() {
            let frame = image::load_gray(path)?;

            let (encode, inference) = self.timed_encode_infer(&frame)?;
            report.encode += encode;
            report.inference += inference;

            let classes = codec::decode_probability_map(
                self.request.output(),
                self.config.background_threshold,
            )?;

            let target = path.file_name().map_or_else(
                || output_dir.join(format!("{index}.png")),
                |name| output_dir.join(name),
            );
            self.save(classes, &target)?;

            pb.inc(1);
        }
        report.total = started.elapsed();

        pb.finish_with_message("Batch complete");
        Ok(report)
    }

    fn timed_encode_infer(&mut self, frame: &::image::GrayImage) -> Result<(Duration, Duration)> {
        let begin = Instant::now();
        codec::encode_grayscale(frame, self.request.input_mut(), self.config.normalization)?;
        let encode = begin.elapsed();

        let begin = Instant::now();
        self.request.infer()?;
        let inference = begin.elapsed();

        Ok((encode, inference))
    }

    fn save(&self, img: impl Into<OutputImage>, path: &Path) -> Result<()> {
        tracing::info!("Saving output to: {}", path.display());
        image::save_image(img, path, self.config.channel_order)
    }
}
