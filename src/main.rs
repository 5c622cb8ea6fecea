//! `opvnn` CLI - run a segmentation network on images.

use std::fmt::Display;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opvnn::image::ChannelOrder;
use opvnn::model::{InferRequest, OrtRequest};
use opvnn::{Config, Outcome, Pipeline, Variant};

/// Run a segmentation network on one image or a folder of images.
#[derive(Parser, Debug)]
#[command(name = "opvnn")]
#[command(version, about, long_about = None)]
struct Args {
    /// Program to run.
    #[arg(value_enum, value_name = "PROGRAM")]
    variant: Variant,

    /// Number of threads the runtime may use.
    #[arg(long, value_name = "N")]
    cores: Option<usize>,

    /// Model base name; `<NAME>.onnx` is loaded from the model directory.
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// Directory holding the model files.
    #[arg(long, default_value = ".", value_name = "DIR")]
    model_dir: PathBuf,

    /// Input image (input folder for `batch`).
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Output image (output folder for `batch`).
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Channel order the network expects for color data.
    #[arg(long, value_enum, default_value_t = ChannelOrder::Bgr)]
    channel_order: ChannelOrder,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> Config {
        let defaults = Config::for_variant(self.variant);
        Config {
            model_dir: self.model_dir.clone(),
            model_name: self.model.clone().unwrap_or(defaults.model_name.clone()),
            input: self.input.clone().unwrap_or(defaults.input.clone()),
            output: self.output.clone().unwrap_or(defaults.output.clone()),
            threads: self.cores.unwrap_or(defaults.threads),
            channel_order: self.channel_order,
            ..defaults
        }
    }
}

fn main() -> ExitCode {
    // Failures are reported on stdout; the exit status stays 0.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if exits_early(&err) => err.exit(),
        Err(err) => {
            print!("{}", failure_report(&err.to_string().trim_end()));
            return ExitCode::SUCCESS;
        }
    };

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("opvnn={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(&args) {
        Ok(()) => println!("Ok return."),
        Err(err) => {
            tracing::error!("{err:#}");
            print!("{}", failure_report(&format_args!("{err:#}")));
        }
    }

    ExitCode::SUCCESS
}

/// Help and version requests leave through clap; every other parse error is
/// reported like a runtime failure.
fn exits_early(err: &clap::Error) -> bool {
    matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

fn failure_report(err: &impl Display) -> String {
    format!("Exception raised: {err}\nOk return.\n")
}

fn run(args: &Args) -> Result<()> {
    let config = args.config();

    println!("#Cores number is: {}", config.threads);
    println!("#Sources:");
    println!("    net   source = {}", config.model_files());
    match config.variant {
        Variant::Batch => println!("    input folder = {}", config.input.display()),
        Variant::Gray | Variant::Color => {
            println!("    image source = {}", config.input.display());
        }
    }

    let mut pipeline: Pipeline<OrtRequest> =
        Pipeline::new(config).context("Failed to initialize pipeline")?;

    println!("#input/output names:");
    println!("    input_name  = {}", pipeline.request().input_name());
    println!("    output_name = {}", pipeline.request().output_name());

    execute(&mut pipeline, &mut io::stdout().lock())
}

/// Run the pipeline and print its dims and outcome.
///
/// Output dims are printed after the run, since dynamic models only report
/// their real output shape once inference has happened.
fn execute<R: InferRequest>(pipeline: &mut Pipeline<R>, out: &mut impl Write) -> Result<()> {
    writeln!(out, "#Input  dims: {}", pipeline.request().input_shape())?;

    let outcome = pipeline.run().context("Failed to process images")?;
    writeln!(out, "#Output dims: {}", pipeline.request().output_shape())?;

    match outcome {
        Outcome::Single(path) => {
            writeln!(
                out,
                "The result of inference successfully saved to {}",
                path.display()
            )?;
        }
        Outcome::Batch(report) => write!(out, "{report}")?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ndarray::{Array4, ArrayView4, ArrayViewMut4};
    use opvnn::codec::TensorShape;

    use super::*;

    #[test]
    fn test_defaults_per_program() {
        let args = Args::try_parse_from(["opvnn", "batch"]).unwrap();
        let config = args.config();

        assert_eq!(config.variant, Variant::Batch);
        assert_eq!(config.model_name, "final_combined_alpha0.5_weights");
        assert_eq!(config.input, PathBuf::from("input_folder"));
        assert_eq!(config.threads, 1);
    }

    #[test]
    fn test_cores_and_model_in_either_order() {
        let first = Args::try_parse_from(["opvnn", "batch", "--cores", "4", "--model", "net"])
            .unwrap()
            .config();
        let second = Args::try_parse_from(["opvnn", "batch", "--model", "net", "--cores", "4"])
            .unwrap()
            .config();

        for config in [first, second] {
            assert_eq!(config.threads, 4);
            assert_eq!(config.model_name, "net");
        }
    }

    #[test]
    fn test_paths_override_defaults() {
        let config = Args::try_parse_from(["opvnn", "color", "-i", "a.png", "-o", "b.png"])
            .unwrap()
            .config();

        assert_eq!(config.model_name, "zf_unet_224");
        assert_eq!(config.input, PathBuf::from("a.png"));
        assert_eq!(config.output, PathBuf::from("b.png"));
    }

    #[test]
    fn test_unknown_program_rejected() {
        let err = Args::try_parse_from(["opvnn", "segment"]).unwrap_err();
        assert!(!exits_early(&err));
    }

    #[test]
    fn test_bad_cores_reported_as_failure() {
        let err = Args::try_parse_from(["opvnn", "gray", "--cores", "abc"]).unwrap_err();
        assert!(!exits_early(&err));

        let report = failure_report(&err.to_string().trim_end());
        assert!(report.starts_with("Exception raised: "));
        assert!(report.contains("abc"));
        assert!(report.ends_with("Ok return.\n"));
    }

    #[test]
    fn test_missing_program_reported_as_failure() {
        let err = Args::try_parse_from(["opvnn"]).unwrap_err();
        assert!(!exits_early(&err));
    }

    #[test]
    fn test_help_and_version_exit_through_clap() {
        for flag in ["--help", "--version"] {
            let err = Args::try_parse_from(["opvnn", flag]).unwrap_err();
            assert!(exits_early(&err), "{flag}");
        }
    }

    /// Reports a placeholder output shape until the first run.
    struct Deferred {
        input: Array4<f32>,
        output: Array4<f32>,
    }

    impl InferRequest for Deferred {
        fn input_shape(&self) -> TensorShape {
            TensorShape::from(self.input.dim())
        }

        fn output_shape(&self) -> TensorShape {
            TensorShape::from(self.output.dim())
        }

        fn input_mut(&mut self) -> ArrayViewMut4<'_, f32> {
            self.input.view_mut()
        }

        fn infer(&mut self) -> opvnn::Result<()> {
            let (_, _, height, width) = self.input.dim();
            self.output = Array4::zeros((1, 1, height, width));
            Ok(())
        }

        fn output(&self) -> ArrayView4<'_, f32> {
            self.output.view()
        }
    }

    #[test]
    fn test_output_dims_printed_after_run() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        image::GrayImage::new(6, 4).save(&input).unwrap();

        let config = Config {
            input,
            output: output.clone(),
            ..Config::gray()
        };
        let request = Deferred {
            input: Array4::zeros((1, 1, 4, 6)),
            output: Array4::zeros((1, 1, 1, 1)),
        };
        let mut pipeline = Pipeline::with_request(config, request).unwrap();

        let mut out = Vec::new();
        execute(&mut pipeline, &mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines[0], "#Input  dims: 1x1x4x6");
        assert_eq!(lines[1], "#Output dims: 1x1x4x6");
        assert!(lines[2].ends_with(&output.display().to_string()));
    }
}
