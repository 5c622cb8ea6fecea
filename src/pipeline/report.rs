//! Timing report for batch runs.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Aggregate timings of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Folder the results were written to.
    pub output_dir: PathBuf,
    /// Number of images processed.
    pub images: usize,
    /// Time spent inside the runtime.
    pub inference: Duration,
    /// Time spent encoding images into the input tensor.
    pub encode: Duration,
    /// Wall-clock time of the whole loop, including file I/O.
    pub total: Duration,
}

impl BatchReport {
    /// Mean of `total` over the processed images, zero when nothing ran.
    #[must_use]
    pub fn average(&self, total: Duration) -> Duration {
        match u32::try_from(self.images) {
            Ok(0) => Duration::ZERO,
            Ok(n) => total / n,
            Err(_) => Duration::from_secs_f64(total.as_secs_f64() / as_f64(self.images)),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(count: usize) -> f64 {
    count as f64
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#Report:")?;
        writeln!(
            f,
            "    all images are inferred successfully, result is in the folder : {}",
            self.output_dir.display()
        )?;
        writeln!(f, "    images                         = {} \tones", self.images)?;

        let rows = [
            ("all time inference   only     ", self.inference),
            ("avg time inference   only     ", self.average(self.inference)),
            ("all time encode      only     ", self.encode),
            ("avg time encode      only     ", self.average(self.encode)),
            ("all time (with image I/O)     ", self.total),
            ("avg time (with image I/O)     ", self.average(self.total)),
        ];
        for (label, value) in rows {
            writeln!(f, "    {label} = {:.3} \tms", millis(value))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average() {
        let report = BatchReport {
            images: 4,
            ..BatchReport::default()
        };
        assert_eq!(
            report.average(Duration::from_millis(100)),
            Duration::from_millis(25)
        );
    }

    #[test]
    fn test_average_of_empty_run() {
        let report = BatchReport::default();
        assert_eq!(report.average(Duration::from_secs(3)), Duration::ZERO);
    }

    #[test]
    fn test_display() {
        let report = BatchReport {
            output_dir: PathBuf::from("output_folder"),
            images: 2,
            inference: Duration::from_millis(10),
            encode: Duration::from_millis(4),
            total: Duration::from_millis(30),
        };
        let text = report.to_string();

        assert!(text.starts_with("#Report:\n"));
        assert!(text.contains("result is in the folder : output_folder"));
        assert!(text.contains("images                         = 2 \tones"));
        assert!(text.contains("all time inference   only      = 10.000 \tms"));
        assert!(text.contains("avg time inference   only      = 5.000 \tms"));
        assert!(text.contains("avg time encode      only      = 2.000 \tms"));
        assert!(text.contains("avg time (with image I/O)      = 15.000 \tms"));
    }
}
