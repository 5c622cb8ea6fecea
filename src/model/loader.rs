//! Model file resolution and session loading.

use std::fmt;
use std::path::{Path, PathBuf};

use ort::session::{builder::GraphOptimizationLevel, Session};

use crate::error::{Error, Result};

/// Extension of the serialized graph.
const GRAPH_EXTENSION: &str = "onnx";

/// Extension of the external weights file, when the exporter split one off.
const WEIGHTS_EXTENSION: &str = "onnx_data";

/// On-disk files that make up a model, derived from its base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    name: String,
    graph: PathBuf,
    weights: PathBuf,
}

impl ModelFiles {
    /// Resolve `<dir>/<name>.onnx` and `<dir>/<name>.onnx_data`.
    ///
    /// The name is used verbatim, so names containing dots such as
    /// `final_combined_alpha0.5_weights` keep their full stem.
    #[must_use]
    pub fn new<P: AsRef<Path>>(dir: P, name: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            name: name.to_string(),
            graph: dir.join(format!("{name}.{GRAPH_EXTENSION}")),
            weights: dir.join(format!("{name}.{WEIGHTS_EXTENSION}")),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path to the graph file.
    #[must_use]
    pub fn graph(&self) -> &Path {
        &self.graph
    }

    /// Path where external weights would live. ONNX Runtime picks this file
    /// up on its own when the graph references it.
    #[must_use]
    pub fn weights(&self) -> &Path {
        &self.weights
    }

    /// Whether the model ships external weights.
    #[must_use]
    pub fn has_external_weights(&self) -> bool {
        self.weights.is_file()
    }

    /// # Errors
    ///
    /// Returns [`Error::ModelNotFound`] if the graph file is missing.
    pub fn ensure_exists(&self) -> Result<()> {
        if self.graph.is_file() {
            Ok(())
        } else {
            Err(Error::ModelNotFound {
                path: self.graph.clone(),
            })
        }
    }
}

impl fmt::Display for ModelFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ {}, {} ]",
            self.graph.display(),
            self.weights.display()
        )
    }
}

/// Load an ONNX model session using `threads` intra-op threads.
///
/// # Errors
///
/// Returns an error if the graph file is missing or cannot be loaded.
pub fn load_session(files: &ModelFiles, threads: usize) -> Result<Session> {
    files.ensure_exists()?;

    tracing::info!(
        "Loading {} with {threads} thread(s){}",
        files.graph().display(),
        if files.has_external_weights() {
            " and external weights"
        } else {
            ""
        }
    );

    let model_load = |source| Error::ModelLoad {
        name: files.name().to_string(),
        source,
    };

    Session::builder()
        .map_err(model_load)?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(model_load)?
        .with_intra_threads(threads)
        .map_err(model_load)?
        .commit_from_file(files.graph())
        .map_err(model_load)
}
