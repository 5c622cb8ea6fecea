//! Inference requests: a loaded model plus its reusable input and output
//! tensors.

use ndarray::{Array4, ArrayView4, ArrayViewMut4, Ix4};
use ort::session::Session;
use ort::value::TensorRef;

use crate::codec::TensorShape;
use crate::error::{Error, Result};

use super::loader::{load_session, ModelFiles};

/// A ready-to-run network with one input and one output tensor.
///
/// The input buffer is filled in place, [`InferRequest::infer`] runs the
/// graph, and the output buffer stays valid until the next run.
pub trait InferRequest {
    /// Shape of the input buffer.
    fn input_shape(&self) -> TensorShape;

    /// Shape of the output buffer as of the last run.
    fn output_shape(&self) -> TensorShape;

    /// Mutable view of the input buffer.
    fn input_mut(&mut self) -> ArrayViewMut4<'_, f32>;

    /// Run the network on the current input.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime fails or produces an unusable output.
    fn infer(&mut self) -> Result<()>;

    /// View of the output buffer.
    fn output(&self) -> ArrayView4<'_, f32>;
}

/// [`InferRequest`] backed by an ONNX Runtime session.
pub struct OrtRequest {
    session: Session,
    input_name: String,
    output_name: String,
    input: Array4<f32>,
    output: Array4<f32>,
}

impl OrtRequest {
    /// Load the model and allocate its buffers.
    ///
    /// Dynamic spatial dimensions are replaced by `fallback_size`
    /// (`(width, height)`), and a dynamic batch dimension by 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded, or if it does not have
    /// exactly one 4-D input and one output.
    pub fn new(files: &ModelFiles, threads: usize, fallback_size: (u32, u32)) -> Result<Self> {
        let session = load_session(files, threads)?;

        if session.inputs.len() != 1 {
            return Err(Error::InvalidModel {
                reason: format!("expected 1 input, found {}", session.inputs.len()),
            });
        }
        if session.outputs.len() != 1 {
            return Err(Error::InvalidModel {
                reason: format!("expected 1 output, found {}", session.outputs.len()),
            });
        }

        let input_info = &session.inputs[0];
        let output_info = &session.outputs[0];

        let input_dims = input_info
            .input_type
            .tensor_shape()
            .ok_or_else(|| Error::InvalidModel {
                reason: format!("input '{}' is not a tensor", input_info.name),
            })?;
        let input_shape = resolve_shape(input_dims, fallback_size)?;

        // Outputs are re-read after every run, so an unresolvable declared
        // shape only affects the placeholder buffer.
        let output_shape = output_info
            .output_type
            .tensor_shape()
            .and_then(|dims| resolve_shape(dims, fallback_size).ok())
            .unwrap_or(input_shape);

        tracing::info!("input  '{}': {:?}", input_info.name, input_info.input_type);
        tracing::info!("output '{}': {:?}", output_info.name, output_info.output_type);

        let input_name = input_info.name.clone();
        let output_name = output_info.name.clone();

        Ok(Self {
            session,
            input_name,
            output_name,
            input: Array4::zeros(input_shape.dim()),
            output: Array4::zeros(output_shape.dim()),
        })
    }

    #[must_use]
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    #[must_use]
    pub fn output_name(&self) -> &str {
        &self.output_name
    }
}

impl InferRequest for OrtRequest {
    fn input_shape(&self) -> TensorShape {
        TensorShape::from(self.input.dim())
    }

    fn output_shape(&self) -> TensorShape {
        TensorShape::from(self.output.dim())
    }

    fn input_mut(&mut self) -> ArrayViewMut4<'_, f32> {
        self.input.view_mut()
    }

    fn infer(&mut self) -> Result<()> {
        let input_value = TensorRef::from_array_view(contiguous(&self.input)?)
            .map_err(|source| Error::Inference { source })?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .map_err(|source| Error::Inference { source })?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| Error::ShapeMismatch {
                expected: format!("output '{}'", self.output_name),
                actual: "no output".to_string(),
            })?;

        let view = output
            .try_extract_array::<f32>()
            .map_err(|source| Error::Inference { source })?;
        let ndim = view.ndim();
        let view = view
            .into_dimensionality::<Ix4>()
            .map_err(|_| Error::ShapeMismatch {
                expected: "4D tensor".to_string(),
                actual: format!("{ndim}D tensor"),
            })?;

        if view.dim() == self.output.dim() {
            self.output.assign(&view);
        } else {
            tracing::debug!(
                "Output shape changed to {}",
                TensorShape::from(view.dim())
            );
            self.output = view.to_owned();
        }

        Ok(())
    }

    fn output(&self) -> ArrayView4<'_, f32> {
        self.output.view()
    }
}

/// Borrow `tensor` for the runtime, which reads it as one flat buffer.
pub(crate) fn contiguous(tensor: &Array4<f32>) -> Result<ArrayView4<'_, f32>> {
    if tensor.is_standard_layout() {
        Ok(tensor.view())
    } else {
        Err(Error::ShapeMismatch {
            expected: "contiguous NCHW buffer".to_string(),
            actual: format!("strides {:?}", tensor.strides()),
        })
    }
}

/// Turn declared model dimensions into a concrete NCHW shape.
///
/// Negative entries mark dynamic dimensions.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub(crate) fn resolve_shape(dims: &[i64], fallback_size: (u32, u32)) -> Result<TensorShape> {
    if dims.len() != 4 {
        return Err(Error::ShapeMismatch {
            expected: "4D tensor".to_string(),
            actual: format!("{}D tensor", dims.len()),
        });
    }

    let (fallback_width, fallback_height) = fallback_size;
    let resolve = |dim: i64, fallback: usize| if dim < 0 { fallback } else { dim as usize };

    if dims[1] < 0 {
        return Err(Error::InvalidModel {
            reason: "channel dimension must be static".to_string(),
        });
    }

    Ok(TensorShape::new(
        resolve(dims[0], 1),
        resolve(dims[1], 0),
        resolve(dims[2], fallback_height as usize),
        resolve(dims[3], fallback_width as usize),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_borrows_buffer() {
        let input = Array4::<f32>::zeros((1, 3, 4, 5));
        let view = contiguous(&input).unwrap();

        assert_eq!(view.as_ptr(), input.as_ptr());
        assert_eq!(view.dim(), input.dim());
    }

    #[test]
    fn test_contiguous_rejects_permuted_buffer() {
        let input = Array4::<f32>::zeros((1, 3, 4, 5)).permuted_axes([0, 2, 3, 1]);
        let err = contiguous(&input);

        assert!(matches!(err, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_resolve_static_shape() {
        let shape = resolve_shape(&[1, 1, 224, 224], (64, 32)).unwrap();
        assert_eq!(shape, TensorShape::new(1, 1, 224, 224));
    }

    #[test]
    fn test_resolve_dynamic_dims() {
        let shape = resolve_shape(&[-1, 3, -1, -1], (640, 480)).unwrap();
        assert_eq!(shape, TensorShape::new(1, 3, 480, 640));
    }

    #[test]
    fn test_resolve_rejects_dynamic_channels() {
        let err = resolve_shape(&[1, -1, 224, 224], (224, 224));
        assert!(matches!(err, Err(Error::InvalidModel { .. })));
    }

    #[test]
    fn test_resolve_rejects_rank() {
        let err = resolve_shape(&[1, 224, 224], (224, 224));
        assert!(matches!(err, Err(Error::ShapeMismatch { .. })));
    }
}
