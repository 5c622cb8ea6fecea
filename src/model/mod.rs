//! Model loading and inference requests.

mod loader;
mod request;

pub use loader::{load_session, ModelFiles};
pub use request::{InferRequest, OrtRequest};
