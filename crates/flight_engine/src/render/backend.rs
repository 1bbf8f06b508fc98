//! Boundary between the scene core and whatever draws it
//!
//! The core never touches GPU state. Each frame it hands the backend a
//! view/projection pair, one model matrix per visible entity and the bone
//! palette of every skinned model.

use thiserror::Error;

use crate::assets::ModelHandle;
use crate::foundation::math::RawMat4;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Rendering backend trait
///
/// Calls arrive in a fixed order each frame: `upload_bone_matrices` for
/// skinned models, then `begin_frame`, any number of `draw_model`, and
/// finally `end_frame`.
pub trait RenderBackend {
    /// Start a frame with the camera matrices
    fn begin_frame(&mut self, view: &RawMat4, projection: &RawMat4) -> BackendResult<()>;

    /// Draw one model with its global model matrix
    fn draw_model(&mut self, model: ModelHandle, model_matrix: &RawMat4) -> BackendResult<()>;

    /// Replace the skinning palette of a model, indexed by bone id
    fn upload_bone_matrices(&mut self, model: ModelHandle, matrices: &[RawMat4]) -> BackendResult<()>;

    /// Finish and present the frame
    fn end_frame(&mut self) -> BackendResult<()>;
}

/// Render backend errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A draw or upload was issued outside `begin_frame` / `end_frame`
    #[error("Frame sequencing error: {0}")]
    FrameState(String),

    /// The backend has no resources for this handle
    #[error("Unknown model handle {0:?}")]
    UnknownModel(ModelHandle),

    /// More bone matrices than the skinning shader accepts
    #[error("Bone palette of {count} matrices exceeds the limit of {max}")]
    TooManyBones {
        /// Matrices supplied
        count: usize,
        /// Backend limit
        max: usize,
    },

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    BackendError(String),
}
