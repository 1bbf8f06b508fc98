//! Rendering interface of the scene core
//!
//! The camera, the backend trait the frame driver draws through, and the
//! plain-data blocks that cross into GPU land.

pub mod backend;
pub mod camera;
pub mod uniforms;

pub use backend::{BackendResult, RenderBackend, RenderError};
pub use camera::{Camera, CameraMovement};
pub use uniforms::{BonePalette, CameraUniform};
