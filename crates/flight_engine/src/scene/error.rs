//! Error types for scene construction

use thiserror::Error;

use crate::render::RenderError;

use super::graph::EntityId;

/// Degenerate geometry rejected at construction time
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A plane normal or basis vector had (near) zero length
    #[error("Degenerate direction vector for {0}")]
    DegenerateVector(&'static str),

    /// Input contained NaN or infinity
    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),

    /// Bounding volume requested from zero points
    #[error("Cannot build a bounding volume from an empty point set")]
    EmptyPointSet,

    /// Box with min > max on some axis
    #[error("Inverted bounds: min {min:?} exceeds max {max:?}")]
    InvertedBounds {
        /// Minimum corner as given
        min: [f32; 3],
        /// Maximum corner as given
        max: [f32; 3],
    },

    /// Camera projection parameters that cannot form a frustum
    #[error("Invalid frustum parameters: {0}")]
    InvalidProjection(String),
}

/// Scene graph errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Entity id is stale or was never issued by this graph
    #[error("Unknown entity {0:?}")]
    UnknownEntity(EntityId),

    /// Bounding volume could not be generated from the model
    #[error("Model '{model}' has no usable geometry: {source}")]
    Geometry {
        /// Model name
        model: String,
        /// Underlying geometry failure
        #[source]
        source: GeometryError,
    },

    /// The backend rejected a draw during traversal
    #[error("Draw failed: {0}")]
    Render(#[from] RenderError),
}
