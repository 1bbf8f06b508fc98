//! Asset data consumed by the scene core
//!
//! Decoding files is the importer's job; this module only validates and
//! skins what it hands over.

pub mod model;

pub use model::{
    BoneInfluence, Mesh, MeshSource, Model, ModelError, ModelHandle, Vertex, VertexWeight,
    MAX_BONE_INFLUENCE,
};
