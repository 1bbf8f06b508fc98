//! Model data handed over by the import pipeline
//!
//! The importer itself lives outside the engine. It produces [`MeshSource`]s:
//! plain vertices plus per-bone influence lists. [`Model::from_meshes`] turns
//! those into skinned vertices and a dense bone id space.

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use crate::animation::BoneInfoMap;
use crate::foundation::math::{Mat4, Vec3};

/// Maximum bones that can weight a single vertex
pub const MAX_BONE_INFLUENCE: usize = 4;

/// Opaque handle the render backend uses to find a model's GPU resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModelHandle(pub u64);

/// Skinned vertex as uploaded to the GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Normal vector
    pub normal: [f32; 3],
    /// Texture coordinates
    pub tex_coords: [f32; 2],
    /// Influencing bone ids, `-1` for an unused slot
    pub bone_ids: [i32; MAX_BONE_INFLUENCE],
    /// Weights matching `bone_ids`
    pub weights: [f32; MAX_BONE_INFLUENCE],
}

impl Vertex {
    /// Create an unskinned vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
            bone_ids: [-1; MAX_BONE_INFLUENCE],
            weights: [0.0; MAX_BONE_INFLUENCE],
        }
    }

    /// Position as a math vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Store a bone influence in the first free slot
    ///
    /// Returns `false` when all slots are taken and the influence was dropped.
    pub fn add_bone_influence(&mut self, bone_id: usize, weight: f32) -> bool {
        let Ok(bone_id) = i32::try_from(bone_id) else {
            return false;
        };
        match self.bone_ids.iter().position(|&id| id < 0) {
            Some(slot) => {
                self.bone_ids[slot] = bone_id;
                self.weights[slot] = weight;
                true
            }
            None => false,
        }
    }

    /// Number of bones weighting this vertex
    pub fn influence_count(&self) -> usize {
        self.bone_ids.iter().filter(|&&id| id >= 0).count()
    }
}

/// One weighted vertex of a bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeight {
    /// Index into the mesh's vertex list
    pub vertex_id: usize,
    /// Influence of the bone on that vertex
    pub weight: f32,
}

/// A bone as listed by one mesh, with the vertices it moves
#[derive(Debug, Clone, PartialEq)]
pub struct BoneInfluence {
    /// Bone name, matched against animation node names
    pub name: String,
    /// Inverse bind matrix
    pub offset: Mat4,
    /// Vertices weighted by this bone
    pub weights: Vec<VertexWeight>,
}

/// Mesh as produced by the importer, before bone ids are assigned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshSource {
    /// Unskinned vertices
    pub vertices: Vec<Vertex>,
    /// Triangle list indices
    pub indices: Vec<u32>,
    /// Bones that weight this mesh
    pub bones: Vec<BoneInfluence>,
}

impl MeshSource {
    /// Static mesh without bones
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            bones: Vec::new(),
        }
    }

    /// Builder pattern: attach a bone influence list
    pub fn with_bone(mut self, bone: BoneInfluence) -> Self {
        self.bones.push(bone);
        self
    }

    /// Axis-aligned box centered on the origin with the given half-extents
    ///
    /// Eight shared corners, twelve triangles wound counter-clockwise when
    /// seen from outside.
    pub fn cuboid(half_extents: Vec3) -> Self {
        let (x, y, z) = (half_extents.x, half_extents.y, half_extents.z);
        let corner = |sx: f32, sy: f32, sz: f32, uv: [f32; 2]| {
            let normal = Vec3::new(sx, sy, sz).normalize();
            Vertex::new([sx * x, sy * y, sz * z], normal.into(), uv)
        };
        let vertices = vec![
            corner(-1.0, -1.0, 1.0, [0.0, 0.0]),
            corner(1.0, -1.0, 1.0, [1.0, 0.0]),
            corner(1.0, 1.0, 1.0, [1.0, 1.0]),
            corner(-1.0, 1.0, 1.0, [0.0, 1.0]),
            corner(-1.0, -1.0, -1.0, [1.0, 0.0]),
            corner(-1.0, 1.0, -1.0, [1.0, 1.0]),
            corner(1.0, 1.0, -1.0, [0.0, 1.0]),
            corner(1.0, -1.0, -1.0, [0.0, 0.0]),
        ];
        let indices = vec![
            0, 1, 2, 2, 3, 0, // front
            4, 5, 6, 6, 7, 4, // back
            4, 0, 3, 3, 5, 4, // left
            1, 7, 6, 6, 2, 1, // right
            3, 2, 6, 6, 5, 3, // top
            4, 7, 1, 1, 0, 4, // bottom
        ];
        Self::new(vertices, indices)
    }
}

/// Mesh with bone ids resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Skinned vertices
    pub vertices: Vec<Vertex>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

/// Errors raised while assembling a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The importer produced nothing to draw
    #[error("Model '{0}' has no meshes")]
    NoMeshes(String),

    /// A bone weights a vertex the mesh does not have
    #[error("Bone '{bone}' in mesh {mesh} weights vertex {vertex_id}, but the mesh has {vertex_count} vertices")]
    VertexOutOfRange {
        /// Mesh index within the model
        mesh: usize,
        /// Offending bone
        bone: String,
        /// Requested vertex
        vertex_id: usize,
        /// Vertices in the mesh
        vertex_count: usize,
    },

    /// A triangle index points past the vertex list
    #[error("Index {index} in mesh {mesh} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Mesh index within the model
        mesh: usize,
        /// Offending index value
        index: u32,
        /// Vertices in the mesh
        vertex_count: usize,
    },
}

/// Loaded model: meshes plus the bone registry they were skinned against
#[derive(Debug, Clone)]
pub struct Model {
    handle: ModelHandle,
    name: String,
    meshes: Vec<Mesh>,
    bone_info: BoneInfoMap,
}

impl Model {
    /// Assemble a model, assigning bone ids in first-encounter order across meshes
    ///
    /// # Errors
    /// Fails on an empty mesh list or on indices/weights that point past a
    /// mesh's vertices. Influences beyond [`MAX_BONE_INFLUENCE`] per vertex are
    /// dropped with a warning.
    pub fn from_meshes(
        handle: ModelHandle,
        name: impl Into<String>,
        sources: Vec<MeshSource>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if sources.is_empty() {
            return Err(ModelError::NoMeshes(name));
        }

        let mut bone_info = BoneInfoMap::new();
        let mut meshes = Vec::with_capacity(sources.len());
        let mut dropped = 0usize;

        for (mesh_index, source) in sources.into_iter().enumerate() {
            let MeshSource { mut vertices, indices, bones } = source;
            let vertex_count = vertices.len();

            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(ModelError::IndexOutOfRange {
                    mesh: mesh_index,
                    index,
                    vertex_count,
                });
            }

            for bone in bones {
                let bone_id = bone_info.register(&bone.name, bone.offset);
                for weight in &bone.weights {
                    let vertex = vertices.get_mut(weight.vertex_id).ok_or_else(|| ModelError::VertexOutOfRange {
                        mesh: mesh_index,
                        bone: bone.name.clone(),
                        vertex_id: weight.vertex_id,
                        vertex_count,
                    })?;
                    if !vertex.add_bone_influence(bone_id, weight.weight) {
                        dropped += 1;
                    }
                }
            }

            meshes.push(Mesh { vertices, indices });
        }

        if dropped > 0 {
            log::warn!(
                "Model '{}': dropped {} bone influence(s) beyond {} per vertex",
                name,
                dropped,
                MAX_BONE_INFLUENCE
            );
        }
        log::debug!("Model '{}' loaded: {} mesh(es), {} bone(s)", name, meshes.len(), bone_info.len());

        Ok(Self {
            handle,
            name,
            meshes,
            bone_info,
        })
    }

    /// Backend handle
    pub fn handle(&self) -> ModelHandle {
        self.handle
    }

    /// Model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Skinned meshes
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Bones discovered while skinning
    pub fn bone_info(&self) -> &BoneInfoMap {
        &self.bone_info
    }

    /// Number of distinct bones
    pub fn bone_count(&self) -> usize {
        self.bone_info.len()
    }

    /// Every vertex position of every mesh
    pub fn vertex_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.meshes
            .iter()
            .flat_map(|mesh| mesh.vertices.iter().map(Vertex::position))
    }
}
