//! GPU-facing uniform blocks
//!
//! Plain `#[repr(C)]` structs that a backend can copy straight into a buffer
//! with `bytemuck::bytes_of`.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Mat4, Mat4Ext, RawMat4};

/// Camera matrices for one frame
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    /// World to view
    pub view: RawMat4,
    /// View to clip
    pub projection: RawMat4,
    /// `projection * view`
    pub view_projection: RawMat4,
}

impl CameraUniform {
    /// Pack view and projection, precomputing their product
    pub fn new(view: &Mat4, projection: &Mat4) -> Self {
        Self {
            view: view.to_raw(),
            projection: projection.to_raw(),
            view_projection: (projection * view).to_raw(),
        }
    }
}

/// Skinning palette converted for upload, sized to the clip's bone count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BonePalette {
    matrices: Vec<RawMat4>,
}

impl BonePalette {
    /// Convert a bone matrix slice
    pub fn from_matrices(matrices: &[Mat4]) -> Self {
        Self {
            matrices: matrices.iter().map(Mat4Ext::to_raw).collect(),
        }
    }

    /// Refill from a bone matrix slice, reusing the allocation
    pub fn update(&mut self, matrices: &[Mat4]) {
        self.matrices.clear();
        self.matrices.extend(matrices.iter().map(Mat4Ext::to_raw));
    }

    /// Raw matrices indexed by bone id
    pub fn as_slice(&self) -> &[RawMat4] {
        &self.matrices
    }

    /// Bytes ready for a storage or uniform buffer
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.matrices)
    }

    /// Number of bones
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    /// Whether the palette is empty
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }
}
