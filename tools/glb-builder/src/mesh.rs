//! Mesh primitive construction

use crate::buffer::{AccessorIndex, BufferBuilder};

/// Accessor indices for one `JOINTS_n` / `WEIGHTS_n` attribute pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointSetAccessors {
    pub joints: AccessorIndex,
    pub weights: AccessorIndex,
}

/// Accessor indices for a mesh primitive
#[derive(Debug, Clone)]
pub struct MeshAccessors {
    pub positions: AccessorIndex,
    pub normals: Option<AccessorIndex>,
    pub uvs: Option<AccessorIndex>,
    /// One entry per influence set, in attribute-set order
    pub joint_sets: Vec<JointSetAccessors>,
    pub indices: Option<AccessorIndex>,
}

/// Builder for mesh primitive data
pub struct MeshBuilder {
    positions: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    uvs: Option<Vec<[f32; 2]>>,
    joint_sets: Vec<(Vec<[u16; 4]>, Vec<[f32; 4]>)>,
    indices: Option<Vec<u32>>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: None,
            uvs: None,
            joint_sets: Vec::new(),
            indices: None,
        }
    }

    /// Set positions (required)
    pub fn positions(mut self, positions: &[[f32; 3]]) -> Self {
        self.positions = positions.to_vec();
        self
    }

    pub fn normals(mut self, normals: &[[f32; 3]]) -> Self {
        self.normals = Some(normals.to_vec());
        self
    }

    pub fn uvs(mut self, uvs: &[[f32; 2]]) -> Self {
        self.uvs = Some(uvs.to_vec());
        self
    }

    /// Append one influence set (becomes `JOINTS_n` / `WEIGHTS_n`)
    pub fn joint_set(mut self, joints: &[[u16; 4]], weights: &[[f32; 4]]) -> Self {
        self.joint_sets.push((joints.to_vec(), weights.to_vec()));
        self
    }

    pub fn indices(mut self, indices: &[u32]) -> Self {
        self.indices = Some(indices.to_vec());
        self
    }

    /// Pack into buffer
    pub fn build(self, buffer: &mut BufferBuilder) -> MeshAccessors {
        let positions = buffer.pack_positions(&self.positions);
        let normals = self.normals.as_ref().map(|n| buffer.pack_vec3(n));
        let uvs = self.uvs.as_ref().map(|uv| buffer.pack_vec2(uv));
        let joint_sets = self
            .joint_sets
            .iter()
            .map(|(joints, weights)| JointSetAccessors {
                joints: buffer.pack_joints(joints),
                weights: buffer.pack_vec4(weights),
            })
            .collect();
        let indices = self.indices.as_ref().map(|i| buffer.pack_indices(i));

        MeshAccessors {
            positions,
            normals,
            uvs,
            joint_sets,
            indices,
        }
    }
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}
