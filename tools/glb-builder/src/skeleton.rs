//! Skin construction

use crate::buffer::{AccessorIndex, BufferBuilder};

/// Accessor indices for skin data
#[derive(Debug, Clone)]
pub struct SkinAccessors {
    pub inverse_bind_matrices: AccessorIndex,
}

/// Builder for a skin's inverse bind matrices (column-major)
pub struct SkinBuilder {
    inverse_bind_matrices: Vec<[f32; 16]>,
}

impl SkinBuilder {
    pub fn new() -> Self {
        Self {
            inverse_bind_matrices: Vec::new(),
        }
    }

    /// Add a joint with its inverse bind matrix
    pub fn add_joint(mut self, inverse_bind_matrix: [f32; 16]) -> Self {
        self.inverse_bind_matrices.push(inverse_bind_matrix);
        self
    }

    pub fn inverse_bind_matrices(mut self, matrices: &[[f32; 16]]) -> Self {
        self.inverse_bind_matrices = matrices.to_vec();
        self
    }

    pub fn joint_count(&self) -> usize {
        self.inverse_bind_matrices.len()
    }

    pub fn build(self, buffer: &mut BufferBuilder) -> SkinAccessors {
        SkinAccessors {
            inverse_bind_matrices: buffer.pack_mat4(&self.inverse_bind_matrices),
        }
    }
}

impl Default for SkinBuilder {
    fn default() -> Self {
        Self::new()
    }
}
