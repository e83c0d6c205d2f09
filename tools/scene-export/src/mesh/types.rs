//! Types and constants for mesh export

use glam::DMat4;

use crate::authoring::NodePath;

/// Faces whose vector area is below this are degenerate
pub(crate) const DEGENERATE_AREA_EPSILON: f64 = 1e-12;

/// Marks an absent attribute in a corner key
pub(crate) const NO_ATTRIBUTE: u32 = u32::MAX;

/// Attribute indices of one face corner; equal keys share an output vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CornerKey {
    pub position: u32,
    pub normal: u32,
    pub uv: u32,
}

/// Per-vertex influences of one `JOINTS_n` / `WEIGHTS_n` pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointSetData {
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<[f32; 4]>,
}

/// Skin whose joints still name authoring paths
///
/// Paths become output node ids once the whole hierarchy is registered.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSkin {
    pub mesh: String,
    pub deformer: String,
    pub joints: Vec<NodePath>,
    /// Unit scale already applied
    pub inverse_bind_matrices: Vec<DMat4>,
}

impl PendingSkin {
    /// Column-major f32 matrices in joint order
    pub fn inverse_bind_matrices_f32(&self) -> Vec<[f32; 16]> {
        self.inverse_bind_matrices
            .iter()
            .map(|matrix| matrix.as_mat4().to_cols_array())
            .collect()
    }
}
