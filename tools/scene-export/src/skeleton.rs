//! Mesh skeleton extraction
//!
//! Reads the skin deformer bound to a mesh and produces the joint list
//! (deformer-native order, which becomes the glTF joint-index space) and a
//! bounded, weight-sorted set of joint influences per vertex.

use glam::DMat4;
use serde::Serialize;
use std::ops::Range;

use crate::args::ExportArgs;
use crate::authoring::{MeshData, NodePath, SkinDeformer};
use crate::error::{ExportError, Result};
use crate::transform::scale_matrix_translation;

/// Influences at or below this weight are dropped
pub const NEGLIGIBLE_WEIGHT: f32 = 1e-5;

/// Width of one `JOINTS_n` / `WEIGHTS_n` attribute
pub const JOINTS_PER_SET: usize = 4;

/// Joint indices are stored as u16 in the output
const MAX_JOINT_COUNT: usize = u16::MAX as usize + 1;

#[derive(Debug, Clone, PartialEq)]
pub struct MeshJoint {
    pub path: NodePath,
    /// Inverse bind matrix with the unit scale already applied
    pub inverse_bind_matrix: DMat4,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VertexJointAssignment {
    pub joint_index: u16,
    pub weight: f32,
}

/// Joints of one skinned mesh plus the per-vertex influence table
///
/// All per-vertex spans index into one contiguous backing vector.
#[derive(Debug, Clone, Default)]
pub struct MeshSkeleton {
    deformer: Option<String>,
    joints: Vec<MeshJoint>,
    assignments: Vec<VertexJointAssignment>,
    spans: Vec<Range<usize>>,
    max_vertex_joint_assignment_count: usize,
}

impl MeshSkeleton {
    /// Skeleton of an unskinned mesh
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn extract(mesh: &MeshData, args: &ExportArgs) -> Result<Self> {
        let Some(skin) = find_skin(mesh, args)? else {
            return Ok(Self::empty());
        };

        if skin.joints.is_empty() {
            tracing::warn!(
                "Skin '{}' on mesh '{}' has no joints, exporting unskinned",
                skin.name,
                mesh.name
            );
            return Ok(Self::empty());
        }

        let joint_count = skin.joints.len();
        if joint_count > MAX_JOINT_COUNT {
            return Err(ExportError::topology(
                &mesh.name,
                format!("skin has {joint_count} joints, maximum is {MAX_JOINT_COUNT}"),
            ));
        }

        if skin.weights.len() != mesh.positions.len() {
            return Err(ExportError::topology(
                &mesh.name,
                format!(
                    "skin '{}' has {} weight rows for {} positions",
                    skin.name,
                    skin.weights.len(),
                    mesh.positions.len()
                ),
            ));
        }

        let joints = skin
            .joints
            .iter()
            .map(|joint| MeshJoint {
                path: joint.path.clone(),
                inverse_bind_matrix: scale_matrix_translation(
                    &joint.inverse_bind_matrix,
                    args.scale_factor,
                ),
            })
            .collect();

        let mut skeleton = Self {
            deformer: Some(skin.name.clone()),
            joints,
            assignments: Vec::with_capacity(mesh.positions.len() * JOINTS_PER_SET),
            spans: Vec::with_capacity(mesh.positions.len()),
            max_vertex_joint_assignment_count: 0,
        };

        let mut scratch = Vec::with_capacity(joint_count);
        let mut unweighted = 0usize;

        for (vertex, row) in skin.weights.iter().enumerate() {
            if row.len() > joint_count {
                return Err(ExportError::topology(
                    &mesh.name,
                    format!(
                        "vertex {vertex} has {} weights for {joint_count} joints",
                        row.len()
                    ),
                ));
            }

            scratch.clear();
            scratch.extend(
                row.iter()
                    .enumerate()
                    .filter(|(_, weight)| weight.is_finite() && **weight > NEGLIGIBLE_WEIGHT)
                    .map(|(joint, &weight)| VertexJointAssignment {
                        joint_index: joint as u16,
                        weight,
                    }),
            );

            // Stable sort: equal weights keep deformer joint order
            scratch.sort_by(|a, b| b.weight.total_cmp(&a.weight));
            scratch.truncate(args.max_joint_influences);

            // Redistribute the mass of dropped influences over the kept ones
            let total: f32 = scratch.iter().map(|a| a.weight).sum();
            if total > 0.0 {
                for assignment in &mut scratch {
                    assignment.weight /= total;
                }
            } else {
                unweighted += 1;
            }

            let start = skeleton.assignments.len();
            skeleton.assignments.extend_from_slice(&scratch);
            skeleton.spans.push(start..skeleton.assignments.len());
            skeleton.max_vertex_joint_assignment_count =
                skeleton.max_vertex_joint_assignment_count.max(scratch.len());
        }

        if unweighted > 0 {
            tracing::warn!(
                "Mesh '{}': {} vertices have no joint influence above {}",
                mesh.name,
                unweighted,
                NEGLIGIBLE_WEIGHT
            );
        }

        if args.dump_skeletons {
            match serde_json::to_string(&skeleton.dump(&mesh.name)) {
                Ok(dump) => tracing::debug!("Skeleton of '{}': {}", mesh.name, dump),
                Err(err) => tracing::warn!("Failed to dump skeleton of '{}': {}", mesh.name, err),
            }
        }

        Ok(skeleton)
    }

    pub fn is_empty(&self) -> bool {
        self.max_vertex_joint_assignment_count == 0
    }

    pub fn deformer_name(&self) -> Option<&str> {
        self.deformer.as_deref()
    }

    pub fn joints(&self) -> &[MeshJoint] {
        &self.joints
    }

    /// Number of vertices covered by the assignment table
    pub fn vertex_count(&self) -> usize {
        self.spans.len()
    }

    /// Influences of one authoring vertex, heaviest first
    pub fn vertex_joint_assignments(&self, vertex: usize) -> &[VertexJointAssignment] {
        self.spans
            .get(vertex)
            .map(|span| &self.assignments[span.clone()])
            .unwrap_or(&[])
    }

    pub fn max_vertex_joint_assignment_count(&self) -> usize {
        self.max_vertex_joint_assignment_count
    }

    /// Number of 4-wide joint/weight attribute sets needed per vertex
    pub fn vertex_joint_assignment_set_count(&self) -> usize {
        self.max_vertex_joint_assignment_count.div_ceil(JOINTS_PER_SET)
    }

    pub fn dump(&self, mesh_name: &str) -> SkeletonDump {
        SkeletonDump {
            mesh: mesh_name.to_string(),
            deformer: self.deformer.clone(),
            joints: self.joints.iter().map(|j| j.path.to_string()).collect(),
            max_vertex_joint_assignment_count: self.max_vertex_joint_assignment_count,
            vertex_joint_assignments: self
                .spans
                .iter()
                .map(|span| self.assignments[span.clone()].to_vec())
                .collect(),
        }
    }
}

/// Serializable summary of a skeleton, for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct SkeletonDump {
    pub mesh: String,
    pub deformer: Option<String>,
    pub joints: Vec<String>,
    pub max_vertex_joint_assignment_count: usize,
    pub vertex_joint_assignments: Vec<Vec<VertexJointAssignment>>,
}

/// The single skin deformer bound to the mesh, ignoring configured ones
fn find_skin<'a>(mesh: &'a MeshData, args: &ExportArgs) -> Result<Option<&'a SkinDeformer>> {
    let mut bound = mesh
        .skins
        .iter()
        .filter(|skin| !args.is_ignored_deformer(&skin.name));

    let first = bound.next();
    let rest: Vec<&SkinDeformer> = bound.collect();
    if let (Some(first), false) = (first, rest.is_empty()) {
        let deformers = std::iter::once(first)
            .chain(rest)
            .map(|skin| skin.name.clone())
            .collect();
        return Err(ExportError::MultipleSkins {
            mesh: mesh.name.clone(),
            deformers,
        });
    }
    Ok(first)
}
