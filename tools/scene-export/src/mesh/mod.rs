//! Exportable mesh
//!
//! Turns a host mesh shape into unified per-vertex attribute streams plus a
//! u32 triangle list, with optional joint/weight sets taken from the mesh's
//! [`MeshSkeleton`].

mod topology;
mod types;

pub use types::{JointSetData, PendingSkin};

use crate::args::ExportArgs;
use crate::authoring::MeshData;
use crate::document::{AccessorData, Document, JointSet, MeshId, OutputMesh};
use crate::error::Result;
use crate::skeleton::{MeshSkeleton, JOINTS_PER_SET};

#[derive(Debug, Clone)]
pub struct ExportableMesh {
    name: String,
    positions: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    uvs: Option<Vec<[f32; 2]>>,
    joint_sets: Vec<JointSetData>,
    indices: Vec<u32>,
    skeleton: MeshSkeleton,
    skipped_faces: usize,
}

impl ExportableMesh {
    pub fn build(mesh: &MeshData, args: &ExportArgs) -> Result<Self> {
        let skeleton = MeshSkeleton::extract(mesh, args)?;
        let topology = topology::triangulate(mesh, args.max_degenerate_faces)?;

        let scale = args.scale_factor as f32;
        let positions = topology
            .corners
            .iter()
            .map(|corner| mesh.positions[corner.position as usize].map(|v| v * scale))
            .collect();

        let normals = (!mesh.normals.is_empty()).then(|| {
            topology
                .corners
                .iter()
                .map(|corner| mesh.normals[corner.normal as usize])
                .collect()
        });

        let uvs = (!mesh.uvs.is_empty()).then(|| {
            topology
                .corners
                .iter()
                .map(|corner| mesh.uvs[corner.uv as usize])
                .collect()
        });

        // Sets are padded with zero joints and zero weights
        let set_count = skeleton.vertex_joint_assignment_set_count();
        let mut joint_sets = vec![JointSetData::default(); set_count];
        for corner in &topology.corners {
            let assignments = skeleton.vertex_joint_assignments(corner.position as usize);
            for (set_index, set) in joint_sets.iter_mut().enumerate() {
                let mut joints = [0u16; 4];
                let mut weights = [0f32; 4];
                let start = set_index * JOINTS_PER_SET;
                let span = assignments.iter().skip(start).take(JOINTS_PER_SET);
                for (slot, assignment) in span.enumerate() {
                    joints[slot] = assignment.joint_index;
                    weights[slot] = assignment.weight;
                }
                set.joints.push(joints);
                set.weights.push(weights);
            }
        }

        tracing::debug!(
            "Mesh '{}': {} vertices, {} triangles, {} joint sets",
            mesh.name,
            topology.corners.len(),
            topology.indices.len() / 3,
            set_count
        );

        Ok(Self {
            name: mesh.name.clone(),
            positions,
            normals,
            uvs,
            joint_sets,
            indices: topology.indices,
            skeleton,
            skipped_faces: topology.skipped_faces,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> Option<&[[f32; 3]]> {
        self.normals.as_deref()
    }

    pub fn uvs(&self) -> Option<&[[f32; 2]]> {
        self.uvs.as_deref()
    }

    pub fn joint_sets(&self) -> &[JointSetData] {
        &self.joint_sets
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn skeleton(&self) -> &MeshSkeleton {
        &self.skeleton
    }

    pub fn skipped_faces(&self) -> usize {
        self.skipped_faces
    }

    pub fn is_skinned(&self) -> bool {
        !self.skeleton.is_empty()
    }

    /// Skin to resolve once every joint node is registered
    pub fn pending_skin(&self) -> Option<PendingSkin> {
        if !self.is_skinned() {
            return None;
        }
        let joints = self.skeleton.joints();
        Some(PendingSkin {
            mesh: self.name.clone(),
            deformer: self.skeleton.deformer_name().unwrap_or_default().to_string(),
            joints: joints.iter().map(|joint| joint.path.clone()).collect(),
            inverse_bind_matrices: joints.iter().map(|joint| joint.inverse_bind_matrix).collect(),
        })
    }

    /// Push attribute accessors and the mesh entry
    pub fn register(&self, document: &mut Document) -> MeshId {
        let positions = document.push_accessor(AccessorData::Vec3(self.positions.clone()));
        let normals = self
            .normals
            .as_ref()
            .map(|normals| document.push_accessor(AccessorData::Vec3(normals.clone())));
        let uvs = self
            .uvs
            .as_ref()
            .map(|uvs| document.push_accessor(AccessorData::Vec2(uvs.clone())));
        let joint_sets = self
            .joint_sets
            .iter()
            .map(|set| JointSet {
                joints: document.push_accessor(AccessorData::Joints(set.joints.clone())),
                weights: document.push_accessor(AccessorData::Vec4(set.weights.clone())),
            })
            .collect();
        let indices = document.push_accessor(AccessorData::Indices(self.indices.clone()));

        document.push_mesh(OutputMesh {
            name: self.name.clone(),
            positions,
            normals,
            uvs,
            joint_sets,
            indices,
        })
    }
}
