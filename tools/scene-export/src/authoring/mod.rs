//! Read-only view of the authoring host's scene
//!
//! The exporter never talks to a modeling host directly. Everything it needs
//! (hierarchy, transforms at arbitrary times, mesh shapes and their skin
//! deformers) goes through [`AuthoringScene`]. [`MemoryScene`] is the
//! in-process implementation used by the CLI and the tests.

mod memory;

pub use memory::{
    MemoryScene, MeshDescription, NodeDescription, SceneDescription, SkinDescription,
    SkinJointDescription, TransformDescription, TransformKey,
};

use glam::DMat4;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Separator between path components
pub const PATH_SEPARATOR: char = '/';

/// Stable identifier of one authoring node instance
///
/// Instanced nodes reached through different parents have different paths,
/// which is what keeps the exported graph a tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(String);

impl NodePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Path of a top-level node
    pub fn root(name: &str) -> Self {
        Self(format!("{PATH_SEPARATOR}{name}"))
    }

    /// Path of a direct child of `self`
    pub fn join(&self, name: &str) -> Self {
        Self(format!("{}{PATH_SEPARATOR}{name}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path component
    pub fn leaf(&self) -> &str {
        self.0
            .rsplit(PATH_SEPARATOR)
            .find(|part| !part.is_empty())
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Transform,
    Joint,
}

/// One polygon with an independent index stream per attribute
///
/// `normals` and `uvs`, when absent, fall back to the position indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub positions: Vec<u32>,
    #[serde(default)]
    pub normals: Option<Vec<u32>>,
    #[serde(default)]
    pub uvs: Option<Vec<u32>>,
}

impl Face {
    pub fn new(positions: &[u32]) -> Self {
        Self {
            positions: positions.to_vec(),
            normals: None,
            uvs: None,
        }
    }
}

/// Joint influence as captured at bind time
#[derive(Debug, Clone, PartialEq)]
pub struct SkinJoint {
    pub path: NodePath,
    pub inverse_bind_matrix: DMat4,
}

/// A skin deformer bound to one mesh
#[derive(Debug, Clone, PartialEq)]
pub struct SkinDeformer {
    pub name: String,
    /// Deformer-native joint order
    pub joints: Vec<SkinJoint>,
    /// One row per mesh position, one column per joint
    pub weights: Vec<Vec<f32>>,
}

/// Mesh shape as exposed by the host
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub faces: Vec<Face>,
    /// Every skin deformer bound to the mesh, in deformer-stack order
    pub skins: Vec<SkinDeformer>,
}

/// Queries the exporter issues against the authoring host
///
/// Implementations must be deterministic: the same query on an unmodified
/// scene returns the same answer, and `children` preserves host order.
pub trait AuthoringScene {
    /// Top-level nodes in host order
    fn roots(&self) -> Vec<NodePath>;

    fn children(&self, path: &NodePath) -> Result<Vec<NodePath>>;

    fn kind(&self, path: &NodePath) -> Result<NodeKind>;

    /// Display name before collision handling
    fn partial_name(&self, path: &NodePath) -> Result<String> {
        Ok(path.leaf().to_string())
    }

    /// World matrix of `path` evaluated at host time `time` (seconds)
    fn world_matrix(&self, path: &NodePath, time: f64) -> Result<DMat4>;

    /// Mesh shape carried by the node, if any
    fn mesh(&self, path: &NodePath) -> Option<&MeshData>;

    /// Native frame rate of the host timeline
    fn frame_rate(&self) -> f64;

    /// Time at which the static hierarchy is captured
    fn current_time(&self) -> f64 {
        0.0
    }
}
