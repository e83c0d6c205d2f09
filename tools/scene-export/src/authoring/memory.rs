//! In-memory authoring scene
//!
//! Built from a [`SceneDescription`] (usually loaded from JSON). Node
//! transforms may carry time keys, which are interpolated linearly
//! (translation, scale) and spherically (rotation) between keys and held
//! constant outside the keyed range.

use anyhow::Context;
use glam::{DMat4, DQuat, DVec3};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{AuthoringScene, Face, MeshData, NodeKind, NodePath, SkinDeformer, SkinJoint};
use crate::error::{ExportError, Result};

/// Fallback frame rate when the description does not set one
const DEFAULT_FRAME_RATE: f64 = 24.0;

fn default_frame_rate() -> f64 {
    DEFAULT_FRAME_RATE
}

fn default_rotation() -> [f64; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn default_scale() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

/// Root of a serialized authoring scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    /// Time at which the static hierarchy and bind poses are captured
    #[serde(default)]
    pub current_time: f64,
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
}

impl Default for SceneDescription {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            current_time: 0.0,
            nodes: Vec::new(),
        }
    }
}

/// Local TRS of a node; rotation is a quaternion `[x, y, z, w]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformDescription {
    #[serde(default)]
    pub translation: [f64; 3],
    #[serde(default = "default_rotation")]
    pub rotation: [f64; 4],
    #[serde(default = "default_scale")]
    pub scale: [f64; 3],
}

impl Default for TransformDescription {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: default_rotation(),
            scale: default_scale(),
        }
    }
}

impl TransformDescription {
    fn parts(&self) -> (DVec3, DQuat, DVec3) {
        (
            DVec3::from_array(self.translation),
            DQuat::from_array(self.rotation).normalize(),
            DVec3::from_array(self.scale),
        )
    }

    pub fn to_matrix(&self) -> DMat4 {
        let (translation, rotation, scale) = self.parts();
        DMat4::from_scale_rotation_translation(scale, rotation, translation)
    }
}

/// Local transform of a node at one host time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformKey {
    pub time: f64,
    #[serde(flatten)]
    pub transform: TransformDescription,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeDescription {
    pub name: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub transform: TransformDescription,
    #[serde(default)]
    pub keys: Vec<TransformKey>,
    #[serde(default)]
    pub mesh: Option<MeshDescription>,
    #[serde(default)]
    pub children: Vec<NodeDescription>,
}

impl NodeDescription {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn joint(mut self) -> Self {
        self.kind = NodeKind::Joint;
        self
    }

    pub fn translation(mut self, translation: [f64; 3]) -> Self {
        self.transform.translation = translation;
        self
    }

    pub fn rotation(mut self, rotation: [f64; 4]) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: [f64; 3]) -> Self {
        self.transform.scale = scale;
        self
    }

    pub fn key(mut self, time: f64, transform: TransformDescription) -> Self {
        self.keys.push(TransformKey { time, transform });
        self
    }

    pub fn mesh(mut self, mesh: MeshDescription) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn child(mut self, child: NodeDescription) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshDescription {
    /// Defaults to the owning node's name with a `Shape` suffix
    #[serde(default)]
    pub name: Option<String>,
    pub positions: Vec<[f32; 3]>,
    #[serde(default)]
    pub normals: Vec<[f32; 3]>,
    #[serde(default)]
    pub uvs: Vec<[f32; 2]>,
    pub faces: Vec<Face>,
    #[serde(default)]
    pub skins: Vec<SkinDescription>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkinDescription {
    pub name: String,
    pub joints: Vec<SkinJointDescription>,
    /// One row per position, one column per joint
    pub weights: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkinJointDescription {
    pub path: NodePath,
    /// Column-major; defaults to the inverse of the joint's world matrix at
    /// the scene's current time
    #[serde(default)]
    pub inverse_bind_matrix: Option<[f64; 16]>,
}

impl From<&str> for SkinJointDescription {
    fn from(path: &str) -> Self {
        Self {
            path: NodePath::new(path),
            inverse_bind_matrix: None,
        }
    }
}

struct MemoryNode {
    parent: Option<NodePath>,
    kind: NodeKind,
    transform: TransformDescription,
    keys: Vec<TransformKey>,
    children: Vec<NodePath>,
    mesh: Option<MeshData>,
}

impl MemoryNode {
    fn local_matrix(&self, time: f64) -> DMat4 {
        if self.keys.is_empty() {
            return self.transform.to_matrix();
        }
        let (translation, rotation, scale) = sample_keys(&self.keys, time);
        DMat4::from_scale_rotation_translation(scale, rotation, translation)
    }
}

/// Authoring scene held entirely in memory
pub struct MemoryScene {
    frame_rate: f64,
    current_time: f64,
    roots: Vec<NodePath>,
    nodes: HashMap<NodePath, MemoryNode>,
}

impl MemoryScene {
    pub fn new(description: SceneDescription) -> Result<Self> {
        let mut scene = Self {
            frame_rate: description.frame_rate,
            current_time: description.current_time,
            roots: Vec::new(),
            nodes: HashMap::new(),
        };

        // Meshes are resolved after the whole hierarchy exists, since skins
        // may reference joints anywhere in the tree.
        let mut pending_meshes = Vec::new();
        for node in description.nodes {
            let path = NodePath::root(&node.name);
            scene.roots.push(path.clone());
            scene.insert(node, path, None, &mut pending_meshes)?;
        }

        for (path, mesh) in pending_meshes {
            let data = scene.resolve_mesh(&path, mesh)?;
            if let Some(node) = scene.nodes.get_mut(&path) {
                node.mesh = Some(data);
            }
        }

        Ok(scene)
    }

    /// Load a JSON scene description from disk
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene: {:?}", path))?;
        let description: SceneDescription = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse scene: {:?}", path))?;
        Self::new(description).with_context(|| format!("Invalid scene: {:?}", path))
    }

    fn insert(
        &mut self,
        description: NodeDescription,
        path: NodePath,
        parent: Option<NodePath>,
        pending_meshes: &mut Vec<(NodePath, MeshDescription)>,
    ) -> Result<()> {
        if self.nodes.contains_key(&path) {
            return Err(ExportError::DuplicateNode(path));
        }

        let mut keys = description.keys;
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));

        let child_paths: Vec<NodePath> = description
            .children
            .iter()
            .map(|child| path.join(&child.name))
            .collect();

        if let Some(mut mesh) = description.mesh {
            mesh.name
                .get_or_insert_with(|| format!("{}Shape", description.name));
            pending_meshes.push((path.clone(), mesh));
        }

        self.nodes.insert(
            path.clone(),
            MemoryNode {
                parent,
                kind: description.kind,
                transform: description.transform,
                keys,
                children: child_paths.clone(),
                mesh: None,
            },
        );

        for (child, child_path) in description.children.into_iter().zip(child_paths) {
            self.insert(child, child_path, Some(path.clone()), pending_meshes)?;
        }
        Ok(())
    }

    fn resolve_mesh(&self, path: &NodePath, mesh: MeshDescription) -> Result<MeshData> {
        let mut skins = Vec::with_capacity(mesh.skins.len());
        for skin in mesh.skins {
            let mut joints = Vec::with_capacity(skin.joints.len());
            for joint in skin.joints {
                let inverse_bind_matrix = match joint.inverse_bind_matrix {
                    Some(columns) => DMat4::from_cols_array(&columns),
                    None => {
                        let bind = self.world_matrix(&joint.path, self.current_time)?;
                        if bind.determinant().abs() < f64::EPSILON {
                            return Err(ExportError::decomposition(
                                joint.path.as_str(),
                                "bind pose is singular",
                            ));
                        }
                        bind.inverse()
                    }
                };
                joints.push(SkinJoint {
                    path: joint.path,
                    inverse_bind_matrix,
                });
            }
            skins.push(SkinDeformer {
                name: skin.name,
                joints,
                weights: skin.weights,
            });
        }

        Ok(MeshData {
            name: mesh.name.unwrap_or_else(|| path.leaf().to_string()),
            positions: mesh.positions,
            normals: mesh.normals,
            uvs: mesh.uvs,
            faces: mesh.faces,
            skins,
        })
    }

    fn node(&self, path: &NodePath) -> Result<&MemoryNode> {
        self.nodes
            .get(path)
            .ok_or_else(|| ExportError::UnknownNode(path.clone()))
    }
}

impl AuthoringScene for MemoryScene {
    fn roots(&self) -> Vec<NodePath> {
        self.roots.clone()
    }

    fn children(&self, path: &NodePath) -> Result<Vec<NodePath>> {
        Ok(self.node(path)?.children.clone())
    }

    fn kind(&self, path: &NodePath) -> Result<NodeKind> {
        Ok(self.node(path)?.kind)
    }

    fn partial_name(&self, path: &NodePath) -> Result<String> {
        self.node(path)?;
        Ok(path.leaf().to_string())
    }

    fn world_matrix(&self, path: &NodePath, time: f64) -> Result<DMat4> {
        let mut node = self.node(path)?;
        let mut world = node.local_matrix(time);
        while let Some(parent) = &node.parent {
            node = self.node(parent)?;
            world = node.local_matrix(time) * world;
        }
        Ok(world)
    }

    fn mesh(&self, path: &NodePath) -> Option<&MeshData> {
        self.nodes.get(path).and_then(|node| node.mesh.as_ref())
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }
}

/// Evaluate sorted keys at `time`, holding the first/last key outside the range
fn sample_keys(keys: &[TransformKey], time: f64) -> (DVec3, DQuat, DVec3) {
    let first = &keys[0];
    let last = &keys[keys.len() - 1];
    if time <= first.time {
        return first.transform.parts();
    }
    if time >= last.time {
        return last.transform.parts();
    }

    // Find the segment [i, i + 1] containing `time`
    let mut i = 0;
    while i < keys.len() - 2 && keys[i + 1].time <= time {
        i += 1;
    }

    let (t0, r0, s0) = keys[i].transform.parts();
    let (t1, r1, s1) = keys[i + 1].transform.parts();
    let span = keys[i + 1].time - keys[i].time;
    let factor = if span > 0.0 {
        ((time - keys[i].time) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };

    (t0.lerp(t1, factor), r0.slerp(r1, factor), s0.lerp(s1, factor))
}
