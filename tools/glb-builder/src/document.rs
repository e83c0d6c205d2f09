//! glTF document construction

use crate::{AnimationAccessors, MeshAccessors, SkinAccessors};
use gltf_json as json;
use gltf_json::validation::Checked::Valid;
use std::collections::BTreeMap;

/// Builder for complete glTF documents
pub struct GltfBuilder {
    nodes: Vec<json::Node>,
    meshes: Vec<json::Mesh>,
    skins: Vec<json::Skin>,
    animations: Vec<json::Animation>,
    scenes: Vec<json::Scene>,
    buffer_byte_length: u64,
    buffer_uri: Option<String>,
}

impl GltfBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            meshes: Vec::new(),
            skins: Vec::new(),
            animations: Vec::new(),
            scenes: Vec::new(),
            buffer_byte_length: 0,
            buffer_uri: None,
        }
    }

    /// Set buffer byte length (required before building)
    pub fn buffer_byte_length(mut self, length: u64) -> Self {
        self.buffer_byte_length = length;
        self
    }

    /// Reference the buffer through an external URI instead of the GLB BIN chunk
    pub fn buffer_uri(mut self, uri: &str) -> Self {
        self.buffer_uri = Some(uri.to_string());
        self
    }

    /// Add a node with a TRS transform
    #[allow(clippy::too_many_arguments)]
    pub fn add_node(
        mut self,
        name: &str,
        translation: [f32; 3],
        rotation: [f32; 4],
        scale: [f32; 3],
        children: &[u32],
        mesh: Option<u32>,
        skin: Option<u32>,
    ) -> Self {
        self.nodes.push(json::Node {
            camera: None,
            children: if children.is_empty() {
                None
            } else {
                Some(children.iter().map(|c| json::Index::new(*c)).collect())
            },
            extensions: Default::default(),
            extras: Default::default(),
            matrix: None,
            mesh: mesh.map(json::Index::new),
            name: Some(name.to_string()),
            rotation: Some(json::scene::UnitQuaternion(rotation)),
            scale: Some(scale),
            translation: Some(translation),
            skin: skin.map(json::Index::new),
            weights: None,
        });
        self
    }

    /// Add a single-primitive triangle mesh
    pub fn add_mesh_from_accessors(mut self, name: &str, accessors: &MeshAccessors) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            Valid(json::mesh::Semantic::Positions),
            accessors.positions.as_json_index(),
        );

        if let Some(normals) = accessors.normals {
            attributes.insert(
                Valid(json::mesh::Semantic::Normals),
                normals.as_json_index(),
            );
        }

        if let Some(uvs) = accessors.uvs {
            attributes.insert(
                Valid(json::mesh::Semantic::TexCoords(0)),
                uvs.as_json_index(),
            );
        }

        for (set, joint_set) in accessors.joint_sets.iter().enumerate() {
            attributes.insert(
                Valid(json::mesh::Semantic::Joints(set as u32)),
                joint_set.joints.as_json_index(),
            );
            attributes.insert(
                Valid(json::mesh::Semantic::Weights(set as u32)),
                joint_set.weights.as_json_index(),
            );
        }

        let primitive = json::mesh::Primitive {
            attributes,
            extensions: Default::default(),
            extras: Default::default(),
            indices: accessors.indices.map(|i| i.as_json_index()),
            material: None,
            mode: Valid(json::mesh::Mode::Triangles),
            targets: None,
        };

        self.meshes.push(json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(name.to_string()),
            primitives: vec![primitive],
            weights: None,
        });

        self
    }

    /// Add a skin over already-added joint nodes
    pub fn add_skin(
        mut self,
        name: &str,
        skeleton_root: Option<u32>,
        joints: &[u32],
        accessors: &SkinAccessors,
    ) -> Self {
        self.skins.push(json::Skin {
            extensions: Default::default(),
            extras: Default::default(),
            inverse_bind_matrices: Some(accessors.inverse_bind_matrices.as_json_index()),
            joints: joints.iter().map(|j| json::Index::new(*j)).collect(),
            name: Some(name.to_string()),
            skeleton: skeleton_root.map(json::Index::new),
        });
        self
    }

    /// Add an animation with one LINEAR sampler per baked track
    pub fn add_animation(mut self, name: &str, accessors: &AnimationAccessors) -> Self {
        let mut samplers = Vec::new();
        let mut channels = Vec::new();

        for track in &accessors.tracks {
            let outputs = [
                (json::animation::Property::Translation, track.translations),
                (json::animation::Property::Rotation, track.rotations),
                (json::animation::Property::Scale, track.scales),
            ];

            for (property, output) in outputs {
                samplers.push(json::animation::Sampler {
                    input: accessors.times.as_json_index(),
                    interpolation: Valid(json::animation::Interpolation::Linear),
                    output: output.as_json_index(),
                    extensions: Default::default(),
                    extras: Default::default(),
                });
                channels.push(json::animation::Channel {
                    sampler: json::Index::new(samplers.len() as u32 - 1),
                    target: json::animation::Target {
                        node: json::Index::new(track.node),
                        path: Valid(property),
                        extensions: Default::default(),
                        extras: Default::default(),
                    },
                    extensions: Default::default(),
                    extras: Default::default(),
                });
            }
        }

        self.animations.push(json::Animation {
            channels,
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(name.to_string()),
            samplers,
        });
        self
    }

    pub fn add_scene(mut self, name: &str, root_nodes: &[u32]) -> Self {
        self.scenes.push(json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(name.to_string()),
            nodes: root_nodes.iter().map(|n| json::Index::new(*n)).collect(),
        });
        self
    }

    /// Build final glTF root (buffer views and accessors come from `BufferBuilder`)
    pub fn build(
        self,
        buffer_views: &[json::buffer::View],
        accessors: &[json::Accessor],
        generator: &str,
    ) -> json::Root {
        let buffers = if self.buffer_byte_length == 0 {
            Vec::new()
        } else {
            vec![json::Buffer {
                byte_length: self.buffer_byte_length.into(),
                extensions: Default::default(),
                extras: Default::default(),
                name: None,
                uri: self.buffer_uri,
            }]
        };

        json::Root {
            accessors: accessors.to_vec(),
            animations: self.animations,
            asset: json::Asset {
                copyright: None,
                extensions: Default::default(),
                extras: Default::default(),
                generator: Some(generator.to_string()),
                min_version: None,
                version: "2.0".to_string(),
            },
            buffers,
            buffer_views: buffer_views.to_vec(),
            cameras: Vec::new(),
            extensions: Default::default(),
            extensions_required: Vec::new(),
            extensions_used: Vec::new(),
            extras: Default::default(),
            images: Vec::new(),
            materials: Vec::new(),
            meshes: self.meshes,
            nodes: self.nodes,
            samplers: Vec::new(),
            scene: if self.scenes.is_empty() {
                None
            } else {
                Some(json::Index::new(0))
            },
            scenes: self.scenes,
            skins: self.skins,
            textures: Vec::new(),
        }
    }
}

impl Default for GltfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnimationBuilder, BufferBuilder, MeshBuilder, SkinBuilder};

    const IDENTITY_ROTATION: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

    #[test]
    fn test_gltf_builder_basic() {
        let mut buffer = BufferBuilder::new();
        let mesh = MeshBuilder::new()
            .positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]])
            .indices(&[0, 1, 2])
            .build(&mut buffer);

        let gltf = GltfBuilder::new()
            .buffer_byte_length(buffer.data().len() as u64)
            .add_node("Triangle", [0.0; 3], IDENTITY_ROTATION, [1.0; 3], &[], Some(0), None)
            .add_mesh_from_accessors("Triangle", &mesh)
            .add_scene("Scene", &[0]);

        let root = gltf.build(buffer.views(), buffer.accessors(), "test");

        assert_eq!(root.meshes.len(), 1);
        assert_eq!(root.nodes.len(), 1);
        assert!(root.nodes[0].children.is_none());
        assert_eq!(root.scenes.len(), 1);
        assert_eq!(root.buffers.len(), 1);
        assert_eq!(root.asset.version, "2.0");
    }

    #[test]
    fn test_skin_and_animation_channels() {
        let mut buffer = BufferBuilder::new();
        let skin = SkinBuilder::new()
            .add_joint([0.0; 16])
            .add_joint([0.0; 16])
            .build(&mut buffer);
        let animation = AnimationBuilder::new(&[0.0, 1.0])
            .node_tracks(1, &[[0.0; 3]; 2], &[IDENTITY_ROTATION; 2], &[[1.0; 3]; 2])
            .build(&mut buffer);

        let root = GltfBuilder::new()
            .buffer_byte_length(buffer.data().len() as u64)
            .add_node("Root", [0.0; 3], IDENTITY_ROTATION, [1.0; 3], &[1], None, None)
            .add_node("Child", [0.0; 3], IDENTITY_ROTATION, [1.0; 3], &[], None, None)
            .add_skin("Skin", Some(0), &[0, 1], &skin)
            .add_animation("Take", &animation)
            .build(buffer.views(), buffer.accessors(), "test");

        assert_eq!(root.skins[0].joints.len(), 2);
        // translation + rotation + scale for the single animated node
        assert_eq!(root.animations[0].channels.len(), 3);
        assert_eq!(root.animations[0].samplers.len(), 3);
        assert!(root.scene.is_none());
    }
}
