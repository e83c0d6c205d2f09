//! Shared authoring scenes for integration tests

#![allow(dead_code)]

use glam::DQuat;
use scene_export::authoring::{
    Face, MeshDescription, NodeDescription, SceneDescription, SkinDescription,
    TransformDescription,
};

pub const HIPS: &str = "/character/hips";
pub const SPINE: &str = "/character/hips/spine";

fn pose(translation: [f64; 3], rotation: DQuat) -> TransformDescription {
    TransformDescription {
        translation,
        rotation: rotation.to_array(),
        ..Default::default()
    }
}

/// Quad skinned to two joints, with per-corner normals and uvs
pub fn body_mesh(skins: Vec<SkinDescription>) -> MeshDescription {
    MeshDescription {
        name: None,
        positions: vec![
            [-0.5, 0.0, 0.0],
            [0.5, 0.0, 0.0],
            [0.5, 1.5, 0.0],
            [-0.5, 1.5, 0.0],
        ],
        normals: vec![[0.0, 0.0, 1.0]],
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        faces: vec![Face {
            positions: vec![0, 1, 2, 3],
            normals: Some(vec![0, 0, 0, 0]),
            uvs: None,
        }],
        skins,
    }
}

pub fn body_skin(name: &str) -> SkinDescription {
    SkinDescription {
        name: name.to_string(),
        joints: vec![HIPS.into(), SPINE.into()],
        weights: vec![
            vec![1.0, 0.0],
            vec![0.6, 0.4],
            vec![0.3, 0.7],
            vec![0.0, 1.0],
        ],
    }
}

/// `character` (hips -> spine joints, skinned body) plus a static `prop`
///
/// Pre-order ids: character 0, hips 1, spine 2, body 3, prop 4.
pub fn character() -> SceneDescription {
    character_with_skins(vec![body_skin("skinCluster1")])
}

pub fn character_with_skins(skins: Vec<SkinDescription>) -> SceneDescription {
    let hips = NodeDescription::new("hips")
        .joint()
        .translation([0.0, 1.0, 0.0])
        .key(0.0, pose([0.0, 1.0, 0.0], DQuat::IDENTITY))
        .key(10.0, pose([0.0, 1.0, 10.0], DQuat::from_rotation_y(1.5)))
        .child(
            NodeDescription::new("spine")
                .joint()
                .translation([0.0, 0.5, 0.0])
                .key(0.0, pose([0.0, 0.5, 0.0], DQuat::IDENTITY))
                .key(10.0, pose([0.0, 0.5, 0.0], DQuat::from_rotation_z(0.5))),
        );

    let prop = NodeDescription::new("prop")
        .translation([3.0, 0.0, 0.0])
        .mesh(MeshDescription {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            faces: vec![Face::new(&[0, 1, 2])],
            ..Default::default()
        });

    SceneDescription {
        frame_rate: 24.0,
        current_time: 0.0,
        nodes: vec![
            NodeDescription::new("character")
                .child(hips)
                .child(NodeDescription::new("body").mesh(body_mesh(skins))),
            prop,
        ],
    }
}
