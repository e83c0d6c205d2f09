//! Per-node transform sampling

use glam::DQuat;

use crate::authoring::AuthoringScene;
use crate::document::NodeId;
use crate::error::ExportError;
use crate::node::ExportableNode;
use crate::transform::{decompose, object_space_matrix};

/// A node could not be evaluated at one frame
#[derive(Debug)]
pub struct SampleFailure {
    pub frame: usize,
    pub source: ExportError,
}

/// Baked local TRS tracks of one node, one sample per frame
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAnimation {
    node: NodeId,
    translations: Vec<[f32; 3]>,
    /// `[x, y, z, w]`, consecutive samples in the same hemisphere
    rotations: Vec<[f32; 4]>,
    scales: Vec<[f32; 3]>,
}

impl NodeAnimation {
    /// Evaluate `node` relative to its parent at each host time
    pub fn sample(
        host: &dyn AuthoringScene,
        node: &ExportableNode,
        frame_times: &[f64],
        scale_factor: f64,
    ) -> Result<Self, SampleFailure> {
        let id = node.id().ok_or_else(|| SampleFailure {
            frame: 0,
            source: ExportError::UnknownNode(node.path().clone()),
        })?;

        let mut animation = Self {
            node: id,
            translations: Vec::with_capacity(frame_times.len()),
            rotations: Vec::with_capacity(frame_times.len()),
            scales: Vec::with_capacity(frame_times.len()),
        };

        let mut previous: Option<DQuat> = None;
        for (frame, &time) in frame_times.iter().enumerate() {
            let fail = |source| SampleFailure { frame, source };

            let world = host.world_matrix(node.path(), time).map_err(fail)?;
            let parent_world = match node.parent_path() {
                Some(parent) => Some(host.world_matrix(parent, time).map_err(fail)?),
                None => None,
            };
            let local =
                object_space_matrix(&world, parent_world.as_ref(), node.name()).map_err(fail)?;
            let mut trs = decompose(&local, scale_factor, node.name()).map_err(fail)?;

            if let Some(previous) = previous {
                if previous.dot(trs.rotation) < 0.0 {
                    trs.rotation = -trs.rotation;
                }
            }
            previous = Some(trs.rotation);

            animation.translations.push(trs.translation_f32());
            animation.rotations.push(trs.rotation_f32());
            animation.scales.push(trs.scale_f32());
        }

        Ok(animation)
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn frame_count(&self) -> usize {
        self.translations.len()
    }

    pub fn translations(&self) -> &[[f32; 3]] {
        &self.translations
    }

    pub fn rotations(&self) -> &[[f32; 4]] {
        &self.rotations
    }

    pub fn scales(&self) -> &[[f32; 3]] {
        &self.scales
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{ExportArgs, NameCollision};
    use crate::authoring::{MemoryScene, NodeDescription, NodePath, SceneDescription, TransformDescription};
    use crate::names::NameRegistry;

    fn rotation_key(angle: f64) -> TransformDescription {
        TransformDescription {
            rotation: DQuat::from_rotation_z(angle).to_array(),
            ..Default::default()
        }
    }

    fn node(host: &MemoryScene, path: &str, parent: Option<&ExportableNode>, id: u32) -> ExportableNode {
        let mut names = NameRegistry::new(NameCollision::Suffix);
        let mut node = ExportableNode::new(
            host,
            &ExportArgs::default(),
            &mut names,
            NodePath::new(path),
            parent,
        )
        .unwrap();
        node.set_id(NodeId(id));
        node
    }

    #[test]
    fn test_samples_parent_relative_transform() {
        let host = MemoryScene::new(SceneDescription {
            nodes: vec![NodeDescription::new("root")
                .key(0.0, TransformDescription { translation: [0.0, 0.0, 0.0], ..Default::default() })
                .key(1.0, TransformDescription { translation: [10.0, 0.0, 0.0], ..Default::default() })
                .child(NodeDescription::new("arm").translation([0.0, 1.0, 0.0]))],
            ..Default::default()
        })
        .unwrap();
        let root = node(&host, "/root", None, 0);
        let arm = node(&host, "/root/arm", Some(&root), 1);

        let root_animation = root.create_animation(&host, &[0.0, 0.5, 1.0], 1.0).unwrap();
        assert_eq!(root_animation.node(), NodeId(0));
        assert_eq!(root_animation.frame_count(), 3);
        assert_eq!(root_animation.translations()[1], [5.0, 0.0, 0.0]);

        // The child does not move relative to its parent
        let arm_animation = arm.create_animation(&host, &[0.0, 0.5, 1.0], 1.0).unwrap();
        for translation in arm_animation.translations() {
            assert!((translation[1] - 1.0).abs() < 1e-6);
            assert!(translation[0].abs() < 1e-6);
        }
    }

    #[test]
    fn test_rotations_stay_in_one_hemisphere() {
        let host = MemoryScene::new(SceneDescription {
            nodes: vec![NodeDescription::new("spinner")
                .key(0.0, rotation_key(0.0))
                .key(1.0, rotation_key(3.0))
                .key(2.0, rotation_key(6.0))],
            ..Default::default()
        })
        .unwrap();
        let spinner = node(&host, "/spinner", None, 0);

        let times: Vec<f64> = (0..=20).map(|i| i as f64 * 0.1).collect();
        let animation = spinner.create_animation(&host, &times, 1.0).unwrap();
        for pair in animation.rotations().windows(2) {
            let dot: f32 = pair[0].iter().zip(pair[1]).map(|(a, b)| a * b).sum();
            assert!(dot >= 0.0);
        }
    }

    #[test]
    fn test_resampling_is_bit_identical() {
        let host = MemoryScene::new(SceneDescription {
            nodes: vec![NodeDescription::new("spinner")
                .key(0.0, rotation_key(0.0))
                .key(2.0, rotation_key(2.0))],
            ..Default::default()
        })
        .unwrap();
        let spinner = node(&host, "/spinner", None, 0);
        let times = [0.0, 0.3, 0.7, 1.9];

        let a = spinner.create_animation(&host, &times, 0.5).unwrap();
        let b = spinner.create_animation(&host, &times, 0.5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_failure_reports_frame() {
        let host = MemoryScene::new(SceneDescription {
            nodes: vec![NodeDescription::new("squash")
                .key(0.0, TransformDescription::default())
                .key(1.0, TransformDescription { scale: [1.0, -1.0, 1.0], ..Default::default() })],
            ..Default::default()
        })
        .unwrap();
        let squash = node(&host, "/squash", None, 0);

        // Scale y passes through zero at t = 0.5
        let failure = squash
            .create_animation(&host, &[0.0, 0.25, 0.5, 0.75], 1.0)
            .unwrap_err();
        assert_eq!(failure.frame, 2);
        assert!(matches!(failure.source, ExportError::Decomposition { .. }));
    }
}
