//! Exportable node
//!
//! One authoring node on its way into the output graph. Construction does all
//! the fallible work (naming, parent-relative decomposition, mesh build) and
//! yields a plain value; [`crate::scene::ExportableScene`] then registers it.

use glam::DMat4;

use crate::animation::{NodeAnimation, SampleFailure};
use crate::args::ExportArgs;
use crate::authoring::{AuthoringScene, NodeKind, NodePath};
use crate::document::{MeshId, NodeId, OutputNode};
use crate::error::{ExportError, Result};
use crate::mesh::ExportableMesh;
use crate::names::NameRegistry;
use crate::transform::{decompose, object_space_matrix, Trs};

#[derive(Debug, Clone)]
pub struct ExportableNode {
    path: NodePath,
    name: String,
    kind: NodeKind,
    parent: Option<NodeId>,
    parent_path: Option<NodePath>,
    /// World matrix at the capture time
    world: DMat4,
    trs: Trs,
    mesh: Option<ExportableMesh>,
    id: Option<NodeId>,
}

impl ExportableNode {
    /// Build a node from the host; `parent` must already be registered
    pub fn new(
        host: &dyn AuthoringScene,
        args: &ExportArgs,
        names: &mut NameRegistry,
        path: NodePath,
        parent: Option<&ExportableNode>,
    ) -> Result<Self> {
        let name = names.assign(&path, &host.partial_name(&path)?)?;
        let kind = host.kind(&path)?;

        let parent_id = match parent {
            Some(parent) => Some(
                parent
                    .id
                    .ok_or_else(|| ExportError::UnknownNode(parent.path.clone()))?,
            ),
            None => None,
        };

        let world = host.world_matrix(&path, host.current_time())?;
        let local = object_space_matrix(&world, parent.map(|p| &p.world), &name)?;
        let trs = decompose(&local, args.scale_factor, &name)?;

        let mesh = match host.mesh(&path) {
            Some(data) if args.selection.has_item(&path) => {
                Some(ExportableMesh::build(data, args)?)
            }
            _ => None,
        };

        tracing::debug!(
            "Node '{}' ({}) {:?}{}",
            name,
            path,
            kind,
            if mesh.is_some() { " with mesh" } else { "" }
        );

        Ok(Self {
            path,
            name,
            kind,
            parent: parent_id,
            parent_path: parent.map(|p| p.path.clone()),
            world,
            trs,
            mesh,
            id: None,
        })
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn parent_path(&self) -> Option<&NodePath> {
        self.parent_path.as_ref()
    }

    pub fn trs(&self) -> &Trs {
        &self.trs
    }

    pub fn world_matrix(&self) -> &DMat4 {
        &self.world
    }

    pub fn mesh(&self) -> Option<&ExportableMesh> {
        self.mesh.as_ref()
    }

    /// Output id, set once the node is registered
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = Some(id);
    }

    /// Output node entry without children or skin
    pub(crate) fn to_output(&self, mesh: Option<MeshId>) -> OutputNode {
        OutputNode {
            name: self.name.clone(),
            translation: self.trs.translation_f32(),
            rotation: self.trs.rotation_f32(),
            scale: self.trs.scale_f32(),
            children: Vec::new(),
            mesh,
            skin: None,
        }
    }

    /// Sample this node's local transform at every host time in `frame_times`
    pub fn create_animation(
        &self,
        host: &dyn AuthoringScene,
        frame_times: &[f64],
        scale_factor: f64,
    ) -> Result<NodeAnimation, SampleFailure> {
        NodeAnimation::sample(host, self, frame_times, scale_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{NameCollision, Selection};
    use crate::authoring::{Face, MemoryScene, MeshDescription, NodeDescription, SceneDescription};
    use glam::DVec3;

    fn scene() -> MemoryScene {
        MemoryScene::new(SceneDescription {
            nodes: vec![NodeDescription::new("root")
                .translation([0.0, 10.0, 0.0])
                .scale([2.0, 2.0, 2.0])
                .child(
                    NodeDescription::new("box")
                        .translation([1.0, 0.0, 0.0])
                        .mesh(MeshDescription {
                            positions: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                            faces: vec![Face::new(&[0, 1, 2])],
                            ..Default::default()
                        }),
                )],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_local_transform_is_parent_relative() {
        let host = scene();
        let args = ExportArgs::default();
        let mut names = NameRegistry::new(NameCollision::Suffix);

        let mut root =
            ExportableNode::new(&host, &args, &mut names, NodePath::new("/root"), None).unwrap();
        root.set_id(NodeId(0));
        let child = ExportableNode::new(
            &host,
            &args,
            &mut names,
            NodePath::new("/root/box"),
            Some(&root),
        )
        .unwrap();

        assert_eq!(child.parent(), Some(NodeId(0)));
        assert_eq!(child.name(), "box");
        assert!(child
            .trs()
            .translation
            .abs_diff_eq(DVec3::new(1.0, 0.0, 0.0), 1e-9));
        assert!(child.trs().scale.abs_diff_eq(DVec3::ONE, 1e-9));
        assert_eq!(child.mesh().unwrap().name(), "boxShape");
    }

    #[test]
    fn test_unregistered_parent_rejected() {
        let host = scene();
        let args = ExportArgs::default();
        let mut names = NameRegistry::new(NameCollision::Suffix);

        let root =
            ExportableNode::new(&host, &args, &mut names, NodePath::new("/root"), None).unwrap();
        let result = ExportableNode::new(
            &host,
            &args,
            &mut names,
            NodePath::new("/root/box"),
            Some(&root),
        );
        assert!(matches!(result, Err(ExportError::UnknownNode(_))));
    }

    #[test]
    fn test_unselected_mesh_is_skipped() {
        let host = scene();
        let args = ExportArgs {
            selection: Selection::from_paths([NodePath::new("/root")]),
            ..Default::default()
        };
        let mut names = NameRegistry::new(NameCollision::Suffix);

        let mut root =
            ExportableNode::new(&host, &args, &mut names, NodePath::new("/root"), None).unwrap();
        root.set_id(NodeId(0));
        let child = ExportableNode::new(
            &host,
            &args,
            &mut names,
            NodePath::new("/root/box"),
            Some(&root),
        )
        .unwrap();
        assert!(child.mesh().is_none());
    }

    #[test]
    fn test_root_translation_scaled() {
        let host = scene();
        let args = ExportArgs {
            scale_factor: 0.1,
            ..Default::default()
        };
        let mut names = NameRegistry::new(NameCollision::Suffix);
        let root =
            ExportableNode::new(&host, &args, &mut names, NodePath::new("/root"), None).unwrap();
        assert_eq!(root.to_output(None).translation, [0.0, 1.0, 0.0]);
        assert_eq!(root.to_output(None).scale, [2.0; 3]);
    }
}
