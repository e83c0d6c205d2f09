//! Exportable scene
//!
//! Walks the authoring hierarchy depth-first and owns everything produced on
//! the way: the node arena, the output document and the skins waiting for
//! their joints to be registered.
//!
//! Node ids are handed out in pre-order, so a node's id is also its index in
//! both the arena and the document's node list. Skins are resolved in a
//! separate pass because a mesh may be visited before the joints it binds to.

use hashbrown::{HashMap, HashSet};

use crate::animation::ExportableClip;
use crate::args::ExportArgs;
use crate::authoring::{AuthoringScene, NodePath};
use crate::document::{AccessorData, Document, NodeId, OutputSkin};
use crate::error::{ExportError, Result};
use crate::mesh::PendingSkin;
use crate::names::NameRegistry;
use crate::node::ExportableNode;

pub struct ExportableScene<'a> {
    host: &'a dyn AuthoringScene,
    args: &'a ExportArgs,
    names: NameRegistry,
    nodes: Vec<ExportableNode>,
    lookup: HashMap<NodePath, NodeId>,
    pending_skins: Vec<(NodeId, PendingSkin)>,
    document: Document,
}

impl<'a> ExportableScene<'a> {
    /// Build the static hierarchy and resolve every skin
    pub fn build(host: &'a dyn AuthoringScene, args: &'a ExportArgs) -> Result<Self> {
        let mut scene = Self {
            host,
            args,
            names: NameRegistry::new(args.name_collision),
            nodes: Vec::new(),
            lookup: HashMap::new(),
            pending_skins: Vec::new(),
            document: Document::new(),
        };

        let mut stack: Vec<(NodePath, Option<NodeId>)> =
            host.roots().into_iter().rev().map(|path| (path, None)).collect();

        while let Some((path, parent)) = stack.pop() {
            if scene.lookup.contains_key(&path) {
                return Err(ExportError::DuplicateNode(path));
            }

            let parent_node = parent.map(|id| &scene.nodes[id.index()]);
            let node =
                ExportableNode::new(host, args, &mut scene.names, path.clone(), parent_node)?;
            let id = scene.register(node);

            let children = host.children(&path)?;
            stack.extend(children.into_iter().rev().map(|child| (child, Some(id))));
        }

        scene.finalize_skins()?;

        tracing::info!(
            "Exported hierarchy: {} nodes, {} roots, {} meshes, {} skins",
            scene.document.nodes().len(),
            scene.document.roots().len(),
            scene.document.meshes().len(),
            scene.document.skins().len()
        );

        Ok(scene)
    }

    /// Add a constructed node to the arena and the document
    ///
    /// The node becomes a root when it has no parent; otherwise it is appended
    /// once to its parent's child list.
    pub fn register(&mut self, mut node: ExportableNode) -> NodeId {
        let mesh = node.mesh().map(|mesh| mesh.register(&mut self.document));
        let id = self.document.push_node(node.to_output(mesh));

        match node.parent() {
            Some(parent) => self.document.add_child(parent, id),
            None => self.document.add_root(id),
        }

        if let Some(skin) = node.mesh().and_then(|mesh| mesh.pending_skin()) {
            self.pending_skins.push((id, skin));
        }

        node.set_id(id);
        self.lookup.insert(node.path().clone(), id);
        self.nodes.push(node);
        id
    }

    /// Turn pending skins into document skins now that every node has an id
    fn finalize_skins(&mut self) -> Result<()> {
        // Resolve everything before touching the document
        let mut resolved = Vec::with_capacity(self.pending_skins.len());
        for (owner, skin) in &self.pending_skins {
            let joints = skin
                .joints
                .iter()
                .map(|path| {
                    self.lookup
                        .get(path)
                        .copied()
                        .ok_or_else(|| ExportError::UnresolvedJoint {
                            mesh: skin.mesh.clone(),
                            joint: path.clone(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            resolved.push((*owner, skin, joints));
        }

        for (owner, skin, joints) in resolved {
            let inverse_bind_matrices = self
                .document
                .push_accessor(AccessorData::Mat4(skin.inverse_bind_matrices_f32()));
            let skeleton = self.skeleton_root(&joints);
            let skin_id = self.document.push_skin(OutputSkin {
                name: skin.deformer.clone(),
                joints,
                inverse_bind_matrices,
                skeleton,
            });
            self.document.set_node_skin(owner, skin_id);
        }

        self.pending_skins.clear();
        Ok(())
    }

    /// The single joint whose parent is not itself a joint of the skin
    fn skeleton_root(&self, joints: &[NodeId]) -> Option<NodeId> {
        let members: HashSet<NodeId> = joints.iter().copied().collect();
        let mut roots = joints.iter().copied().filter(|joint| {
            self.nodes[joint.index()]
                .parent()
                .is_none_or(|parent| !members.contains(&parent))
        });

        match (roots.next(), roots.next()) {
            (Some(root), None) => Some(root),
            _ => None,
        }
    }

    /// Bake and register every configured clip, in configuration order
    pub fn export_clips(&mut self) -> Result<()> {
        let args = self.args;
        for clip_arg in &args.clips {
            let clip = ExportableClip::build(args, clip_arg, self)?;
            clip.register(&mut self.document);
        }
        Ok(())
    }

    pub fn host(&self) -> &'a dyn AuthoringScene {
        self.host
    }

    pub fn args(&self) -> &'a ExportArgs {
        self.args
    }

    /// Node arena in pre-order
    pub fn nodes(&self) -> &[ExportableNode] {
        &self.nodes
    }

    pub fn node_id(&self, path: &NodePath) -> Option<NodeId> {
        self.lookup.get(path).copied()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

/// Run the whole export pass; any error aborts without a document
pub fn export_scene(host: &dyn AuthoringScene, args: &ExportArgs) -> Result<Document> {
    let mut scene = ExportableScene::build(host, args)?;
    scene.export_clips()?;
    Ok(scene.into_document())
}
