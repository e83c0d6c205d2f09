//! Flattened output document
//!
//! Everything here is index-based and append-only. Components push into the
//! document only after their own fallible work has succeeded, so a failed
//! export never leaves half-registered entries behind for a caller to see.

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

index_type!(
    /// Output node index; equals the node's pre-order traversal position
    NodeId
);
index_type!(MeshId);
index_type!(SkinId);
index_type!(AccessorId);
index_type!(AnimationId);

/// Typed contiguous numeric array
#[derive(Debug, Clone, PartialEq)]
pub enum AccessorData {
    Scalar(Vec<f32>),
    Vec2(Vec<[f32; 2]>),
    Vec3(Vec<[f32; 3]>),
    Vec4(Vec<[f32; 4]>),
    /// Column-major 4x4 matrices
    Mat4(Vec<[f32; 16]>),
    Joints(Vec<[u16; 4]>),
    Indices(Vec<u32>),
}

impl AccessorData {
    /// Element count
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(v) => v.len(),
            Self::Vec2(v) => v.len(),
            Self::Vec3(v) => v.len(),
            Self::Vec4(v) => v.len(),
            Self::Mat4(v) => v.len(),
            Self::Joints(v) => v.len(),
            Self::Indices(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "SCALAR",
            Self::Vec2(_) => "VEC2",
            Self::Vec3(_) => "VEC3",
            Self::Vec4(_) => "VEC4",
            Self::Mat4(_) => "MAT4",
            Self::Joints(_) => "VEC4<u16>",
            Self::Indices(_) => "SCALAR<u32>",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputNode {
    pub name: String,
    pub translation: [f32; 3],
    /// `[x, y, z, w]`
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub children: Vec<NodeId>,
    pub mesh: Option<MeshId>,
    pub skin: Option<SkinId>,
}

/// `JOINTS_n` / `WEIGHTS_n` pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSet {
    pub joints: AccessorId,
    pub weights: AccessorId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputMesh {
    pub name: String,
    pub positions: AccessorId,
    pub normals: Option<AccessorId>,
    pub uvs: Option<AccessorId>,
    pub joint_sets: Vec<JointSet>,
    pub indices: AccessorId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSkin {
    pub name: String,
    /// Joint-index space of the skinned mesh
    pub joints: Vec<NodeId>,
    pub inverse_bind_matrices: AccessorId,
    pub skeleton: Option<NodeId>,
}

/// Baked tracks of one node, sampled at the animation's times
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputChannel {
    pub node: NodeId,
    pub translations: AccessorId,
    pub rotations: AccessorId,
    pub scales: AccessorId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputAnimation {
    pub name: String,
    pub times: AccessorId,
    pub channels: Vec<OutputChannel>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    nodes: Vec<OutputNode>,
    roots: Vec<NodeId>,
    meshes: Vec<OutputMesh>,
    skins: Vec<OutputSkin>,
    animations: Vec<OutputAnimation>,
    accessors: Vec<AccessorData>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_accessor(&mut self, data: AccessorData) -> AccessorId {
        self.accessors.push(data);
        AccessorId(self.accessors.len() as u32 - 1)
    }

    pub fn push_node(&mut self, node: OutputNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() as u32 - 1)
    }

    pub fn push_mesh(&mut self, mesh: OutputMesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() as u32 - 1)
    }

    pub fn push_skin(&mut self, skin: OutputSkin) -> SkinId {
        self.skins.push(skin);
        SkinId(self.skins.len() as u32 - 1)
    }

    pub fn push_animation(&mut self, animation: OutputAnimation) -> AnimationId {
        self.animations.push(animation);
        AnimationId(self.animations.len() as u32 - 1)
    }

    pub fn add_root(&mut self, node: NodeId) {
        self.roots.push(node);
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].children.push(child);
    }

    pub fn set_node_skin(&mut self, node: NodeId, skin: SkinId) {
        self.nodes[node.index()].skin = Some(skin);
    }

    pub fn nodes(&self) -> &[OutputNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &OutputNode {
        &self.nodes[id.index()]
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn meshes(&self) -> &[OutputMesh] {
        &self.meshes
    }

    pub fn skins(&self) -> &[OutputSkin] {
        &self.skins
    }

    pub fn animations(&self) -> &[OutputAnimation] {
        &self.animations
    }

    pub fn accessors(&self) -> &[AccessorData] {
        &self.accessors
    }

    pub fn accessor(&self, id: AccessorId) -> &AccessorData {
        &self.accessors[id.index()]
    }
}
