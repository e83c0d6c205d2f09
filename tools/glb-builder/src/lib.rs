//! glTF/GLB generation utilities for the scene exporter
//!
//! Builder-pattern APIs for constructing GLB files:
//! - BufferBuilder: Pack binary data with automatic alignment
//! - MeshBuilder: Single-primitive triangle meshes with any number of joint sets
//! - SkinBuilder: Inverse bind matrices
//! - AnimationBuilder: Baked TRS tracks sharing one time input
//! - GltfBuilder: Top-level glTF document construction
//!
//! # Example
//!
//! ```no_run
//! use glb_builder::*;
//!
//! let mut buffer = BufferBuilder::new();
//! let mesh = MeshBuilder::new()
//!     .positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]])
//!     .normals(&[[0.0, 0.0, 1.0]; 3])
//!     .indices(&[0, 1, 2])
//!     .build(&mut buffer);
//!
//! let gltf = GltfBuilder::new()
//!     .buffer_byte_length(buffer.data().len() as u64)
//!     .add_node("Triangle", [0.0; 3], [0.0, 0.0, 0.0, 1.0], [1.0; 3], &[], Some(0), None)
//!     .add_mesh_from_accessors("Triangle", &mesh)
//!     .add_scene("Scene", &[0]);
//!
//! let root = gltf.build(buffer.views(), buffer.accessors(), "glb-builder");
//! let glb_bytes = assemble_glb(&root, buffer.data()).unwrap();
//! ```

pub mod animation;
pub mod buffer;
pub mod document;
pub mod mesh;
pub mod skeleton;
pub mod utils;

pub use animation::{AnimationAccessors, AnimationBuilder, NodeTrackAccessors};
pub use buffer::{AccessorIndex, BufferBuilder};
pub use document::GltfBuilder;
pub use mesh::{JointSetAccessors, MeshAccessors, MeshBuilder};
pub use skeleton::{SkinAccessors, SkinBuilder};
pub use utils::{align_buffer, assemble_glb, compute_bounds};

// Re-export commonly used gltf-json types
pub use gltf_json as json;
