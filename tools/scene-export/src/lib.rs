//! scene-export library
//!
//! Converts an authored scene hierarchy (transforms, skinned meshes, keyed
//! animation) into a flat glTF 2.0 document.

pub mod animation;
pub mod args;
pub mod authoring;
pub mod document;
pub mod error;
pub mod formats;
pub mod mesh;
pub mod names;
pub mod node;
pub mod scene;
pub mod skeleton;
pub mod transform;

pub use args::{load_args, ClipArg, ExportArgs, NameCollision, Selection};
pub use authoring::{AuthoringScene, MemoryScene, NodeKind, NodePath, SceneDescription};
pub use document::{Document, NodeId};
pub use error::{ExportError, Result};
pub use scene::{export_scene, ExportableScene};
