//! Export error taxonomy
//!
//! Every variant is fatal for the export pass and carries the context needed
//! to point the user at the offending node, mesh, clip or frame.

use crate::authoring::NodePath;

/// Result alias used throughout the exporter
pub type Result<T, E = ExportError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Singular, non-finite or non-affine transform
    #[error("cannot decompose transform of '{context}': {reason}")]
    Decomposition { context: String, reason: String },

    /// More than one skin deformer bound to a mesh
    #[error("mesh '{mesh}' is bound to {} skin deformers ({}); expected at most one", .deformers.len(), .deformers.join(", "))]
    MultipleSkins { mesh: String, deformers: Vec<String> },

    /// Malformed or degenerate mesh geometry
    #[error("mesh '{mesh}' has unsupported topology: {reason}")]
    UnsupportedTopology { mesh: String, reason: String },

    /// A node could not be sampled while baking a clip
    #[error("clip '{clip}' failed to sample node '{node}' at frame {frame}")]
    ClipSampling {
        clip: String,
        node: String,
        frame: usize,
        #[source]
        source: Box<ExportError>,
    },

    /// Name assignment refused the node's display name
    #[error("cannot assign name '{name}' to node '{path}'")]
    NameResolution { path: NodePath, name: String },

    /// A skin references a joint that was never visited during traversal
    #[error("skin of mesh '{mesh}' references joint '{joint}' outside the exported hierarchy")]
    UnresolvedJoint { mesh: String, joint: NodePath },

    #[error("clip '{clip}' is invalid: {reason}")]
    InvalidClip { clip: String, reason: String },

    /// The host reported the same node path twice during traversal
    #[error("node '{0}' was reached twice during traversal")]
    DuplicateNode(NodePath),

    #[error("node '{0}' does not exist in the authoring scene")]
    UnknownNode(NodePath),
}

impl ExportError {
    pub(crate) fn decomposition(context: &str, reason: impl Into<String>) -> Self {
        Self::Decomposition {
            context: context.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn topology(mesh: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedTopology {
            mesh: mesh.to_string(),
            reason: reason.into(),
        }
    }
}
